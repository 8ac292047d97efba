//! Request guard: transport, credential, rate-limit, and origin checks.
//!
//! Checks run in a fixed order and stop at the first failure:
//! transport → credential → rate limit → origin. A request that is rejected
//! here never reaches tool dispatch.

pub mod rate_limiter;

use axum::http::StatusCode;
use std::collections::HashSet;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::types::{ClientKey, GuardConfig};
pub use rate_limiter::{InMemoryRateLimiter, RateDecision, RateLimiter};

/// Guard-relevant facts about an inbound request, already pulled out of the
/// transport (headers).
#[derive(Debug, Clone)]
pub struct GuardRequest {
    /// The request declared it arrived over a secure transport.
    pub secure_transport: bool,
    pub api_key: Option<String>,
    pub client_key: ClientKey,
    pub origin: Option<String>,
}

/// Transport-level rejection. Terminates the request with an HTTP error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("secure transport required")]
    InsecureTransport,

    #[error("missing or invalid API key")]
    Unauthorized,

    #[error("rate limit of {limit} requests exceeded, retry after {retry_after_secs}s")]
    RateLimited { limit: u32, retry_after_secs: u64 },

    #[error("origin '{0}' is not allowed")]
    OriginNotAllowed(String),

    /// The limiter's backing store failed; the request is refused rather than
    /// admitted unchecked.
    #[error("rate limiter unavailable")]
    LimiterUnavailable,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::InsecureTransport => StatusCode::FORBIDDEN,
            Rejection::Unauthorized => StatusCode::UNAUTHORIZED,
            Rejection::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Rejection::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            Rejection::LimiterUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::InsecureTransport => "insecure_transport",
            Rejection::Unauthorized => "unauthorized",
            Rejection::RateLimited { .. } => "rate_limited",
            Rejection::OriginNotAllowed(_) => "origin_not_allowed",
            Rejection::LimiterUnavailable => "limiter_unavailable",
        }
    }
}

/// Quota state of an admitted request, reported back in response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug)]
pub struct RequestGuard {
    api_keys: Vec<String>,
    allowed_origins: HashSet<String>,
    require_secure_transport: bool,
    limiter: Arc<dyn RateLimiter>,
}

impl RequestGuard {
    pub fn new(config: &GuardConfig, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            api_keys: config
                .api_keys
                .iter()
                .filter(|k| !k.is_empty())
                .cloned()
                .collect(),
            allowed_origins: config.allowed_origins.iter().cloned().collect(),
            require_secure_transport: config.require_secure_transport,
            limiter,
        }
    }

    pub async fn authorize(&self, request: &GuardRequest) -> Result<Admission, Rejection> {
        let result = self.check(request).await;
        if let Err(rejection) = &result {
            tracing::warn!(
                kind = rejection.kind(),
                client = %request.client_key,
                "request rejected: {}",
                rejection
            );
        }
        result
    }

    async fn check(&self, request: &GuardRequest) -> Result<Admission, Rejection> {
        if self.require_secure_transport && !request.secure_transport {
            return Err(Rejection::InsecureTransport);
        }

        match request.api_key.as_deref() {
            Some(presented) if self.key_allowed(presented) => {}
            _ => return Err(Rejection::Unauthorized),
        }

        let limit = self.limiter.limit();
        let remaining = match self.limiter.check_and_increment(&request.client_key).await {
            Ok(RateDecision::Allowed { remaining }) => remaining,
            Ok(RateDecision::Limited { retry_after_secs }) => {
                return Err(Rejection::RateLimited {
                    limit,
                    retry_after_secs,
                })
            }
            Err(e) => {
                tracing::error!("rate limiter failed: {}", e);
                return Err(Rejection::LimiterUnavailable);
            }
        };

        if let Some(origin) = request.origin.as_deref() {
            if !self.allowed_origins.contains(origin) {
                return Err(Rejection::OriginNotAllowed(origin.to_string()));
            }
        }

        Ok(Admission { limit, remaining })
    }

    /// Exact match against the allow-list. Every configured key is compared
    /// so timing does not reveal which entry (if any) matched.
    fn key_allowed(&self, presented: &str) -> bool {
        if presented.is_empty() {
            return false;
        }
        self.api_keys.iter().fold(false, |found, key| {
            let eq: bool = key.as_bytes().ct_eq(presented.as_bytes()).into();
            found | eq
        })
    }
}
