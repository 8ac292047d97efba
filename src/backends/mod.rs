//! Backend collaborators: the call contract every content store satisfies.
//!
//! A backend takes an operation name plus primitive arguments and answers with
//! raw JSON. Its native success/error convention is interpreted by the tool
//! handler via [`crate::tools::ToolOutcome::from_adapter_value`].

pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::tools::Arguments;
use crate::types::{BackendsConfig, Error, Result};
pub use http::HttpBackend;

/// The content stores the gateway fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    DocumentStore,
    FileStore,
    CodeHost,
    WebSearch,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::DocumentStore,
        BackendKind::FileStore,
        BackendKind::CodeHost,
        BackendKind::WebSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::DocumentStore => "document_store",
            BackendKind::FileStore => "file_store",
            BackendKind::CodeHost => "code_host",
            BackendKind::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform one round trip. `Err` is a transport or protocol failure; an
    /// application-level `{"error": ...}` body is returned as `Ok`.
    async fn call(&self, operation: &str, args: &Arguments) -> Result<Value>;
}

/// Stand-in for a backend with no endpoint configured.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredBackend(pub BackendKind);

#[async_trait]
impl Backend for UnconfiguredBackend {
    async fn call(&self, operation: &str, _args: &Arguments) -> Result<Value> {
        Err(Error::adapter(format!(
            "{} backend is not configured (operation '{}')",
            self.0, operation
        )))
    }
}

/// One collaborator per backend kind.
#[derive(Clone)]
pub struct Backends {
    pub document_store: Arc<dyn Backend>,
    pub file_store: Arc<dyn Backend>,
    pub code_host: Arc<dyn Backend>,
    pub web_search: Arc<dyn Backend>,
}

impl Backends {
    /// HTTP collaborators for every configured URL; the rest are unconfigured.
    pub fn from_config(config: &BackendsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let build = |kind: BackendKind, url: &Option<String>| -> Arc<dyn Backend> {
            match url {
                Some(base_url) => {
                    tracing::info!(backend = %kind, url = %base_url, "backend configured");
                    Arc::new(HttpBackend::new(kind, client.clone(), base_url))
                }
                None => {
                    tracing::warn!(backend = %kind, "backend not configured; its tools will fail");
                    Arc::new(UnconfiguredBackend(kind))
                }
            }
        };

        Ok(Self {
            document_store: build(BackendKind::DocumentStore, &config.document_store),
            file_store: build(BackendKind::FileStore, &config.file_store),
            code_host: build(BackendKind::CodeHost, &config.code_host),
            web_search: build(BackendKind::WebSearch, &config.web_search),
        })
    }

    /// Every backend unconfigured.
    pub fn unconfigured() -> Self {
        Self {
            document_store: Arc::new(UnconfiguredBackend(BackendKind::DocumentStore)),
            file_store: Arc::new(UnconfiguredBackend(BackendKind::FileStore)),
            code_host: Arc::new(UnconfiguredBackend(BackendKind::CodeHost)),
            web_search: Arc::new(UnconfiguredBackend(BackendKind::WebSearch)),
        }
    }

    pub fn get(&self, kind: BackendKind) -> &Arc<dyn Backend> {
        match kind {
            BackendKind::DocumentStore => &self.document_store,
            BackendKind::FileStore => &self.file_store,
            BackendKind::CodeHost => &self.code_host,
            BackendKind::WebSearch => &self.web_search,
        }
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}
