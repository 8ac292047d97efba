//! HTTP transport: axum router, guard extraction, and serve loop.
//!
//! Routes:
//! - `GET  /health`       liveness, unguarded
//! - `GET  /tools`        tool listing, guarded
//! - `POST /tools/call`   one tool call, JSON response
//! - `POST /tools/stream` one tool call, result pushed as a server-sent event

mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatcher;
use crate::guard::rate_limiter::{spawn_sweeper, InMemoryRateLimiter};
use crate::guard::{RateLimiter, RequestGuard};
use crate::tools::ToolRegistry;
use crate::types::{Config, Error, Result};

/// Shared state for all handlers.
#[derive(Debug)]
pub struct AppState {
    pub guard: RequestGuard,
    pub dispatcher: Dispatcher,
    /// Bodies are read only after the guard admits the request, up to this size.
    pub max_body_bytes: usize,
}

/// Build the router over prepared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/tools", get(handlers::list_tools))
        .route("/tools/call", post(handlers::call_tool))
        .route("/tools/stream", post(handlers::stream_tool))
        .with_state(state)
}

/// HTTP server wrapping the gateway pipeline.
#[derive(Debug)]
pub struct GatewayServer {
    state: Arc<AppState>,
    addr: SocketAddr,
    sweep: Option<(Arc<InMemoryRateLimiter>, std::time::Duration)>,
    cancel: CancellationToken,
}

impl GatewayServer {
    /// Build a server with the process-local rate limiter.
    pub fn new(config: &Config, registry: ToolRegistry) -> Result<Self> {
        let limiter = Arc::new(InMemoryRateLimiter::from_config(&config.rate_limit)?);
        let mut server = Self::with_limiter(config, registry, limiter.clone())?;
        server.sweep = Some((limiter, config.rate_limit.sweep_interval));
        Ok(server)
    }

    /// Build a server over any limiter implementation (e.g. a shared store when
    /// several gateway instances must agree on counts).
    pub fn with_limiter(
        config: &Config,
        registry: ToolRegistry,
        limiter: Arc<dyn RateLimiter>,
    ) -> Result<Self> {
        config.validate()?;
        let addr: SocketAddr = config
            .server
            .listen_addr
            .parse()
            .map_err(|e| Error::config(format!("invalid listen_addr: {}", e)))?;

        let state = Arc::new(AppState {
            guard: RequestGuard::new(&config.guard, limiter),
            dispatcher: Dispatcher::new(Arc::new(registry))
                .with_timeout(config.server.handler_timeout),
            max_body_bytes: config.server.max_body_bytes,
        });

        Ok(Self {
            state,
            addr,
            sweep: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state))
    }

    /// Token that stops the server (and the limiter sweeper) when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled or a fatal I/O error occurs.
    pub async fn serve(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener).await
    }

    /// Run on an already-bound listener.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        let sweeper = self.sweep.as_ref().map(|(limiter, every)| {
            spawn_sweeper(Arc::clone(limiter), *every, self.cancel.child_token())
        });

        tracing::info!(
            addr = %listener.local_addr()?,
            tools = self.state.dispatcher.registry().len(),
            "tool gateway listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await?;

        self.cancel.cancel();
        if let Some(handle) = sweeper {
            if let Err(e) = handle.await {
                tracing::warn!("rate-limit sweeper ended abnormally: {}", e);
            }
        }
        tracing::info!("tool gateway stopped");
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
