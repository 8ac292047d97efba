//! Core types for the tool gateway.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (InvocationId, ClientKey)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for server, guard, limiter, and backends

mod config;
mod errors;
mod ids;

pub use config::{
    BackendsConfig, Config, GuardConfig, ObservabilityConfig, RateLimitConfig, ServerConfig,
};
pub use errors::{Error, Result};
pub use ids::{ClientKey, InvocationId};
