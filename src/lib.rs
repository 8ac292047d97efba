//! # Toolgate - Guarded Tool Gateway
//!
//! Exposes a fixed catalog of named tools over HTTP to untrusted callers:
//! - Per-request guard: secure transport, shared-secret API key, per-client
//!   fixed-window rate limiting, origin allow-list
//! - Tool registry with declared input schemas validated before dispatch
//! - Uniform result normalization (text blocks plus an optional paging cursor)
//! - Failure isolation: a failing or panicking handler only affects its own call
//!
//! ## Architecture
//!
//! ```text
//!   HTTP request → ┌────────┐   ┌────────────┐   ┌──────────┐   ┌─────────┐
//!                  │ Guard  │ → │ Dispatcher │ → │ Handler  │ → │ Backend │
//!                  └────────┘   └────────────┘   └──────────┘   └─────────┘
//!                   reject →      validate +       ToolOutcome
//!                   401/403/429   normalize  ←─────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod backends;
pub mod dispatch;
pub mod guard;
pub mod normalize;
pub mod server;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use dispatch::{Dispatcher, ToolInvocation};
pub use normalize::{ContentBlock, ToolResult};
pub use server::GatewayServer;
pub use types::{Config, Error, Result};
