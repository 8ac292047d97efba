//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation. Everything
//! past the request guard is recovered into a tool-level failure, so these
//! variants mostly end up rendered as text inside a response envelope rather
//! than as transport errors.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the tool gateway.
#[derive(Error, Debug)]
pub enum Error {
    /// Dispatch miss: no tool registered under this name.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// Argument failed schema validation.
    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    /// External collaborator failed. The message is kept verbatim.
    #[error("{0}")]
    Adapter(String),

    /// Two tool definitions share a name (startup-fatal).
    #[error("duplicate tool name '{0}'")]
    DuplicateTool(String),

    /// Invalid configuration (startup-fatal).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal errors (join failures, invariant breaks).
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP collaborator transport errors.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable snake_case code for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownTool(_) => "unknown_tool",
            Error::InvalidArgument { .. } => "invalid_argument",
            Error::Adapter(_) => "adapter_failure",
            Error::DuplicateTool(_) => "duplicate_tool",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
            Error::Serialization(_) => "serialization",
            Error::Http(_) => "adapter_failure",
            Error::Io(_) => "io",
        }
    }
}

// Convenience constructors
impl Error {
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_message_is_verbatim() {
        let err = Error::adapter("upstream returned 502: bad gateway");
        assert_eq!(err.to_string(), "upstream returned 502: bad gateway");
        assert_eq!(err.kind(), "adapter_failure");
    }

    #[test]
    fn test_invalid_argument_names_field() {
        let err = Error::invalid_argument("query", "expected string, got number");
        assert_eq!(
            err.to_string(),
            "invalid argument 'query': expected string, got number"
        );
    }

    #[test]
    fn test_unknown_tool_names_tool() {
        let err = Error::unknown_tool("delete_everything");
        assert!(err.to_string().contains("delete_everything"));
        assert_eq!(err.kind(), "unknown_tool");
    }
}
