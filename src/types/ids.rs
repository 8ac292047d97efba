//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed ID newtype wrapper.
///
/// Generates: struct, `from_string()`, `as_str()`, Display, Serialize, Deserialize.
/// Optionally generates `new()` (UUID v4) and `Default` if `uuid` flag is passed.
macro_rules! define_id {
    ($name:ident, uuid) => {
        define_id!($name);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(InvocationId, uuid);
define_id!(ClientKey);

impl ClientKey {
    /// Shared bucket for callers that report no address.
    pub const UNKNOWN: &'static str = "unknown";

    /// Derive the rate-limit identity from a client-reported address list
    /// (`x-forwarded-for` style: the first entry is the originating client).
    ///
    /// Every caller without an address lands in the same `unknown` bucket, so
    /// one such caller can exhaust the limit for all of them.
    pub fn from_forwarded_for(header: Option<&str>) -> Self {
        let first = header
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match first {
            Some(addr) => Self(addr.to_string()),
            None => Self(Self::UNKNOWN.to_string()),
        }
    }
}
