//! Identifier types for domain records.
//!
//! Records created by the agent (leads, callbacks, brochure requests) get
//! ULID-backed ids, so keys sort by creation time. Sessions are keyed by an
//! identifier supplied from outside (channel plus contact), so [`SessionId`]
//! is an opaque string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed record ID wrapper around ULID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Returns the prefix used for display formatting.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ulid_str = s
                    .strip_prefix(concat!($prefix, "_"))
                    .unwrap_or(s);

                Ulid::from_str(ulid_str)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of a lead captured by the `create_lead` tool.
    LeadId,
    "lead"
);

define_id!(
    /// Identifier of a scheduled callback request.
    CallbackId,
    "cb"
);

define_id!(
    /// Identifier of a queued brochure send request.
    BrochureRequestId,
    "bro"
);

/// Identifier of a conversation session.
///
/// Derived by the caller from the channel and contact (see the
/// conversation crate's key policy), or taken verbatim from the voice
/// platform's session path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an externally supplied session key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SessionId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_id_display_format() {
        let id = LeadId::new();
        assert!(id.to_string().starts_with("lead_"));
    }

    #[test]
    fn parse_with_prefix() {
        let id = CallbackId::new();
        let parsed: CallbackId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_without_prefix() {
        let ulid = Ulid::new();
        let id: BrochureRequestId = ulid.to_string().parse().expect("should parse");
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn parse_invalid_ulid() {
        let err = "lead_nope".parse::<LeadId>().unwrap_err();
        assert_eq!(err.id_type, "LeadId");
    }

    #[test]
    fn later_ids_sort_after_earlier_ones() {
        let first = LeadId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = LeadId::new();
        assert!(first.to_string() < second.to_string());
    }

    #[test]
    fn session_id_is_transparent() {
        let id = SessionId::new("wa_250788000000_20260101");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"wa_250788000000_20260101\"");
        assert_eq!(id.to_string(), "wa_250788000000_20260101");
    }
}
