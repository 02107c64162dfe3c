//! Error types for the store crate.

use std::fmt;
use std::time::Duration;

/// Errors from document store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    Unavailable { details: String },
    /// The operation did not complete within its deadline.
    Timeout { operation: String, after: Duration },
    /// A document could not be encoded or decoded.
    Serialization { details: String },
    /// The backend rejected the operation.
    Backend { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "store unavailable: {details}"),
            Self::Timeout { operation, after } => {
                write!(f, "store {operation} timed out after {after:?}")
            }
            Self::Serialization { details } => {
                write!(f, "document serialization failed: {details}")
            }
            Self::Backend { details } => write!(f, "store operation failed: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_names_operation() {
        let err = StoreError::Timeout {
            operation: "append_many".to_string(),
            after: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "store append_many timed out after 5s");
    }
}
