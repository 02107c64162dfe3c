//! Error types for the messaging crate.

use std::fmt;

/// Errors from messaging operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// The provider could not be reached.
    ConnectionFailed { reason: String },
    /// The provider answered with an error status.
    Rejected { status: u16, body: String },
    /// The provider asked us to slow down.
    RateLimited { retry_after_secs: Option<u64> },
    /// The provider's answer could not be read.
    InvalidResponse { reason: String },
    /// Timeout waiting for the provider.
    Timeout,
    /// Writing to the message log failed.
    LogFailed { message_id: String, reason: String },
}

impl fmt::Display for MessagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { reason } => write!(f, "connection failed: {reason}"),
            Self::Rejected { status, body } => {
                write!(f, "message rejected with status {status}: {body}")
            }
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidResponse { reason } => write!(f, "invalid response: {reason}"),
            Self::Timeout => write!(f, "messaging request timed out"),
            Self::LogFailed { message_id, reason } => {
                write!(f, "failed to log message '{message_id}': {reason}")
            }
        }
    }
}

impl std::error::Error for MessagingError {}
