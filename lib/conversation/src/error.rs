//! Error types for the conversation crate.

use sales_agent_core::SessionId;
use std::fmt;

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The backing store failed.
    StorageFailed { session_id: SessionId, reason: String },
    /// A stored session could not be decoded.
    InvalidData { session_id: SessionId, reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageFailed { session_id, reason } => {
                write!(f, "session storage failed for {session_id}: {reason}")
            }
            Self::InvalidData { session_id, reason } => {
                write!(f, "invalid session data for {session_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
