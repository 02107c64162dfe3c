//! Turn controller errors.

use std::fmt;
use std::time::Duration;

/// Reasons a turn could not produce a generated reply.
///
/// These never reach callers of [`crate::TurnController::handle_turn`];
/// they are logged and answered with the fallback apology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// The backend returned an error.
    Generation { provider: String, reason: String },
    /// The backend did not answer within the deadline.
    GenerationTimeout { after: Duration },
    /// The model kept calling tools past the round limit.
    ToolRoundsExhausted { rounds: usize },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation { provider, reason } => {
                write!(f, "generation failed ({provider}): {reason}")
            }
            Self::GenerationTimeout { after } => {
                write!(f, "generation timed out after {after:?}")
            }
            Self::ToolRoundsExhausted { rounds } => {
                write!(f, "model still calling tools after {rounds} rounds")
            }
        }
    }
}

impl std::error::Error for TurnError {}
