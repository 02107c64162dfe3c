//! Error types for the tools crate.

use std::fmt;
use std::time::Duration;

/// Errors from tool routing and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool with this name exists.
    UnknownTool { name: String },
    /// Parameters did not match the tool's schema.
    InvalidParameters { tool: String, reason: String },
    /// The store rejected or failed the tool's read or write.
    StorageFailed { tool: String, reason: String },
    /// The tool did not finish within its deadline.
    Timeout { tool: String, after: Duration },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { name } => write!(f, "Unknown tool: {name}"),
            Self::InvalidParameters { tool, reason } => {
                write!(f, "invalid parameters for '{tool}': {reason}")
            }
            Self::StorageFailed { tool, reason } => {
                write!(f, "tool '{tool}' storage failed: {reason}")
            }
            Self::Timeout { tool, after } => {
                write!(f, "tool '{tool}' timed out after {after:?}")
            }
        }
    }
}

impl std::error::Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_display_is_envelope_message() {
        let err = ToolError::UnknownTool {
            name: "launch_rocket".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tool: launch_rocket");
    }

    #[test]
    fn timeout_display() {
        let err = ToolError::Timeout {
            tool: "create_lead".to_string(),
            after: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "tool 'create_lead' timed out after 10s");

        let err = ToolError::Timeout {
            tool: "create_lead".to_string(),
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "tool 'create_lead' timed out after 250ms");
    }
}
