//! Error types for the AI crate.

use std::fmt;

/// Errors from generation backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider could not be reached or is failing.
    ProviderUnavailable { provider: String, reason: String },
    /// Request was rejected.
    RequestFailed { reason: String },
    /// Response body could not be parsed.
    ResponseParseFailed { reason: String },
    /// The model asked for a tool call that could not be read.
    MalformedToolCall { reason: String },
    /// The model returned neither text nor a tool call.
    EmptyResponse,
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "LLM provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::MalformedToolCall { reason } => {
                write!(f, "malformed tool call: {reason}")
            }
            Self::EmptyResponse => write!(f, "LLM returned an empty response"),
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
        }
    }
}

impl std::error::Error for LlmError {}
