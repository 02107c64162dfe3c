//! Conversation state for the sales agent.
//!
//! This crate provides:
//!
//! - **Session Manager**: create, append to, qualify and finalize sessions
//! - **Session keys**: how channel contacts map to session ids
//! - **Tool Registry**: the tool schema exposed to the generation model,
//!   and the uniform result envelope every tool returns

pub mod error;
pub mod key;
pub mod message;
pub mod session;
pub mod tool;

pub use error::SessionError;
pub use key::{SessionKeyPolicy, voice_session_key, whatsapp_session_key};
pub use message::{ToolCall, Turn, TurnRole};
pub use session::{Qualification, QualificationPatch, Session, SessionManager, SessionStatus};
pub use tool::{ParameterKind, ToolDefinition, ToolParameter, ToolRegistry, ToolResult};
