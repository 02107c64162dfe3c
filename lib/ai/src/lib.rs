//! Generation backends for the sales agent.
//!
//! The turn controller treats generation as an opaque capability: given a
//! system instruction, history, the new user message and the tool schema,
//! a backend returns either reply text or a single tool call.
//!
//! - **GeminiBackend**: Google Gemini `generateContent` REST API
//! - **ScriptedBackend**: replays queued generations, for tests

pub mod backend;
pub mod error;
pub mod gemini;
pub mod scripted;

pub use backend::{
    ChatMessage, Generation, GenerationBackend, GenerationOptions, GenerationRequest, ToolExchange,
};
pub use error::LlmError;
pub use gemini::{GeminiBackend, GeminiConfig};
pub use scripted::ScriptedBackend;
