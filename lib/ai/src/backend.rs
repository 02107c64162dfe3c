//! Generation backend abstraction.

use crate::error::LlmError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use sales_agent_conversation::{ToolCall, ToolDefinition, ToolResult, Turn, TurnRole};
use serde::{Deserialize, Serialize};

/// A prior message given to the model as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who said it.
    pub role: TurnRole,
    /// What was said.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// A tool call made earlier in the current turn, with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExchange {
    /// The call the model made.
    pub call: ToolCall,
    /// The envelope the dispatcher returned.
    pub result: ToolResult,
}

/// Per-request generation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Allow the provider to augment the answer with web search.
    pub use_grounding: bool,
    /// Use the slower reasoning model.
    pub use_thinking: bool,
}

/// A request to generate the next assistant action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Fixed persona and business rules.
    pub system_instruction: String,
    /// Prior turns, oldest first.
    pub history: Vec<ChatMessage>,
    /// The new user utterance.
    pub user_message: String,
    /// Tools the model may call.
    pub tools: Vec<ToolDefinition>,
    /// Tool calls already made for this utterance, in order.
    pub tool_exchanges: Vec<ToolExchange>,
    /// Generation switches.
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Creates a request with just a user message.
    #[must_use]
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            system_instruction: String::new(),
            history: Vec::new(),
            user_message: user_message.into(),
            tools: Vec::new(),
            tool_exchanges: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    /// Sets the system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_instruction = system.into();
        self
    }

    /// Sets the history.
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Sets the callable tools.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the generation switches.
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Records a completed tool exchange.
    pub fn push_exchange(&mut self, call: ToolCall, result: ToolResult) {
        self.tool_exchanges.push(ToolExchange { call, result });
    }
}

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Reply to the user with this text.
    Text(String),
    /// Call a tool before replying.
    ToolCall(ToolCall),
}

/// Trait for generation backends.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generates the next assistant action.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails, times out, or answers with
    /// something that is neither text nor a readable tool call.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, Report<LlmError>>;

    /// Returns the provider name, for logs.
    fn provider(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn generation_request_builder() {
        let mut request = GenerationRequest::new("Ndashaka ubwishingizi")
            .with_system("You are a sales agent.")
            .with_history(vec![ChatMessage::user("Muraho"), ChatMessage::assistant("Muraho!")])
            .with_options(GenerationOptions {
                use_grounding: true,
                use_thinking: false,
            });
        request.push_exchange(
            ToolCall::new("get_pricing", Map::new()),
            ToolResult::failure("missing service_type"),
        );

        assert_eq!(request.user_message, "Ndashaka ubwishingizi");
        assert_eq!(request.history.len(), 2);
        assert!(request.options.use_grounding);
        assert_eq!(request.tool_exchanges[0].call.name, "get_pricing");
    }

    #[test]
    fn chat_message_from_turn() {
        let turn = Turn::assistant("Murakoze");
        let message = ChatMessage::from(&turn);
        assert_eq!(message, ChatMessage::assistant("Murakoze"));
    }
}
