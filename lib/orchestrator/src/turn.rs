//! Conversation turn controller.

use crate::error::TurnError;
use crate::prompt::{EMPTY_UTTERANCE, FALLBACK_REPLY, SYSTEM_INSTRUCTION};
use sales_agent_ai::{ChatMessage, Generation, GenerationBackend, GenerationOptions, GenerationRequest};
use sales_agent_conversation::{SessionManager, ToolCall, ToolDefinition};
use sales_agent_core::SessionId;
use sales_agent_store::DocumentStore;
use sales_agent_tools::{DispatchedTool, ToolDispatcher, ToolName, tool_registry};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Turn controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnConfig {
    /// Deadline for a single generation call.
    pub generation_timeout: Duration,
    /// Tool calls allowed per user utterance.
    pub max_tool_rounds: usize,
    /// Whether turns ask for search grounding by default.
    ///
    /// Passed through to the backend untouched. Every turn offers the
    /// tool catalogue, and Gemini only honours grounding on calls without
    /// function tools, so with [`GeminiBackend`](sales_agent_ai::GeminiBackend)
    /// this has no effect on agent turns.
    pub use_grounding: bool,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(30),
            max_tool_rounds: 3,
            use_grounding: true,
        }
    }
}

impl TurnConfig {
    /// Generation options for an ordinary turn.
    #[must_use]
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            use_grounding: self.use_grounding,
            use_thinking: false,
        }
    }
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Text to send back to the user.
    pub reply: String,
    /// Tools dispatched while producing the reply, in order.
    pub tool_results: Vec<DispatchedTool>,
    /// False when the reply is the fallback apology.
    pub generated: bool,
}

impl TurnOutcome {
    fn fallback(tool_results: Vec<DispatchedTool>) -> Self {
        Self {
            reply: FALLBACK_REPLY.to_string(),
            tool_results,
            generated: false,
        }
    }
}

/// Runs conversational turns against a generation backend.
#[derive(Clone)]
pub struct TurnController {
    pub(crate) sessions: SessionManager,
    dispatcher: ToolDispatcher,
    backend: Arc<dyn GenerationBackend>,
    tools: Vec<ToolDefinition>,
    system_instruction: String,
    pub(crate) config: TurnConfig,
}

impl TurnController {
    /// Creates a controller from explicit collaborators.
    pub fn new(
        sessions: SessionManager,
        dispatcher: ToolDispatcher,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            sessions,
            dispatcher,
            backend,
            tools: tool_registry().definitions(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            config: TurnConfig::default(),
        }
    }

    /// Creates a controller whose sessions and tools share one store.
    pub fn from_store(store: Arc<dyn DocumentStore>, backend: Arc<dyn GenerationBackend>) -> Self {
        Self::new(
            SessionManager::new(store.clone()),
            ToolDispatcher::new(store),
            backend,
        )
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_config(mut self, config: TurnConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the persona instruction.
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// Returns the session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Runs one turn and returns the reply. Never fails.
    ///
    /// Both turns are appended only after a reply exists; a failed
    /// generation leaves history untouched and yields the fallback apology.
    #[instrument(skip(self, utterance, options), fields(session_id = %session_id, backend = self.backend.provider()))]
    pub async fn handle_turn(
        &self,
        session_id: &SessionId,
        utterance: &str,
        options: GenerationOptions,
    ) -> TurnOutcome {
        let utterance = if utterance.trim().is_empty() {
            EMPTY_UTTERANCE
        } else {
            utterance
        };

        let history = match self.sessions.get_turns(session_id).await {
            Ok(turns) => turns.iter().map(ChatMessage::from).collect(),
            Err(e) => {
                warn!(error = %e.current_context(), "failed to load history, continuing without it");
                Vec::new()
            }
        };

        let mut request = GenerationRequest::new(utterance)
            .with_system(self.system_instruction.clone())
            .with_history(history)
            .with_tools(self.tools.clone())
            .with_options(options);
        let mut tool_results = Vec::new();

        let reply = match self.generate_reply(session_id, &mut request, &mut tool_results).await {
            Ok(reply) => reply,
            Err(e) => match last_tool_message(&tool_results) {
                Some(message) => {
                    warn!(error = %e, "generation incomplete, replying with tool result");
                    message
                }
                None => {
                    warn!(error = %e, "generation failed, replying with fallback");
                    return TurnOutcome::fallback(tool_results);
                }
            },
        };

        self.persist(session_id, utterance, &reply).await;
        info!(tools = tool_results.len(), "turn complete");

        TurnOutcome {
            reply,
            tool_results,
            generated: true,
        }
    }

    async fn generate_reply(
        &self,
        session_id: &SessionId,
        request: &mut GenerationRequest,
        tool_results: &mut Vec<DispatchedTool>,
    ) -> Result<String, TurnError> {
        let mut rounds = 0;
        loop {
            match self.generate(request).await? {
                Generation::Text(text) => return Ok(text),
                Generation::ToolCall(call) => {
                    if rounds >= self.config.max_tool_rounds {
                        return Err(TurnError::ToolRoundsExhausted { rounds });
                    }
                    rounds += 1;

                    let call = bind_session(call, session_id);
                    debug!(tool = %call.name, round = rounds, "model requested tool");
                    let dispatched = self.dispatcher.dispatch_call(&call).await;
                    request.push_exchange(call, dispatched.result.clone());
                    tool_results.push(dispatched);
                }
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, TurnError> {
        match tokio::time::timeout(self.config.generation_timeout, self.backend.generate(request))
            .await
        {
            Ok(Ok(generation)) => Ok(generation),
            Ok(Err(e)) => Err(TurnError::Generation {
                provider: self.backend.provider().to_string(),
                reason: e.current_context().to_string(),
            }),
            Err(_) => Err(TurnError::GenerationTimeout {
                after: self.config.generation_timeout,
            }),
        }
    }

    async fn persist(&self, session_id: &SessionId, utterance: &str, reply: &str) {
        if let Err(e) = self
            .sessions
            .append_exchange(session_id, utterance, reply)
            .await
        {
            warn!(error = %e.current_context(), "failed to append exchange");
        }
    }
}

/// Pins `update_bant` to the session the turn belongs to.
fn bind_session(mut call: ToolCall, session_id: &SessionId) -> ToolCall {
    if call.name == ToolName::UpdateBant.as_str() {
        call.parameters.insert(
            "session_id".to_string(),
            JsonValue::String(session_id.as_str().to_string()),
        );
    }
    call
}

fn last_tool_message(tool_results: &[DispatchedTool]) -> Option<String> {
    tool_results
        .iter()
        .rev()
        .filter(|dispatched| dispatched.is_success())
        .find_map(|dispatched| dispatched.result.message().map(str::to_string))
}
