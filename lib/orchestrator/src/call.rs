//! Voice call lifecycle.
//!
//! A voice call opens with an agent-initiated turn, may be interrupted by
//! silence, and is closed with a fixed farewell.

use crate::prompt::{FAREWELL, OPENING_UTTERANCE, SILENCE_PROMPTS};
use crate::turn::{TurnController, TurnOutcome};
use sales_agent_core::{Channel, SessionId};
use serde_json::{Map, Value as JsonValue};
use tracing::{info, instrument, warn};

impl TurnController {
    /// Starts an outbound call session and generates the opening line.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn init_call(&self, session_id: &SessionId) -> TurnOutcome {
        let metadata = Map::from_iter([
            ("direction".to_string(), JsonValue::String("outbound".to_string())),
            (
                "dialogflow_session".to_string(),
                JsonValue::String(session_id.as_str().to_string()),
            ),
        ]);
        if let Err(e) = self
            .sessions
            .create_or_merge_session(session_id, Channel::Voice, metadata)
            .await
        {
            warn!(error = %e.current_context(), "failed to create call session");
        }
        info!("call session initialised");

        self.handle_turn(session_id, OPENING_UTTERANCE, self.config.options())
            .await
    }

    /// Picks the prompt for a silent caller.
    ///
    /// Rotates through the fixed prompts by the number of turns so far.
    /// Nothing is generated or written.
    pub async fn silence_prompt(&self, session_id: &SessionId) -> &'static str {
        let turns = match self.sessions.get_turns(session_id).await {
            Ok(turns) => turns.len(),
            Err(e) => {
                warn!(session_id = %session_id, error = %e.current_context(), "failed to read turns");
                0
            }
        };
        SILENCE_PROMPTS[turns % SILENCE_PROMPTS.len()]
    }

    /// Completes the call session and returns the farewell.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn finalize_call(&self, session_id: &SessionId) -> &'static str {
        match self.sessions.finalize(session_id).await {
            Ok(true) => info!("call finalized"),
            Ok(false) => info!("call was already finalized"),
            Err(e) => warn!(error = %e.current_context(), "failed to finalize call session"),
        }
        FAREWELL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::FALLBACK_REPLY;
    use sales_agent_ai::{Generation, ScriptedBackend};
    use sales_agent_conversation::SessionStatus;
    use sales_agent_store::{FailingStore, MemoryStore};
    use std::sync::Arc;

    fn controller(generations: Vec<Generation>) -> (Arc<ScriptedBackend>, TurnController) {
        let backend = Arc::new(ScriptedBackend::new(generations));
        let controller = TurnController::from_store(Arc::new(MemoryStore::new()), backend.clone());
        (backend, controller)
    }

    #[tokio::test]
    async fn init_call_creates_voice_session_and_opens() {
        let session_id = SessionId::new("call-42");
        let (backend, controller) =
            controller(vec![Generation::Text("Muraho! Ndi EasyMo Agent.".to_string())]);

        let outcome = controller.init_call(&session_id).await;
        assert_eq!(outcome.reply, "Muraho! Ndi EasyMo Agent.");
        assert_eq!(backend.requests()[0].user_message, OPENING_UTTERANCE);

        let session = controller.sessions().get_session(&session_id).await.unwrap().unwrap();
        assert_eq!(session.channel, Some(Channel::Voice));
        assert_eq!(session.metadata["direction"], "outbound");
        assert_eq!(session.turns.len(), 2);
    }

    #[tokio::test]
    async fn init_call_with_failed_generation_keeps_session() {
        let session_id = SessionId::new("call-43");
        let (_, controller) = controller(Vec::new());

        let outcome = controller.init_call(&session_id).await;
        assert_eq!(outcome.reply, FALLBACK_REPLY);

        let session = controller.sessions().get_session(&session_id).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.turns.is_empty());
    }

    #[tokio::test]
    async fn silence_prompts_rotate_without_writes() {
        let session_id = SessionId::new("call-44");
        let (backend, controller) = controller(vec![Generation::Text("Muraho!".to_string())]);

        assert_eq!(controller.silence_prompt(&session_id).await, SILENCE_PROMPTS[0]);
        controller.init_call(&session_id).await;
        assert_eq!(controller.silence_prompt(&session_id).await, SILENCE_PROMPTS[2]);
        assert_eq!(controller.silence_prompt(&session_id).await, SILENCE_PROMPTS[2]);
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn finalize_call_is_idempotent() {
        let session_id = SessionId::new("call-45");
        let (_, controller) = controller(Vec::new());

        assert_eq!(controller.finalize_call(&session_id).await, FAREWELL);
        let first = controller.sessions().get_session(&session_id).await.unwrap().unwrap();
        assert_eq!(controller.finalize_call(&session_id).await, FAREWELL);
        let second = controller.sessions().get_session(&session_id).await.unwrap().unwrap();

        assert_eq!(second.status, SessionStatus::Completed);
        assert_eq!(first.end_time, second.end_time);
    }

    #[tokio::test]
    async fn finalize_call_with_failing_store_still_says_goodbye() {
        let backend = Arc::new(ScriptedBackend::default());
        let controller = TurnController::from_store(Arc::new(FailingStore::default()), backend);
        assert_eq!(controller.finalize_call(&SessionId::new("x")).await, FAREWELL);
    }
}
