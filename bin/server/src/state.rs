//! Shared application state.

use crate::config::AgentConfig;
use sales_agent_ai::GenerationBackend;
use sales_agent_conversation::{SessionKeyPolicy, SessionManager};
use sales_agent_messaging::{MediaFetcher, MessageLog, Messenger};
use sales_agent_orchestrator::TurnController;
use sales_agent_store::DocumentStore;
use sales_agent_tools::ToolDispatcher;
use std::sync::Arc;

/// Collaborators shared by every request.
pub struct AppState {
    /// Runs conversational turns.
    pub turns: TurnController,
    /// Sends replies to WhatsApp contacts.
    pub messenger: Arc<dyn Messenger>,
    /// Resolves media customers send.
    pub media: Arc<dyn MediaFetcher>,
    /// Backs the brochure queue drained after WhatsApp turns.
    pub store: Arc<dyn DocumentStore>,
    /// WhatsApp message log.
    pub message_log: MessageLog,
    /// Token Meta must echo to verify the webhook.
    pub verify_token: String,
    /// How WhatsApp contacts map to sessions.
    pub session_key_policy: SessionKeyPolicy,
    /// Store kind, for health output.
    pub store_kind: &'static str,
    /// Generation provider name, for health output.
    pub generation_provider: String,
    /// Business phone number id, for health output.
    pub phone_number_id: String,
}

impl AppState {
    /// Wires the collaborators together.
    pub fn new<M>(
        store: Arc<dyn DocumentStore>,
        store_kind: &'static str,
        backend: Arc<dyn GenerationBackend>,
        messenger: Arc<M>,
        agent: &AgentConfig,
    ) -> Self
    where
        M: Messenger + MediaFetcher + 'static,
    {
        let generation_provider = backend.provider().to_string();
        let turns = TurnController::new(
            SessionManager::new(store.clone()),
            ToolDispatcher::new(store.clone()).with_timeout(agent.tool_timeout()),
            backend,
        )
        .with_config(agent.turn_config());

        Self {
            turns,
            messenger: messenger.clone(),
            media: messenger,
            message_log: MessageLog::new(store.clone()),
            store,
            verify_token: String::new(),
            session_key_policy: agent.session_key_policy,
            store_kind,
            generation_provider,
            phone_number_id: String::new(),
        }
    }

    /// Sets the WhatsApp identity used for verification and health output.
    #[must_use]
    pub fn with_whatsapp(mut self, verify_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        self.verify_token = verify_token.into();
        self.phone_number_id = phone_number_id.into();
        self
    }
}
