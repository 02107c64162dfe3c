//! Dialogflow CX voice webhook.
//!
//! Dialogflow tags each webhook call with the lifecycle step it wants; the
//! reply text goes back as a fulfillment message.

use crate::state::AppState;
use axum::{Json, body::Bytes, extract::State};
use sales_agent_conversation::voice_session_key;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Reply when the request itself cannot be read.
pub const ERROR_REPLY: &str = "Yampaye, hari ikibazo. Ongera ugerageze.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub fulfillment_info: FulfillmentInfo,
    #[serde(default)]
    pub session_info: SessionInfo,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FulfillmentInfo {
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub session: String,
}

impl WebhookRequest {
    /// The caller's words: typed text, else the speech transcript.
    #[must_use]
    pub fn utterance(&self) -> &str {
        self.text
            .as_deref()
            .filter(|text| !text.is_empty())
            .or(self.transcript.as_deref())
            .unwrap_or_default()
    }
}

/// Lifecycle step requested by the voice agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallTag {
    InitCallSession,
    ProcessTurn,
    HandleSilence,
    FinalizeCall,
}

impl CallTag {
    /// Unknown and missing tags process a turn.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "init_call_session" => Self::InitCallSession,
            "handle_silence" => Self::HandleSilence,
            "finalize_call" => Self::FinalizeCall,
            _ => Self::ProcessTurn,
        }
    }
}

/// Wraps reply text as a Dialogflow fulfillment response.
#[must_use]
pub fn fulfillment(text: &str) -> JsonValue {
    json!({
        "fulfillmentResponse": {
            "messages": [{"text": {"text": [text]}}]
        }
    })
}

/// `POST /webhook`
pub async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Json<JsonValue> {
    let request: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "unreadable Dialogflow request");
            return Json(fulfillment(ERROR_REPLY));
        }
    };

    let tag = CallTag::parse(&request.fulfillment_info.tag);
    let Some(session_id) = voice_session_key(&request.session_info.session) else {
        warn!(?tag, "Dialogflow request without a session");
        return Json(fulfillment(ERROR_REPLY));
    };
    info!(session_id = %session_id, ?tag, "Dialogflow webhook");

    let turns = &state.turns;
    let reply = match tag {
        CallTag::InitCallSession => turns.init_call(&session_id).await.reply,
        CallTag::ProcessTurn => {
            turns
                .handle_turn(&session_id, request.utterance(), turns.config().options())
                .await
                .reply
        }
        CallTag::HandleSilence => turns.silence_prompt(&session_id).await.to_string(),
        CallTag::FinalizeCall => turns.finalize_call(&session_id).await.to_string(),
    };

    Json(fulfillment(&reply))
}
