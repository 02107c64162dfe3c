//! WhatsApp webhook.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use chrono::Utc;
use sales_agent_conversation::whatsapp_session_key;
use sales_agent_core::Channel;
use rootcause::prelude::Report;
use sales_agent_messaging::{InboundMessage, MessagingError, Outbound, WebhookPayload};
use sales_agent_store::{Document, DocumentStore, FieldFilter, collections};
use sales_agent_tools::{BrochureType, DispatchedTool, ToolName};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Upper bound on queue entries delivered for one phone number per turn.
const MAX_BROCHURES_PER_TURN: usize = 5;

/// Query parameters of Meta's verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// `GET /webhook/whatsapp`
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<String, ApiError> {
    let subscribed = query.mode.as_deref() == Some("subscribe");
    let token_matches = !state.verify_token.is_empty()
        && query.verify_token.as_deref() == Some(state.verify_token.as_str());

    if subscribed && token_matches {
        info!("WhatsApp webhook verified");
        Ok(query.challenge.unwrap_or_default())
    } else {
        Err(ApiError::VerificationFailed)
    }
}

/// `POST /webhook/whatsapp`
pub async fn receive(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<JsonValue>, ApiError> {
    let payload: WebhookPayload =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidBody {
            reason: e.to_string(),
        })?;

    for status in payload.statuses() {
        if let Err(e) = state.message_log.record_status(&status).await {
            warn!(error = %e.current_context(), "failed to record message status");
        }
    }

    for message in payload.messages() {
        handle_message(&state, &message).await;
    }

    Ok(Json(json!({"status": "success"})))
}

/// Runs one customer message through a turn and sends the reply.
#[instrument(skip(state, message), fields(message_id = %message.message_id, kind = message.kind.as_str()))]
async fn handle_message(state: &AppState, message: &InboundMessage) {
    if let Err(e) = state.message_log.record_inbound(message).await {
        warn!(error = %e.current_context(), "failed to log inbound message");
    }
    if let Some(media_id) = message.media_id() {
        resolve_media(state, &message.message_id, media_id).await;
    }

    let session_id = whatsapp_session_key(state.session_key_policy, &message.from, Utc::now());
    let metadata = Map::from_iter([
        ("channel".to_string(), json!(Channel::Whatsapp)),
        ("customer_phone".to_string(), json!(message.from)),
        ("message_id".to_string(), json!(message.message_id)),
    ]);
    if let Err(e) = state
        .turns
        .sessions()
        .create_or_merge_session(&session_id, Channel::Whatsapp, metadata)
        .await
    {
        warn!(session_id = %session_id, error = %e.current_context(), "failed to create session");
    }

    if let Err(e) = state.messenger.mark_read(&message.message_id).await {
        warn!(error = %e.current_context(), "failed to mark message read");
    }

    let outcome = state
        .turns
        .handle_turn(&session_id, &message.utterance, state.turns.config().options())
        .await;

    let reply = Outbound::text(outcome.reply);
    if let Err(e) = send_and_log(state, &message.from, &reply).await {
        warn!(session_id = %session_id, error = %e.current_context(), "failed to send reply");
    }

    deliver_brochures(state, &message.from, &outcome.tool_results).await;
}

/// Sends a message and records it in the message log.
async fn send_and_log(
    state: &AppState,
    recipient: &str,
    message: &Outbound,
) -> Result<Option<String>, Report<MessagingError>> {
    let receipt = state.messenger.send(recipient, message).await?;
    if let Err(e) = state.message_log.record_outbound(&receipt, message).await {
        warn!(error = %e.current_context(), "failed to log outbound message");
    }
    Ok(receipt.message_id)
}

async fn resolve_media(state: &AppState, message_id: &str, media_id: &str) {
    let url = match state.media.media_url(media_id).await {
        Ok(url) => url,
        Err(e) => {
            warn!(media_id, error = %e.current_context(), "failed to resolve media");
            return;
        }
    };
    if let Err(e) = state.message_log.record_media_url(message_id, &url).await {
        warn!(error = %e.current_context(), "failed to log media url");
    }
}

/// Sends the pending brochures queued by this turn's `send_brochure` calls
/// into the chat, marking each queue entry `sent` or `failed`.
async fn deliver_brochures(state: &AppState, recipient: &str, tool_results: &[DispatchedTool]) {
    let phones = tool_results
        .iter()
        .filter(|dispatched| {
            dispatched.is_success() && dispatched.call.name == ToolName::SendBrochure.as_str()
        })
        .filter_map(|dispatched| dispatched.call.parameters.get("phone_number"))
        .filter_map(JsonValue::as_str);

    for phone in phones {
        let filters = [
            FieldFilter::eq("status", "pending"),
            FieldFilter::eq("phone_number", phone),
        ];
        let pending = match state
            .store
            .query(collections::BROCHURE_QUEUE, &filters, MAX_BROCHURES_PER_TURN)
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e.current_context(), "failed to read brochure queue");
                continue;
            }
        };

        for queued in pending {
            let Some(url) = queued.document.get("brochure_url").and_then(JsonValue::as_str) else {
                continue;
            };
            let brochure = BrochureType::resolve(
                queued
                    .document
                    .get("brochure_type")
                    .and_then(JsonValue::as_str),
            );
            let document =
                Outbound::document(url, Some(format!("EasyMo {} brochure", brochure.title())));

            let mut update = Document::new();
            match send_and_log(state, recipient, &document).await {
                Ok(message_id) => {
                    info!(queue_key = %queued.key, "brochure delivered");
                    update.insert("status".to_string(), json!("sent"));
                    update.insert("message_id".to_string(), json!(message_id));
                    update.insert("sent_at".to_string(), json!(Utc::now()));
                }
                Err(e) => {
                    let reason = e.current_context().to_string();
                    warn!(queue_key = %queued.key, error = %reason, "failed to deliver brochure");
                    update.insert("status".to_string(), json!("failed"));
                    update.insert("error".to_string(), json!(reason));
                    update.insert("updated_at".to_string(), json!(Utc::now()));
                }
            }
            if let Err(e) = state
                .store
                .set_merge(collections::BROCHURE_QUEUE, &queued.key, update)
                .await
            {
                warn!(error = %e.current_context(), "failed to update brochure queue");
            }
        }
    }
}
