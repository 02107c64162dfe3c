//! WhatsApp message log.

use crate::error::MessagingError;
use crate::inbound::{InboundMessage, StatusUpdate};
use crate::messenger::DeliveryReceipt;
use crate::outbound::Outbound;
use chrono::Utc;
use rootcause::prelude::Report;
use sales_agent_store::{Document, DocumentStore, StoreError, collections};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::debug;

/// Records inbound messages, outbound sends and delivery statuses.
#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn DocumentStore>,
}

fn object(value: JsonValue) -> Document {
    match value {
        JsonValue::Object(map) => map,
        _ => Document::new(),
    }
}

fn log_failed(message_id: &str, e: Report<StoreError>) -> MessagingError {
    MessagingError::LogFailed {
        message_id: message_id.to_string(),
        reason: e.current_context().to_string(),
    }
}

impl MessageLog {
    /// Creates a log over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Records a customer message under its WhatsApp id.
    pub async fn record_inbound(&self, message: &InboundMessage) -> Result<(), Report<MessagingError>> {
        let record = object(json!({
            "message_id": message.message_id,
            "from": message.from,
            "timestamp": message.timestamp,
            "type": message.kind.as_str(),
            "direction": "inbound",
            "content": message.raw,
            "metadata": message.metadata,
            "created_at": Utc::now(),
        }));
        self.store
            .set_merge(collections::WHATSAPP_MESSAGES, &message.message_id, record)
            .await
            .map_err(|e| log_failed(&message.message_id, e))?;
        debug!(message_id = %message.message_id, "inbound message logged");
        Ok(())
    }

    /// Merges the resolved download URL onto a logged media message.
    pub async fn record_media_url(
        &self,
        message_id: &str,
        url: &str,
    ) -> Result<(), Report<MessagingError>> {
        let partial = object(json!({
            "media_url": url,
            "updated_at": Utc::now(),
        }));
        self.store
            .set_merge(collections::WHATSAPP_MESSAGES, message_id, partial)
            .await
            .map_err(|e| log_failed(message_id, e))?;
        Ok(())
    }

    /// Merges a delivery status onto the logged message.
    pub async fn record_status(&self, status: &StatusUpdate) -> Result<(), Report<MessagingError>> {
        let partial = object(json!({
            "status": status.status,
            "status_timestamp": status.timestamp,
            "updated_at": Utc::now(),
        }));
        self.store
            .set_merge(collections::WHATSAPP_MESSAGES, &status.message_id, partial)
            .await
            .map_err(|e| log_failed(&status.message_id, e))?;
        debug!(message_id = %status.message_id, status = %status.status, "message status updated");
        Ok(())
    }

    /// Records a message we sent.
    ///
    /// Sends without a provider id are stored under a generated key.
    pub async fn record_outbound(
        &self,
        receipt: &DeliveryReceipt,
        message: &Outbound,
    ) -> Result<(), Report<MessagingError>> {
        let record = object(json!({
            "message_id": receipt.message_id,
            "to": receipt.recipient,
            "direction": "outbound",
            "type": message.kind(),
            "content": message.summary(),
            "api_response": receipt.response,
            "status": "sent",
            "created_at": Utc::now(),
        }));

        match &receipt.message_id {
            Some(message_id) => self
                .store
                .set_merge(collections::WHATSAPP_MESSAGES, message_id, record)
                .await
                .map_err(|e| log_failed(message_id, e))?,
            None => {
                self.store
                    .insert(collections::WHATSAPP_MESSAGES, record)
                    .await
                    .map_err(|e| log_failed("unknown", e))?;
            }
        }
        debug!(message_id = ?receipt.message_id, "outbound message logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::MessageKind;
    use sales_agent_store::{FailingStore, MemoryStore};
    use serde_json::Map;

    fn inbound() -> InboundMessage {
        InboundMessage {
            message_id: "wamid.in".to_string(),
            from: "250788000001".to_string(),
            timestamp: None,
            kind: MessageKind::Text,
            utterance: "Muraho".to_string(),
            raw: json!({"id": "wamid.in", "type": "text", "text": {"body": "Muraho"}}),
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn inbound_then_status() {
        let store = Arc::new(MemoryStore::new());
        let log = MessageLog::new(store.clone());

        log.record_inbound(&inbound()).await.unwrap();
        log.record_status(&StatusUpdate {
            message_id: "wamid.in".to_string(),
            status: "read".to_string(),
            timestamp: None,
        })
        .await
        .unwrap();

        let record = store
            .get(collections::WHATSAPP_MESSAGES, "wamid.in")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["direction"], "inbound");
        assert_eq!(record["type"], "text");
        assert_eq!(record["status"], "read");
        assert_eq!(record["content"]["text"]["body"], "Muraho");
    }

    #[tokio::test]
    async fn outbound_with_and_without_id() {
        let store = Arc::new(MemoryStore::new());
        let log = MessageLog::new(store.clone());

        let mut receipt = DeliveryReceipt {
            message_id: Some("wamid.out".to_string()),
            recipient: "250788000001".to_string(),
            response: json!({"messages": [{"id": "wamid.out"}]}),
        };
        log.record_outbound(&receipt, &Outbound::text("Muraho!"))
            .await
            .unwrap();
        receipt.message_id = None;
        let brochure = Outbound::document("https://easymo.rw/brochures/general.pdf", None);
        log.record_outbound(&receipt, &brochure).await.unwrap();

        assert_eq!(store.count(collections::WHATSAPP_MESSAGES).await, 2);
        let record = store
            .get(collections::WHATSAPP_MESSAGES, "wamid.out")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["direction"], "outbound");
        assert_eq!(record["status"], "sent");
        assert_eq!(record["content"], "Muraho!");

        let document = store
            .all(collections::WHATSAPP_MESSAGES)
            .await
            .into_iter()
            .find(|stored| stored.key != "wamid.out")
            .unwrap()
            .document;
        assert_eq!(document["type"], "document");
        assert_eq!(document["content"], "https://easymo.rw/brochures/general.pdf");
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let log = MessageLog::new(Arc::new(FailingStore::default()));
        let err = log.record_inbound(&inbound()).await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            MessagingError::LogFailed { message_id, .. } if message_id == "wamid.in"
        ));
    }
}
