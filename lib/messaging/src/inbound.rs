//! WhatsApp webhook deliveries.
//!
//! Meta batches messages and status updates under
//! `entry[].changes[].value`; everything we do not read is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// Top-level webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<JsonValue>,
    #[serde(default)]
    pub statuses: Vec<RawStatus>,
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStatus {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    from: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<RawText>,
}

#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(default)]
    body: String,
}

/// Kind of inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Audio,
    Image,
    Other(String),
}

impl MessageKind {
    fn parse(kind: &str) -> Self {
        match kind {
            "text" => Self::Text,
            "audio" => Self::Audio,
            "image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Other(kind) => kind,
        }
    }
}

/// One customer message, ready to become a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub message_id: String,
    /// Sender phone number.
    pub from: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: MessageKind,
    /// What the turn controller should see as the user utterance.
    pub utterance: String,
    /// The message exactly as delivered.
    pub raw: JsonValue,
    /// The `metadata` block of the enclosing change.
    pub metadata: Map<String, JsonValue>,
}

impl InboundMessage {
    /// Id of the attached media, for audio, image and other media kinds.
    #[must_use]
    pub fn media_id(&self) -> Option<&str> {
        if self.kind == MessageKind::Text {
            return None;
        }
        self.raw
            .get(self.kind.as_str())
            .and_then(|media| media.get("id"))
            .and_then(JsonValue::as_str)
    }
}

/// A delivery status change for a message we sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub message_id: String,
    pub status: String,
    pub timestamp: Option<DateTime<Utc>>,
}

fn epoch_seconds(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn utterance(kind: &MessageKind, text: Option<RawText>) -> String {
    match kind {
        MessageKind::Text => text.map(|t| t.body).unwrap_or_default(),
        MessageKind::Audio => "[Audio message received - transcription pending]".to_string(),
        MessageKind::Image => "[Image received]".to_string(),
        MessageKind::Other(kind) => format!("[{kind} message received]"),
    }
}

impl WebhookPayload {
    fn values(&self) -> impl Iterator<Item = &ChangeValue> {
        self.entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .map(|change| &change.value)
    }

    /// Every customer message in the delivery, in order.
    ///
    /// Messages without an id or sender are skipped.
    #[must_use]
    pub fn messages(&self) -> Vec<InboundMessage> {
        self.values()
            .flat_map(|value| {
                value.messages.iter().filter_map(move |raw| {
                    let message: RawMessage = serde_json::from_value(raw.clone()).ok()?;
                    let kind = MessageKind::parse(&message.kind);
                    Some(InboundMessage {
                        message_id: message.id,
                        from: message.from,
                        timestamp: epoch_seconds(message.timestamp.as_deref()),
                        utterance: utterance(&kind, message.text),
                        kind,
                        raw: raw.clone(),
                        metadata: value.metadata.clone(),
                    })
                })
            })
            .collect()
    }

    /// Every status update in the delivery, in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusUpdate> {
        self.values()
            .flat_map(|value| value.statuses.iter())
            .map(|status| StatusUpdate {
                message_id: status.id.clone(),
                status: status.status.clone(),
                timestamp: epoch_seconds(status.timestamp.as_deref()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delivery(messages: JsonValue, statuses: JsonValue) -> WebhookPayload {
        serde_json::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "552732297926796",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {"phone_number_id": "561637583695258"},
                        "messages": messages,
                        "statuses": statuses
                    }
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn parses_text_message() {
        let payload = delivery(
            json!([{
                "id": "wamid.1",
                "from": "250788000001",
                "timestamp": "1760860800",
                "type": "text",
                "text": {"body": "Ndashaka ubwishingizi"}
            }]),
            json!([]),
        );

        let messages = payload.messages();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.media_id(), None);
        assert_eq!(message.utterance, "Ndashaka ubwishingizi");
        assert_eq!(message.timestamp.unwrap().timestamp(), 1_760_860_800);
        assert_eq!(message.metadata["phone_number_id"], "561637583695258");
    }

    #[test]
    fn media_messages_get_placeholders() {
        let payload = delivery(
            json!([
                {"id": "a", "from": "1", "type": "audio", "audio": {"id": "m1"}},
                {"id": "b", "from": "1", "type": "image", "image": {"id": "m2"}},
                {"id": "c", "from": "1", "type": "sticker", "sticker": {"id": "m3"}}
            ]),
            json!([]),
        );

        let messages = payload.messages();
        let media_ids: Vec<_> = messages.iter().map(InboundMessage::media_id).collect();
        assert_eq!(media_ids, vec![Some("m1"), Some("m2"), Some("m3")]);

        let utterances: Vec<_> = messages.into_iter().map(|m| m.utterance).collect();
        assert_eq!(
            utterances,
            vec![
                "[Audio message received - transcription pending]",
                "[Image received]",
                "[sticker message received]",
            ]
        );
    }

    #[test]
    fn skips_unreadable_messages_and_reads_statuses() {
        let payload = delivery(
            json!([{"type": "text"}]),
            json!([{"id": "wamid.out", "status": "delivered", "timestamp": "1760860900"}]),
        );

        assert!(payload.messages().is_empty());
        let statuses = payload.statuses();
        assert_eq!(statuses[0].message_id, "wamid.out");
        assert_eq!(statuses[0].status, "delivered");
    }

    #[test]
    fn empty_body_has_nothing() {
        let payload: WebhookPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.messages().is_empty());
        assert!(payload.statuses().is_empty());
    }
}
