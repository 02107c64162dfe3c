//! Outbound message content and its Graph API payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

/// WhatsApp allows at most three reply buttons per message.
pub const MAX_REPLY_BUTTONS: usize = 3;

/// Kind of media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    /// Wire name, also the payload key holding the media object.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    /// Audio has no caption field.
    #[must_use]
    pub const fn accepts_caption(&self) -> bool {
        !matches!(self, Self::Audio)
    }
}

/// A media attachment sent by link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    /// Public URL WhatsApp fetches the media from.
    pub link: String,
    pub caption: Option<String>,
}

/// A pre-approved template message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub language_code: String,
    /// Header, body and button parameters, passed through as given.
    pub components: Vec<JsonValue>,
}

impl Template {
    /// A template in English with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language_code: "en".to_string(),
            components: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    #[must_use]
    pub fn with_components(mut self, components: Vec<JsonValue>) -> Self {
        self.components = components;
        self
    }
}

/// A quick-reply button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

/// One selectable row of a list message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A titled group of list rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

/// Interactive message with buttons or a list picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interactive {
    Buttons {
        body: String,
        buttons: Vec<ReplyButton>,
        header: Option<String>,
        footer: Option<String>,
    },
    List {
        body: String,
        /// Label of the button that opens the list.
        button: String,
        sections: Vec<ListSection>,
        header: Option<String>,
        footer: Option<String>,
    },
}

impl Interactive {
    fn body(&self) -> &str {
        match self {
            Self::Buttons { body, .. } | Self::List { body, .. } => body,
        }
    }

    fn to_json(&self) -> JsonValue {
        let (mut interactive, header, footer) = match self {
            Self::Buttons {
                body,
                buttons,
                header,
                footer,
            } => {
                let buttons: Vec<JsonValue> = buttons
                    .iter()
                    .take(MAX_REPLY_BUTTONS)
                    .map(|button| {
                        json!({"type": "reply", "reply": {"id": button.id, "title": button.title}})
                    })
                    .collect();
                (
                    json!({
                        "type": "button",
                        "body": {"text": body},
                        "action": {"buttons": buttons},
                    }),
                    header,
                    footer,
                )
            }
            Self::List {
                body,
                button,
                sections,
                header,
                footer,
            } => (
                json!({
                    "type": "list",
                    "body": {"text": body},
                    "action": {"button": button, "sections": sections},
                }),
                header,
                footer,
            ),
        };

        if let Some(header) = header {
            interactive["header"] = json!({"type": "text", "text": header});
        }
        if let Some(footer) = footer {
            interactive["footer"] = json!({"text": footer});
        }
        interactive
    }
}

/// Anything we can send to a WhatsApp contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outbound {
    Text(String),
    Media(Media),
    Template(Template),
    Interactive(Interactive),
}

impl Outbound {
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// A document, such as a PDF brochure, sent by link.
    #[must_use]
    pub fn document(link: impl Into<String>, caption: Option<String>) -> Self {
        Self::Media(Media {
            kind: MediaKind::Document,
            link: link.into(),
            caption,
        })
    }

    /// Message type as logged and as sent in the payload `type` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Media(media) => media.kind.as_str(),
            Self::Template(_) => "template",
            Self::Interactive(_) => "interactive",
        }
    }

    /// What the message log keeps as the message content.
    #[must_use]
    pub fn summary(&self) -> &str {
        match self {
            Self::Text(body) => body,
            Self::Media(media) => &media.link,
            Self::Template(template) => &template.name,
            Self::Interactive(interactive) => interactive.body(),
        }
    }

    /// Graph API payload sending this message to `recipient`.
    #[must_use]
    pub fn payload(&self, recipient: &str) -> JsonValue {
        match self {
            Self::Text(body) => json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": recipient,
                "type": "text",
                "text": {"preview_url": false, "body": body},
            }),
            Self::Media(media) => {
                let mut object = json!({"link": media.link});
                if let Some(caption) = media.caption.as_deref().filter(|_| media.kind.accepts_caption()) {
                    object["caption"] = json!(caption);
                }
                let mut payload = json!({
                    "messaging_product": "whatsapp",
                    "recipient_type": "individual",
                    "to": recipient,
                    "type": media.kind.as_str(),
                });
                payload[media.kind.as_str()] = object;
                payload
            }
            Self::Template(template) => {
                let mut body = json!({
                    "name": template.name,
                    "language": {"code": template.language_code},
                });
                if !template.components.is_empty() {
                    body["components"] = json!(template.components);
                }
                json!({
                    "messaging_product": "whatsapp",
                    "to": recipient,
                    "type": "template",
                    "template": body,
                })
            }
            Self::Interactive(interactive) => json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": recipient,
                "type": "interactive",
                "interactive": interactive.to_json(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_shape() {
        let payload = Outbound::text("Muraho!").payload("250788000001");
        assert_eq!(payload["type"], "text");
        assert_eq!(payload["recipient_type"], "individual");
        assert_eq!(payload["to"], "250788000001");
        assert_eq!(payload["text"]["body"], "Muraho!");
        assert_eq!(payload["text"]["preview_url"], false);
    }

    #[test]
    fn document_payload_shape() {
        let brochure = Outbound::document(
            "https://easymo.rw/brochures/insurance.pdf",
            Some("Insurance brochure".to_string()),
        );
        assert_eq!(brochure.kind(), "document");
        assert_eq!(brochure.summary(), "https://easymo.rw/brochures/insurance.pdf");
        assert_eq!(
            brochure.payload("250788000001"),
            json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "250788000001",
                "type": "document",
                "document": {
                    "link": "https://easymo.rw/brochures/insurance.pdf",
                    "caption": "Insurance brochure"
                }
            })
        );
    }

    #[test]
    fn audio_drops_caption() {
        let audio = Outbound::Media(Media {
            kind: MediaKind::Audio,
            link: "https://easymo.rw/a.ogg".to_string(),
            caption: Some("ignored".to_string()),
        });
        assert_eq!(
            audio.payload("1")["audio"],
            json!({"link": "https://easymo.rw/a.ogg"})
        );
    }

    #[test]
    fn template_payload_shape() {
        let bare = Outbound::Template(Template::new("welcome"));
        assert_eq!(
            bare.payload("1")["template"],
            json!({"name": "welcome", "language": {"code": "en"}})
        );

        let components = vec![json!({"type": "body", "parameters": [{"type": "text", "text": "Aline"}]})];
        let full = Outbound::Template(
            Template::new("follow_up")
                .with_language("rw")
                .with_components(components.clone()),
        );
        let payload = full.payload("1");
        assert_eq!(payload["type"], "template");
        assert_eq!(payload["template"]["language"]["code"], "rw");
        assert_eq!(payload["template"]["components"], json!(components));
        assert!(payload.get("recipient_type").is_none());
    }

    #[test]
    fn buttons_are_capped_and_decorated() {
        let buttons = (1..=4)
            .map(|n| ReplyButton {
                id: format!("b{n}"),
                title: format!("Option {n}"),
            })
            .collect();
        let message = Outbound::Interactive(Interactive::Buttons {
            body: "Hitamo serivisi".to_string(),
            buttons,
            header: Some("EasyMo".to_string()),
            footer: None,
        });

        let interactive = &message.payload("1")["interactive"];
        assert_eq!(interactive["type"], "button");
        assert_eq!(interactive["action"]["buttons"].as_array().unwrap().len(), MAX_REPLY_BUTTONS);
        assert_eq!(interactive["action"]["buttons"][0]["reply"]["id"], "b1");
        assert_eq!(interactive["header"], json!({"type": "text", "text": "EasyMo"}));
        assert!(interactive.get("footer").is_none());
        assert_eq!(message.summary(), "Hitamo serivisi");
    }

    #[test]
    fn list_payload_shape() {
        let message = Outbound::Interactive(Interactive::List {
            body: "Serivisi zacu".to_string(),
            button: "Reba".to_string(),
            sections: vec![ListSection {
                title: "Ubwishingizi".to_string(),
                rows: vec![ListRow {
                    id: "motor".to_string(),
                    title: "Motor".to_string(),
                    description: None,
                }],
            }],
            header: None,
            footer: Some("EasyMo".to_string()),
        });

        let interactive = &message.payload("1")["interactive"];
        assert_eq!(interactive["type"], "list");
        assert_eq!(interactive["action"]["button"], "Reba");
        assert_eq!(
            interactive["action"]["sections"],
            json!([{"title": "Ubwishingizi", "rows": [{"id": "motor", "title": "Motor"}]}])
        );
        assert_eq!(interactive["footer"], json!({"text": "EasyMo"}));
    }
}
