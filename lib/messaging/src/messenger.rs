//! Outbound messaging abstraction.

use crate::error::MessagingError;
use crate::outbound::{Media, Outbound, Template};
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Mutex;

/// What the provider told us about a sent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider message id, when one was returned.
    pub message_id: Option<String>,
    /// Who the message went to.
    pub recipient: String,
    /// The provider's raw answer.
    pub response: JsonValue,
}

/// Trait for sending messages to customers.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends any outbound message.
    async fn send(
        &self,
        recipient: &str,
        message: &Outbound,
    ) -> Result<DeliveryReceipt, Report<MessagingError>>;

    /// Marks an inbound message as read.
    async fn mark_read(&self, message_id: &str) -> Result<(), Report<MessagingError>>;

    /// Sends a plain text message.
    async fn send_text(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<DeliveryReceipt, Report<MessagingError>> {
        self.send(recipient, &Outbound::text(text)).await
    }

    /// Sends an image, video, audio clip or document by link.
    async fn send_media(
        &self,
        recipient: &str,
        media: Media,
    ) -> Result<DeliveryReceipt, Report<MessagingError>> {
        self.send(recipient, &Outbound::Media(media)).await
    }

    /// Sends a pre-approved template.
    async fn send_template(
        &self,
        recipient: &str,
        template: Template,
    ) -> Result<DeliveryReceipt, Report<MessagingError>> {
        self.send(recipient, &Outbound::Template(template)).await
    }
}

/// Trait for fetching media customers sent us.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Resolves a media id to a short-lived download URL.
    async fn media_url(&self, media_id: &str) -> Result<String, Report<MessagingError>>;

    /// Downloads media from a URL returned by [`MediaFetcher::media_url`].
    async fn download_media(&self, url: &str) -> Result<Vec<u8>, Report<MessagingError>>;
}

/// A message captured by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub recipient: String,
    pub content: Outbound,
}

/// Messenger that records instead of sending.
///
/// Media ids resolve to `https://media.recorded/<id>`, whose download is
/// the id's bytes.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    read: Mutex<Vec<String>>,
    failure: Option<MessagingError>,
}

const RECORDED_MEDIA_BASE: &str = "https://media.recorded/";

impl RecordingMessenger {
    /// Creates a messenger that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a messenger whose every call fails with `error`.
    #[must_use]
    pub fn failing(error: MessagingError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Message ids marked read so far.
    #[must_use]
    pub fn read(&self) -> Vec<String> {
        self.read.lock().map(|read| read.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), Report<MessagingError>> {
        match &self.failure {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(
        &self,
        recipient: &str,
        message: &Outbound,
    ) -> Result<DeliveryReceipt, Report<MessagingError>> {
        self.check()?;
        let count = match self.sent.lock() {
            Ok(mut sent) => {
                sent.push(SentMessage {
                    recipient: recipient.to_string(),
                    content: message.clone(),
                });
                sent.len()
            }
            Err(_) => 0,
        };
        let message_id = format!("wamid.recorded.{count}");
        Ok(DeliveryReceipt {
            message_id: Some(message_id.clone()),
            recipient: recipient.to_string(),
            response: serde_json::json!({"messages": [{"id": message_id}]}),
        })
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), Report<MessagingError>> {
        self.check()?;
        if let Ok(mut read) = self.read.lock() {
            read.push(message_id.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for RecordingMessenger {
    async fn media_url(&self, media_id: &str) -> Result<String, Report<MessagingError>> {
        self.check()?;
        Ok(format!("{RECORDED_MEDIA_BASE}{media_id}"))
    }

    async fn download_media(&self, url: &str) -> Result<Vec<u8>, Report<MessagingError>> {
        self.check()?;
        url.strip_prefix(RECORDED_MEDIA_BASE)
            .map(|media_id| media_id.as_bytes().to_vec())
            .ok_or_else(|| {
                MessagingError::Rejected {
                    status: 404,
                    body: format!("no recorded media at {url}"),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::MediaKind;

    #[tokio::test]
    async fn records_sends_and_reads() {
        let messenger = RecordingMessenger::new();
        let receipt = messenger.send_text("250788000001", "Muraho!").await.unwrap();
        messenger.mark_read("wamid.in.1").await.unwrap();

        assert_eq!(receipt.message_id.as_deref(), Some("wamid.recorded.1"));
        assert_eq!(
            messenger.sent(),
            vec![SentMessage {
                recipient: "250788000001".to_string(),
                content: Outbound::text("Muraho!"),
            }]
        );
        assert_eq!(messenger.read(), vec!["wamid.in.1".to_string()]);
    }

    #[tokio::test]
    async fn records_media_and_templates() {
        let messenger = RecordingMessenger::new();
        let brochure = Media {
            kind: MediaKind::Document,
            link: "https://easymo.rw/brochures/general.pdf".to_string(),
            caption: None,
        };
        messenger.send_media("250788000001", brochure.clone()).await.unwrap();
        let receipt = messenger
            .send_template("250788000001", Template::new("welcome"))
            .await
            .unwrap();

        assert_eq!(receipt.message_id.as_deref(), Some("wamid.recorded.2"));
        let sent = messenger.sent();
        assert_eq!(sent[0].content, Outbound::Media(brochure));
        assert_eq!(sent[1].content.kind(), "template");
    }

    #[tokio::test]
    async fn recorded_media_round_trips() {
        let messenger = RecordingMessenger::new();
        let url = messenger.media_url("m1").await.unwrap();
        assert_eq!(url, "https://media.recorded/m1");
        assert_eq!(messenger.download_media(&url).await.unwrap(), b"m1".to_vec());
        assert!(messenger.download_media("https://elsewhere/m1").await.is_err());
    }

    #[tokio::test]
    async fn failing_messenger_fails() {
        let messenger = RecordingMessenger::failing(MessagingError::Timeout);
        let err = messenger.send_text("1", "x").await.unwrap_err();
        assert_eq!(err.current_context(), &MessagingError::Timeout);
        assert!(messenger.media_url("m1").await.is_err());
        assert!(messenger.sent().is_empty());
    }
}
