//! WhatsApp Business Cloud API client.

use crate::error::MessagingError;
use crate::messenger::{DeliveryReceipt, MediaFetcher, Messenger};
use crate::outbound::Outbound;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// WhatsApp Business Cloud API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Business phone number id messages are sent from.
    pub phone_number_id: String,
    /// Bearer token for the Graph API.
    pub access_token: String,
    /// Token Meta echoes during webhook verification.
    pub verify_token: String,
    /// Graph API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Graph API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_api_version() -> String {
    "v21.0".to_string()
}

fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    15
}

impl WhatsAppConfig {
    /// Endpoint that accepts outbound messages and read receipts.
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            self.phone_number_id
        )
    }

    /// Endpoint describing an uploaded media object.
    #[must_use]
    pub fn media_endpoint(&self, media_id: &str) -> String {
        format!(
            "{}/{}/{media_id}",
            self.base_url.trim_end_matches('/'),
            self.api_version
        )
    }
}

fn send_error(e: reqwest::Error) -> MessagingError {
    if e.is_timeout() {
        MessagingError::Timeout
    } else {
        MessagingError::ConnectionFailed {
            reason: e.to_string(),
        }
    }
}

/// Maps a non-success Graph API status to an error.
async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, Report<MessagingError>> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(MessagingError::RateLimited { retry_after_secs }.into());
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Graph API rejected request");
        return Err(MessagingError::Rejected {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(response)
}

/// Sends messages through the Graph API.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: WhatsAppConfig) -> Result<Self, Report<MessagingError>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| MessagingError::ConnectionFailed {
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    async fn post(&self, payload: &JsonValue) -> Result<JsonValue, Report<MessagingError>> {
        let response = self
            .client
            .post(self.config.messages_url())
            .bearer_auth(&self.config.access_token)
            .json(payload)
            .send()
            .await
            .map_err(send_error)?;

        check_status(response).await?.json().await.map_err(|e| {
            MessagingError::InvalidResponse {
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, Report<MessagingError>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(send_error)?;
        check_status(response).await
    }
}

/// Payload that marks an inbound message as read.
#[must_use]
pub fn read_payload(message_id: &str) -> JsonValue {
    json!({
        "messaging_product": "whatsapp",
        "status": "read",
        "message_id": message_id,
    })
}

/// Extracts the sent message id from a Graph API answer.
fn sent_message_id(response: &JsonValue) -> Option<String> {
    response
        .pointer("/messages/0/id")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

#[async_trait]
impl Messenger for WhatsAppClient {
    #[instrument(skip(self, message), fields(kind = message.kind()))]
    async fn send(
        &self,
        recipient: &str,
        message: &Outbound,
    ) -> Result<DeliveryReceipt, Report<MessagingError>> {
        let response = self.post(&message.payload(recipient)).await?;
        let message_id = sent_message_id(&response);
        info!(message_id = ?message_id, "WhatsApp message sent");
        Ok(DeliveryReceipt {
            message_id,
            recipient: recipient.to_string(),
            response,
        })
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, message_id: &str) -> Result<(), Report<MessagingError>> {
        self.post(&read_payload(message_id)).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    #[serde(default)]
    url: String,
}

#[async_trait]
impl MediaFetcher for WhatsAppClient {
    #[instrument(skip(self))]
    async fn media_url(&self, media_id: &str) -> Result<String, Report<MessagingError>> {
        let info: MediaInfo = self
            .get(&self.config.media_endpoint(media_id))
            .await?
            .json()
            .await
            .map_err(|e| MessagingError::InvalidResponse {
                reason: e.to_string(),
            })?;
        if info.url.is_empty() {
            return Err(MessagingError::InvalidResponse {
                reason: format!("media {media_id} has no url"),
            }
            .into());
        }
        Ok(info.url)
    }

    #[instrument(skip(self, url))]
    async fn download_media(&self, url: &str) -> Result<Vec<u8>, Report<MessagingError>> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(send_error)?;
        info!(bytes = bytes.len(), "media downloaded");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::Template;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> WhatsAppConfig {
        serde_json::from_value(json!({
            "phone_number_id": "561637583695258",
            "access_token": "token",
            "verify_token": "verify"
        }))
        .unwrap()
    }

    fn client(server: &MockServer) -> WhatsAppClient {
        WhatsAppClient::new(WhatsAppConfig {
            base_url: server.uri(),
            ..config()
        })
        .unwrap()
    }

    #[test]
    fn config_defaults_and_urls() {
        let config = config();
        assert_eq!(config.api_version, "v21.0");
        assert_eq!(
            config.messages_url(),
            "https://graph.facebook.com/v21.0/561637583695258/messages"
        );
        assert_eq!(
            config.media_endpoint("1234"),
            "https://graph.facebook.com/v21.0/1234"
        );
    }

    #[test]
    fn read_payload_shape() {
        assert_eq!(
            read_payload("wamid.1"),
            json!({"messaging_product": "whatsapp", "status": "read", "message_id": "wamid.1"})
        );
    }

    #[test]
    fn extracts_sent_message_id() {
        let response = json!({"messaging_product": "whatsapp", "messages": [{"id": "wamid.out"}]});
        assert_eq!(sent_message_id(&response).as_deref(), Some("wamid.out"));
        assert_eq!(sent_message_id(&json!({})), None);
    }

    #[tokio::test]
    async fn sends_document_with_bearer_token() {
        let server = MockServer::start().await;
        let brochure = Outbound::document("https://easymo.rw/brochures/broker.pdf", None);

        Mock::given(method("POST"))
            .and(path("/v21.0/561637583695258/messages"))
            .and(header("authorization", "Bearer token"))
            .and(body_json(brochure.payload("250788000001")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"messages": [{"id": "wamid.doc"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client(&server).send("250788000001", &brochure).await.unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("wamid.doc"));
        assert_eq!(receipt.recipient, "250788000001");
    }

    #[tokio::test]
    async fn template_rejection_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("template not approved"))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_template("250788000001", Template::new("welcome"))
            .await
            .unwrap_err();
        assert_eq!(
            err.current_context(),
            &MessagingError::Rejected {
                status: 400,
                body: "template not approved".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let err = client(&server).send_text("1", "Muraho").await.unwrap_err();
        assert_eq!(
            err.current_context(),
            &MessagingError::RateLimited {
                retry_after_secs: Some(30)
            }
        );
    }

    #[tokio::test]
    async fn resolves_and_downloads_media() {
        let server = MockServer::start().await;
        let download_url = format!("{}/media/voice-note", server.uri());

        Mock::given(method("GET"))
            .and(path("/v21.0/m-42"))
            .and(header("authorization", "Bearer token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "m-42", "url": download_url, "mime_type": "audio/ogg"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/voice-note"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"OggS".to_vec()))
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.media_url("m-42").await.unwrap();
        assert_eq!(url, download_url);
        assert_eq!(client.download_media(&url).await.unwrap(), b"OggS".to_vec());
    }

    #[tokio::test]
    async fn media_without_url_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m-1"})))
            .mount(&server)
            .await;

        let err = client(&server).media_url("m-1").await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            MessagingError::InvalidResponse { .. }
        ));
    }
}
