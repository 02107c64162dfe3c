//! Messaging for the sales agent.
//!
//! This crate provides:
//!
//! - **Messenger**: the outbound capability the webhook surface replies through
//! - **Outbound**: text, media, template and interactive message payloads
//! - **MediaFetcher**: resolves and downloads media customers send
//! - **WhatsAppClient**: WhatsApp Business Cloud API implementation
//! - **Inbound parsing**: typed view of WhatsApp webhook deliveries
//! - **MessageLog**: inbound, outbound and status records in the store

pub mod error;
pub mod inbound;
pub mod log;
pub mod messenger;
pub mod outbound;
pub mod whatsapp;

pub use error::MessagingError;
pub use inbound::{InboundMessage, MessageKind, StatusUpdate, WebhookPayload};
pub use log::MessageLog;
pub use messenger::{DeliveryReceipt, MediaFetcher, Messenger, RecordingMessenger, SentMessage};
pub use outbound::{
    Interactive, ListRow, ListSection, Media, MediaKind, Outbound, ReplyButton, Template,
};
pub use whatsapp::{WhatsAppClient, WhatsAppConfig};
