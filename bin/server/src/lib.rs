//! Webhook server for the EasyMo sales agent.
//!
//! Receives WhatsApp Business deliveries and Dialogflow CX voice webhooks,
//! runs each through the turn controller, and replies on the same channel.

pub mod config;
pub mod dialogflow;
pub mod error;
pub mod routes;
pub mod state;
pub mod whatsapp;
