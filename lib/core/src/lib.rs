//! Core domain types and utilities for the sales agent.
//!
//! This crate provides the identifiers, channel vocabulary, and error
//! alias shared by the store, conversation, tool, and server crates.

pub mod channel;
pub mod error;
pub mod id;

pub use channel::Channel;
pub use error::Result;
pub use id::{BrochureRequestId, CallbackId, LeadId, ParseIdError, SessionId};
