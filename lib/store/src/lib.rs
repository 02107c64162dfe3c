//! Document storage for the sales agent.
//!
//! Sessions, leads, callbacks and queued sends all live in a
//! document-oriented store. This crate provides:
//!
//! - **DocumentStore trait**: the handful of operations the agent needs
//!   (get, field-level merge, atomic append, conditional update, insert, query)
//! - **MemoryStore**: process-local store for development and tests
//! - **PgDocumentStore**: PostgreSQL JSONB store
//! - **TimeoutStore**: bounds every operation of a wrapped store
//! - **FailingStore** / **StalledStore**: always fail or never finish, for
//!   failure-containment and deadline tests

pub mod document;
pub mod error;
pub mod failing;
pub mod memory;
pub mod postgres;
pub mod timeout;

pub use document::{
    Document, DocumentStore, FieldFilter, StoredDocument, collections, deep_merge, from_document,
    merge_defaults, to_document,
};
pub use error::StoreError;
pub use failing::{FailingStore, StalledStore};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use timeout::TimeoutStore;
