//! The document store contract.
//!
//! Documents are JSON objects addressed by `(collection, key)`. Every
//! write primitive here is a single atomic operation at the storage layer,
//! so callers never need a read-modify-write of a whole document.

use crate::error::StoreError;
use async_trait::async_trait;
use sales_agent_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A stored document: a JSON object.
pub type Document = Map<String, JsonValue>;

/// Well-known collection names.
pub mod collections {
    /// Conversation sessions, keyed by session id.
    pub const SESSIONS: &str = "sessions";
    /// Leads captured by `create_lead`.
    pub const LEADS: &str = "leads";
    /// Callback requests captured by `schedule_callback`.
    pub const CALLBACKS: &str = "callbacks";
    /// Queued brochure sends.
    pub const BROCHURE_QUEUE: &str = "brochure_queue";
    /// Product and service inventory searched by `search_inventory`.
    pub const INVENTORY: &str = "inventory";
    /// Inbound and outbound WhatsApp message log.
    pub const WHATSAPP_MESSAGES: &str = "whatsapp_messages";
}

/// An equality filter on a top-level document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Field name.
    pub field: String,
    /// Value the field must equal.
    pub value: JsonValue,
}

impl FieldFilter {
    /// Creates an equality filter.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns true if the document satisfies this filter.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        document.get(&self.field) == Some(&self.value)
    }
}

/// A document together with its key, as returned by queries.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document key within its collection.
    pub key: String,
    /// Document body.
    pub document: Document,
}

/// Document-oriented storage used by sessions, tools and the message log.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document. Absent documents are `None`, not an error.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Deep-merges `partial` into the document, creating it if absent.
    ///
    /// Nested objects merge field by field; arrays and scalars are replaced.
    async fn set_merge(
        &self,
        collection: &str,
        key: &str,
        partial: Document,
    ) -> Result<(), StoreError>;

    /// Deep-merges `defaults` under the document, creating it if absent.
    ///
    /// Existing values always win, so this never resets a populated field.
    async fn set_defaults(
        &self,
        collection: &str,
        key: &str,
        defaults: Document,
    ) -> Result<(), StoreError>;

    /// Applies `set_merge` semantics only when the document exists and its
    /// `guard_field` is not equal to `guard_value`.
    ///
    /// Returns whether the update was applied.
    async fn merge_unless(
        &self,
        collection: &str,
        key: &str,
        guard_field: &str,
        guard_value: &JsonValue,
        partial: Document,
    ) -> Result<bool, StoreError>;

    /// Atomically appends every element, in order, to the array at `field`.
    ///
    /// Creates the document and the array when either is absent. Either all
    /// elements are appended or none are.
    async fn append_many(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        elements: Vec<JsonValue>,
    ) -> Result<(), StoreError>;

    /// Atomically appends `element` to the array at `field`.
    async fn append_to_array(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        element: JsonValue,
    ) -> Result<(), StoreError> {
        self.append_many(collection, key, field, vec![element]).await
    }

    /// Inserts a new document under a generated key and returns the key.
    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError>;

    /// Returns up to `limit` documents matching every filter, in key order.
    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Deep-merges `patch` into `target`. Patch values win.
pub fn deep_merge(target: &mut Document, patch: Document) {
    for (field, value) in patch {
        match (target.get_mut(&field), value) {
            (Some(JsonValue::Object(existing)), JsonValue::Object(nested)) => {
                deep_merge(existing, nested);
            }
            (_, value) => {
                target.insert(field, value);
            }
        }
    }
}

/// Deep-merges `defaults` into `target`. Existing values win.
pub fn merge_defaults(target: &mut Document, defaults: Document) {
    for (field, value) in defaults {
        match (target.get_mut(&field), value) {
            (Some(JsonValue::Object(existing)), JsonValue::Object(nested)) => {
                merge_defaults(existing, nested);
            }
            (Some(_), _) => {}
            (None, value) => {
                target.insert(field, value);
            }
        }
    }
}

/// Encodes a serializable value as a document.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the value is not a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Serialization {
            details: format!("expected a JSON object, got {other}"),
        }
        .into()),
        Err(e) => Err(StoreError::Serialization {
            details: e.to_string(),
        }
        .into()),
    }
}

/// Decodes a document into a typed value.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the document does not match `T`.
pub fn from_document<T: for<'de> Deserialize<'de>>(document: Document) -> Result<T, StoreError> {
    serde_json::from_value(JsonValue::Object(document)).map_err(|e| {
        StoreError::Serialization {
            details: e.to_string(),
        }
        .into()
    })
}
