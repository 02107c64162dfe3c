//! Stores that fail or stall every operation.

use crate::document::{Document, DocumentStore, FieldFilter, StoredDocument};
use crate::error::StoreError;
use async_trait::async_trait;
use sales_agent_core::Result;
use serde_json::Value as JsonValue;

/// Document store whose every operation fails with
/// [`StoreError::Unavailable`].
///
/// Used to exercise the failure paths of callers.
#[derive(Debug, Clone)]
pub struct FailingStore {
    details: String,
}

impl FailingStore {
    /// Creates a store failing with the given details.
    #[must_use]
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
        }
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        Err(StoreError::Unavailable {
            details: self.details.clone(),
        }
        .into())
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new("connection refused")
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _collection: &str, _key: &str) -> Result<Option<Document>, StoreError> {
        self.fail()
    }

    async fn set_merge(
        &self,
        _collection: &str,
        _key: &str,
        _partial: Document,
    ) -> Result<(), StoreError> {
        self.fail()
    }

    async fn set_defaults(
        &self,
        _collection: &str,
        _key: &str,
        _defaults: Document,
    ) -> Result<(), StoreError> {
        self.fail()
    }

    async fn merge_unless(
        &self,
        _collection: &str,
        _key: &str,
        _guard_field: &str,
        _guard_value: &JsonValue,
        _partial: Document,
    ) -> Result<bool, StoreError> {
        self.fail()
    }

    async fn append_many(
        &self,
        _collection: &str,
        _key: &str,
        _field: &str,
        _elements: Vec<JsonValue>,
    ) -> Result<(), StoreError> {
        self.fail()
    }

    async fn insert(&self, _collection: &str, _document: Document) -> Result<String, StoreError> {
        self.fail()
    }

    async fn query(
        &self,
        _collection: &str,
        _filters: &[FieldFilter],
        _limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.fail()
    }
}

/// Document store whose every operation never completes.
///
/// Used to exercise deadlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledStore;

#[async_trait]
impl DocumentStore for StalledStore {
    async fn get(&self, _collection: &str, _key: &str) -> Result<Option<Document>, StoreError> {
        std::future::pending().await
    }

    async fn set_merge(
        &self,
        _collection: &str,
        _key: &str,
        _partial: Document,
    ) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn set_defaults(
        &self,
        _collection: &str,
        _key: &str,
        _defaults: Document,
    ) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn merge_unless(
        &self,
        _collection: &str,
        _key: &str,
        _guard_field: &str,
        _guard_value: &JsonValue,
        _partial: Document,
    ) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    async fn append_many(
        &self,
        _collection: &str,
        _key: &str,
        _field: &str,
        _elements: Vec<JsonValue>,
    ) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn insert(&self, _collection: &str, _document: Document) -> Result<String, StoreError> {
        std::future::pending().await
    }

    async fn query(
        &self,
        _collection: &str,
        _filters: &[FieldFilter],
        _limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        std::future::pending().await
    }
}
