//! Deadline wrapper for any document store.

use crate::document::{Document, DocumentStore, FieldFilter, StoredDocument};
use crate::error::StoreError;
use async_trait::async_trait;
use sales_agent_core::Result;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::time::Duration;

/// Bounds every operation of the wrapped store.
///
/// An operation that exceeds the deadline fails with
/// [`StoreError::Timeout`] instead of hanging the caller.
#[derive(Debug)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    /// Wraps `inner`, bounding each operation by `timeout`.
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.timeout, "store operation timed out");
                Err(StoreError::Timeout {
                    operation: operation.to_string(),
                    after: self.timeout,
                }
                .into())
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimeoutStore<S> {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        self.bounded("get", self.inner.get(collection, key)).await
    }

    async fn set_merge(
        &self,
        collection: &str,
        key: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        self.bounded("set_merge", self.inner.set_merge(collection, key, partial))
            .await
    }

    async fn set_defaults(
        &self,
        collection: &str,
        key: &str,
        defaults: Document,
    ) -> Result<(), StoreError> {
        self.bounded(
            "set_defaults",
            self.inner.set_defaults(collection, key, defaults),
        )
        .await
    }

    async fn merge_unless(
        &self,
        collection: &str,
        key: &str,
        guard_field: &str,
        guard_value: &JsonValue,
        partial: Document,
    ) -> Result<bool, StoreError> {
        self.bounded(
            "merge_unless",
            self.inner
                .merge_unless(collection, key, guard_field, guard_value, partial),
        )
        .await
    }

    async fn append_many(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        elements: Vec<JsonValue>,
    ) -> Result<(), StoreError> {
        self.bounded(
            "append_many",
            self.inner.append_many(collection, key, field, elements),
        )
        .await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        self.bounded("insert", self.inner.insert(collection, document))
            .await
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.bounded("query", self.inner.query(collection, filters, limit))
            .await
    }
}
