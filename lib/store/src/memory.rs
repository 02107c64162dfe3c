//! Process-local document store.

use crate::document::{
    Document, DocumentStore, FieldFilter, StoredDocument, deep_merge, merge_defaults,
};
use crate::error::StoreError;
use async_trait::async_trait;
use sales_agent_core::Result;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use ulid::Ulid;

type Collection = BTreeMap<String, Document>;

/// In-memory document store.
///
/// Each operation takes the store-wide write lock for its whole duration,
/// which makes every write primitive atomic. Nothing is held across an
/// await outside of the store itself.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns every document in a collection, in key order.
    pub async fn all(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, document)| StoredDocument {
                        key: key.clone(),
                        document: document.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn set_merge(
        &self,
        collection: &str,
        key: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let document = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();
        deep_merge(document, partial);
        Ok(())
    }

    async fn set_defaults(
        &self,
        collection: &str,
        key: &str,
        defaults: Document,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let document = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();
        merge_defaults(document, defaults);
        Ok(())
    }

    async fn merge_unless(
        &self,
        collection: &str,
        key: &str,
        guard_field: &str,
        guard_value: &JsonValue,
        partial: Document,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
        else {
            return Ok(false);
        };

        if document.get(guard_field) == Some(guard_value) {
            return Ok(false);
        }

        deep_merge(document, partial);
        Ok(true)
    }

    async fn append_many(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        elements: Vec<JsonValue>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let document = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();

        match document
            .entry(field.to_string())
            .or_insert_with(|| JsonValue::Array(Vec::new()))
        {
            JsonValue::Array(items) => {
                items.extend(elements);
                Ok(())
            }
            _ => Err(StoreError::Backend {
                details: format!("field '{field}' of {collection}/{key} is not an array"),
            }
            .into()),
        }
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        let key = Ulid::new().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(key.clone(), document);
        Ok(key)
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|(_, document)| filters.iter().all(|f| f.matches(document)))
            .take(limit)
            .map(|(key, document)| StoredDocument {
                key: key.clone(),
                document: document.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(value: JsonValue) -> Document {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("test documents must be objects"),
        }
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("sessions", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_creates_document_and_array() {
        let store = MemoryStore::new();
        store
            .append_to_array("sessions", "s1", "turns", json!("a"))
            .await
            .unwrap();
        store
            .append_to_array("sessions", "s1", "turns", json!("b"))
            .await
            .unwrap();

        let document = store.get("sessions", "s1").await.unwrap().unwrap();
        assert_eq!(document["turns"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn append_many_keeps_order() {
        let store = MemoryStore::new();
        store
            .append_to_array("sessions", "s1", "turns", json!("a"))
            .await
            .unwrap();
        store
            .append_many("sessions", "s1", "turns", vec![json!("b"), json!("c")])
            .await
            .unwrap();

        let document = store.get("sessions", "s1").await.unwrap().unwrap();
        assert_eq!(document["turns"], json!(["a", "b", "c"]));
    }

    #[tokio::test]
    async fn append_rejects_non_array_field() {
        let store = MemoryStore::new();
        store
            .set_merge("sessions", "s1", doc(json!({"turns": "oops"})))
            .await
            .unwrap();
        let err = store
            .append_to_array("sessions", "s1", "turns", json!("a"))
            .await
            .unwrap_err();
        assert!(matches!(err.current_context(), StoreError::Backend { .. }));
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_applied() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_to_array("sessions", "s1", "turns", json!(i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let document = store.get("sessions", "s1").await.unwrap().unwrap();
        assert_eq!(document["turns"].as_array().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn merge_unless_respects_guard() {
        let store = MemoryStore::new();
        assert!(
            !store
                .merge_unless("sessions", "s1", "status", &json!("completed"), Document::new())
                .await
                .unwrap(),
            "absent documents are never updated"
        );

        store
            .set_merge("sessions", "s1", doc(json!({"status": "active"})))
            .await
            .unwrap();
        let applied = store
            .merge_unless(
                "sessions",
                "s1",
                "status",
                &json!("completed"),
                doc(json!({"status": "completed", "end_time": "t1"})),
            )
            .await
            .unwrap();
        assert!(applied);

        let applied = store
            .merge_unless(
                "sessions",
                "s1",
                "status",
                &json!("completed"),
                doc(json!({"status": "completed", "end_time": "t2"})),
            )
            .await
            .unwrap();
        assert!(!applied);

        let document = store.get("sessions", "s1").await.unwrap().unwrap();
        assert_eq!(document["end_time"], json!("t1"));
    }

    #[tokio::test]
    async fn query_filters_then_limits_in_key_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .set_merge(
                    "inventory",
                    &format!("item{i}"),
                    doc(json!({"category": if i % 2 == 0 { "insurance" } else { "transport" }, "n": i})),
                )
                .await
                .unwrap();
        }

        let results = store
            .query("inventory", &[FieldFilter::eq("category", "insurance")], 2)
            .await
            .unwrap();
        let keys: Vec<_> = results.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["item0", "item2"]);
    }

    #[tokio::test]
    async fn insert_generates_distinct_keys() {
        let store = MemoryStore::new();
        let a = store.insert("leads", Document::new()).await.unwrap();
        let b = store.insert("leads", Document::new()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count("leads").await, 2);
    }
}
