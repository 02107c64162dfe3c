//! PostgreSQL JSONB document store.
//!
//! Every collection shares one `documents` table keyed by
//! `(collection, key)`. Each trait operation is a single SQL statement, so
//! appends and conditional merges are atomic under concurrent writers.

use crate::document::{Document, DocumentStore, FieldFilter, StoredDocument};
use crate::error::StoreError;
use async_trait::async_trait;
use sales_agent_core::Result;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use ulid::Ulid;

/// Row type for document queries.
#[derive(FromRow)]
struct DocumentRow {
    key: String,
    body: JsonValue,
}

impl DocumentRow {
    fn try_into_stored(self) -> Result<StoredDocument, StoreError> {
        match self.body {
            JsonValue::Object(document) => Ok(StoredDocument {
                key: self.key,
                document,
            }),
            other => Err(StoreError::Serialization {
                details: format!("document '{}' is not an object: {other}", self.key),
            }
            .into()),
        }
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Unavailable {
            details: e.to_string(),
        },
        other => StoreError::Backend {
            details: other.to_string(),
        },
    }
}

/// Document store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and returns a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable {
                details: e.to_string(),
            })?;
        Ok(Self::new(pool))
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend {
                details: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self))]
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT key, body
            FROM documents
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_stored()?.document)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, partial))]
    async fn set_merge(
        &self,
        collection: &str,
        key: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO UPDATE
            SET body = jsonb_deep_merge(documents.body, EXCLUDED.body),
                updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(JsonValue::Object(partial))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self, defaults))]
    async fn set_defaults(
        &self,
        collection: &str,
        key: &str,
        defaults: Document,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO UPDATE
            SET body = jsonb_deep_merge(EXCLUDED.body, documents.body),
                updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(JsonValue::Object(defaults))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self, partial))]
    async fn merge_unless(
        &self,
        collection: &str,
        key: &str,
        guard_field: &str,
        guard_value: &JsonValue,
        partial: Document,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = jsonb_deep_merge(body, $5), updated_at = now()
            WHERE collection = $1 AND key = $2
              AND (body -> $3::text) IS DISTINCT FROM $4
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(guard_field)
        .bind(guard_value)
        .bind(JsonValue::Object(partial))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, elements), fields(count = elements.len()))]
    async fn append_many(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        elements: Vec<JsonValue>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, body)
            VALUES ($1, $2, jsonb_build_object($3::text, $4::jsonb))
            ON CONFLICT (collection, key) DO UPDATE
            SET body = jsonb_set(
                    documents.body,
                    ARRAY[$3::text],
                    COALESCE(documents.body -> $3::text, '[]'::jsonb) || $4::jsonb
                ),
                updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(field)
        .bind(JsonValue::Array(elements))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self, document))]
    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        let key = Ulid::new().to_string();
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection)
        .bind(&key)
        .bind(JsonValue::Object(document))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(key)
    }

    /// Filters use JSONB containment, which is equality for scalar values.
    #[instrument(skip(self))]
    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let containment: Document = filters
            .iter()
            .map(|f| (f.field.clone(), f.value.clone()))
            .collect();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT key, body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY key ASC
            LIMIT $3
            "#,
        )
        .bind(collection)
        .bind(JsonValue::Object(containment))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(DocumentRow::try_into_stored).collect()
    }
}
