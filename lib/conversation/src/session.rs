//! Conversation session management.
//!
//! A session is one document in the `sessions` collection. Every mutation
//! goes through a field-level store primitive (merge, defaults, append or
//! guarded merge), so concurrent turns and qualification updates for the
//! same session never overwrite each other.

use crate::error::SessionError;
use crate::message::{Turn, TurnRole};
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use sales_agent_core::{Channel, SessionId};
use sales_agent_store::{
    Document, DocumentStore, StoreError, collections, from_document, to_document,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Placeholder for a qualification field nothing has been learned about.
pub const UNKNOWN: &str = "Unknown";

/// The lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is accepting turns.
    #[default]
    Active,
    /// Session has been finalized. Terminal.
    Completed,
}

impl SessionStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// BANT qualification record kept on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Qualification {
    pub budget: String,
    pub authority: String,
    pub need: String,
    pub timing: String,
}

impl Default for Qualification {
    fn default() -> Self {
        Self {
            budget: UNKNOWN.to_string(),
            authority: UNKNOWN.to_string(),
            need: UNKNOWN.to_string(),
            timing: UNKNOWN.to_string(),
        }
    }
}

/// A partial qualification update.
///
/// Only fields that are present and non-empty are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationPatch {
    pub budget: Option<String>,
    pub authority: Option<String>,
    pub need: Option<String>,
    pub timing: Option<String>,
}

impl QualificationPatch {
    /// Returns the fields that would be written, in a stable order.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("budget", &self.budget),
            ("authority", &self.authority),
            ("need", &self.need),
            ("timing", &self.timing),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (name, v))
        })
        .collect()
    }

    /// Returns true if applying the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// A conversation session as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub channel: Option<Channel>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub turns: Vec<Turn>,
    pub qualification: Qualification,
    pub metadata: Document,
}

impl Session {
    /// Returns true once the session has been finalized.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Stored shape of a session document. The key is not repeated in the body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionRecord {
    status: SessionStatus,
    channel: Option<Channel>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    turns: Vec<Turn>,
    qualification: Qualification,
    metadata: Document,
}

fn storage_failed(session_id: &SessionId, e: Report<StoreError>) -> SessionError {
    SessionError::StorageFailed {
        session_id: session_id.clone(),
        reason: e.current_context().to_string(),
    }
}

fn invalid_data(session_id: &SessionId, e: Report<StoreError>) -> SessionError {
    SessionError::InvalidData {
        session_id: session_id.clone(),
        reason: e.current_context().to_string(),
    }
}

fn object(value: JsonValue) -> Document {
    match value {
        JsonValue::Object(map) => map,
        _ => Document::new(),
    }
}

/// Creates, reads, appends to and finalizes sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
}

impl SessionManager {
    /// Creates a manager over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fields a new session starts with. Existing values always win.
    fn initial_fields(
        session_id: &SessionId,
        channel: Option<Channel>,
        now: DateTime<Utc>,
    ) -> Result<Document, Report<SessionError>> {
        let mut fields = object(json!({
            "session_id": session_id.as_str(),
            "status": SessionStatus::Active.as_str(),
            "start_time": now,
            "turns": [],
            "metadata": {},
        }));
        fields.insert(
            "qualification".to_string(),
            JsonValue::Object(
                to_document(&Qualification::default()).map_err(|e| invalid_data(session_id, e))?,
            ),
        );
        if let Some(channel) = channel {
            fields.insert("channel".to_string(), json!(channel));
        }
        Ok(fields)
    }

    async fn ensure_exists(
        &self,
        session_id: &SessionId,
        channel: Option<Channel>,
    ) -> Result<(), Report<SessionError>> {
        let fields = Self::initial_fields(session_id, channel, Utc::now())?;
        self.store
            .set_defaults(collections::SESSIONS, session_id.as_str(), fields)
            .await
            .map_err(|e| storage_failed(session_id, e))?;
        Ok(())
    }

    /// Idempotently creates a session, merging `metadata` field by field.
    ///
    /// Status, turns, qualification, start time and channel are only
    /// initialised when absent, so a second call never clears history and
    /// never reactivates a completed session.
    #[instrument(skip(self, metadata), fields(session_id = %session_id))]
    pub async fn create_or_merge_session(
        &self,
        session_id: &SessionId,
        channel: Channel,
        metadata: Document,
    ) -> Result<(), Report<SessionError>> {
        let partial = object(json!({
            "metadata": metadata,
            "updated_at": Utc::now(),
        }));
        self.store
            .set_merge(collections::SESSIONS, session_id.as_str(), partial)
            .await
            .map_err(|e| storage_failed(session_id, e))?;

        self.ensure_exists(session_id, Some(channel)).await?;
        debug!("session created or merged");
        Ok(())
    }

    async fn append_turns(
        &self,
        session_id: &SessionId,
        turns: &[Turn],
    ) -> Result<(), Report<SessionError>> {
        self.ensure_exists(session_id, None).await?;

        let elements = turns
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SessionError::InvalidData {
                session_id: session_id.clone(),
                reason: e.to_string(),
            })?;

        self.store
            .append_many(collections::SESSIONS, session_id.as_str(), "turns", elements)
            .await
            .map_err(|e| storage_failed(session_id, e))?;

        Ok(())
    }

    /// Appends one turn to the session's history.
    ///
    /// The append is a single atomic store operation; a missing session is
    /// created first.
    #[instrument(skip(self, content), fields(session_id = %session_id, role = ?role))]
    pub async fn append_turn(
        &self,
        session_id: &SessionId,
        role: TurnRole,
        content: &str,
    ) -> Result<Turn, Report<SessionError>> {
        let turn = Turn::new(role, content);
        self.append_turns(session_id, std::slice::from_ref(&turn))
            .await?;
        Ok(turn)
    }

    /// Appends a user turn and the reply to it as one atomic append, so
    /// history never holds one without the other.
    #[instrument(skip(self, user, assistant), fields(session_id = %session_id))]
    pub async fn append_exchange(
        &self,
        session_id: &SessionId,
        user: &str,
        assistant: &str,
    ) -> Result<(Turn, Turn), Report<SessionError>> {
        let exchange = [
            Turn::new(TurnRole::User, user),
            Turn::new(TurnRole::Assistant, assistant),
        ];
        self.append_turns(session_id, &exchange).await?;
        let [user, assistant] = exchange;
        Ok((user, assistant))
    }

    /// Returns the session's turns in order. A missing session has none.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn get_turns(&self, session_id: &SessionId) -> Result<Vec<Turn>, Report<SessionError>> {
        Ok(self
            .get_session(session_id)
            .await?
            .map(|session| session.turns)
            .unwrap_or_default())
    }

    /// Reads a whole session.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn get_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Session>, Report<SessionError>> {
        let Some(document) = self
            .store
            .get(collections::SESSIONS, session_id.as_str())
            .await
            .map_err(|e| storage_failed(session_id, e))?
        else {
            return Ok(None);
        };

        let record: SessionRecord =
            from_document(document).map_err(|e| invalid_data(session_id, e))?;

        Ok(Some(Session {
            session_id: session_id.clone(),
            status: record.status,
            channel: record.channel,
            start_time: record.start_time,
            end_time: record.end_time,
            turns: record.turns,
            qualification: record.qualification,
            metadata: record.metadata,
        }))
    }

    /// Applies a field-level qualification patch.
    ///
    /// Returns false without writing when the patch has no non-empty field.
    #[instrument(skip(self, patch), fields(session_id = %session_id))]
    pub async fn update_qualification(
        &self,
        session_id: &SessionId,
        patch: &QualificationPatch,
    ) -> Result<bool, Report<SessionError>> {
        let fields = patch.fields();
        if fields.is_empty() {
            debug!("empty qualification patch, nothing to write");
            return Ok(false);
        }

        let qualification: Document = fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), JsonValue::String(value.to_string())))
            .collect();
        let partial = object(json!({
            "qualification": qualification,
            "updated_at": Utc::now(),
        }));

        self.ensure_exists(session_id, None).await?;
        self.store
            .set_merge(collections::SESSIONS, session_id.as_str(), partial)
            .await
            .map_err(|e| storage_failed(session_id, e))?;

        Ok(true)
    }

    /// Marks the session completed and stamps its end time.
    ///
    /// Only the first call has an effect; later calls return false and
    /// leave `end_time` untouched. A missing session is created first.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn finalize(&self, session_id: &SessionId) -> Result<bool, Report<SessionError>> {
        self.ensure_exists(session_id, None).await?;

        let now = Utc::now();
        let partial = object(json!({
            "status": SessionStatus::Completed.as_str(),
            "end_time": now,
            "updated_at": now,
        }));
        let applied = self
            .store
            .merge_unless(
                collections::SESSIONS,
                session_id.as_str(),
                "status",
                &json!(SessionStatus::Completed.as_str()),
                partial,
            )
            .await
            .map_err(|e| storage_failed(session_id, e))?;

        if applied {
            info!("session finalized");
        } else {
            debug!("session already finalized");
        }
        Ok(applied)
    }
}
