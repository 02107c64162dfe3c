//! Session key derivation.
//!
//! WhatsApp contacts are keyed by phone number, optionally bucketed by
//! calendar day so each day starts a fresh session. Voice sessions reuse the
//! voice platform's session id.

use chrono::{DateTime, Utc};
use sales_agent_core::SessionId;
use serde::{Deserialize, Serialize};

/// How a messaging contact maps to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKeyPolicy {
    /// One session per contact per UTC calendar day: `wa_<phone>_<YYYYMMDD>`.
    #[default]
    #[serde(alias = "daily")]
    DailyBucket,
    /// One session for the lifetime of the contact: `wa_<phone>`.
    #[serde(alias = "lifetime")]
    ConversationLifetime,
}

/// Derives the session id for a WhatsApp contact.
#[must_use]
pub fn whatsapp_session_key(policy: SessionKeyPolicy, phone: &str, now: DateTime<Utc>) -> SessionId {
    match policy {
        SessionKeyPolicy::DailyBucket => {
            SessionId::new(format!("wa_{phone}_{}", now.format("%Y%m%d")))
        }
        SessionKeyPolicy::ConversationLifetime => SessionId::new(format!("wa_{phone}")),
    }
}

/// Derives the session id from a voice platform session path.
///
/// Paths look like `projects/p/locations/l/agents/a/sessions/<id>`; the last
/// non-empty segment is the id. Returns `None` when there is no such segment.
#[must_use]
pub fn voice_session_key(session_path: &str) -> Option<SessionId> {
    session_path
        .rsplit('/')
        .map(str::trim)
        .find(|segment| !segment.is_empty())
        .map(SessionId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_bucket_includes_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 23, 59, 0).unwrap();
        let key = whatsapp_session_key(SessionKeyPolicy::DailyBucket, "250788123456", now);
        assert_eq!(key.as_str(), "wa_250788123456_20260307");
    }

    #[test]
    fn lifetime_ignores_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        let policy = SessionKeyPolicy::ConversationLifetime;
        assert_eq!(
            whatsapp_session_key(policy, "250788123456", now),
            whatsapp_session_key(policy, "250788123456", later)
        );
    }

    #[test]
    fn voice_key_is_last_path_segment() {
        let key = voice_session_key("projects/p/locations/global/agents/a/sessions/abc-123");
        assert_eq!(key.unwrap().as_str(), "abc-123");
        assert_eq!(voice_session_key("plain").unwrap().as_str(), "plain");
    }

    #[test]
    fn voice_key_requires_a_segment() {
        assert_eq!(voice_session_key(""), None);
        assert_eq!(voice_session_key("/ /"), None);
    }

    #[test]
    fn policy_accepts_short_names() {
        let policy: SessionKeyPolicy = serde_json::from_str("\"lifetime\"").unwrap();
        assert_eq!(policy, SessionKeyPolicy::ConversationLifetime);
        let policy: SessionKeyPolicy = serde_json::from_str("\"daily\"").unwrap();
        assert_eq!(policy, SessionKeyPolicy::DailyBucket);
    }
}
