//! Records written and read by the tool handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Who created a record on the agent's behalf.
pub const AGENT_SOURCE: &str = "ai_agent";

/// Lifecycle status of a lead. Only `New` is set here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
}

/// A sales-qualified contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub customer_name: String,
    pub phone_number: String,
    pub email: String,
    pub interest: String,
    pub budget: String,
    pub timeline: String,
    pub notes: String,
    pub status: LeadStatus,
    pub source: String,
    pub created_at: DateTime<Utc>,
    /// Computed once at creation.
    pub bant_score: u8,
}

/// A scheduled follow-up call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub phone_number: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub notes: String,
    /// Always `scheduled` when created.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// A brochure waiting to be sent by the outbound sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrochureSendRequest {
    pub phone_number: String,
    pub brochure_type: String,
    pub brochure_url: String,
    /// Always `pending` when created.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// An inventory entry as returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Stored as either a number or display text.
    pub price: JsonValue,
    pub availability: String,
}

/// Stored inventory document. Missing fields take display defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct InventoryRecord {
    pub name: String,
    pub description: String,
    pub price: JsonValue,
    pub availability: Option<String>,
}

impl InventoryRecord {
    /// True if `needle` (already lower-cased) occurs in the name or description.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }

    pub fn into_item(self, id: String) -> InventoryItem {
        InventoryItem {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            availability: self.availability.unwrap_or_else(|| "In Stock".to_string()),
        }
    }
}
