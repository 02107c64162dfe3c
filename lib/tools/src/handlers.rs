//! Tool handlers.
//!
//! Each handler binds its parameters, performs one logical read or write,
//! and returns its success payload. Failures are reported as
//! [`ToolError`]; turning them into envelopes is the dispatcher's job.

use crate::catalog::{self, BrochureType};
use crate::error::ToolError;
use crate::params::{
    CheckAvailabilityParams, CreateLeadParams, GetPricingParams, ScheduleCallbackParams,
    SearchInventoryParams, SendBrochureParams, UpdateBantParams, bind,
};
use crate::records::{
    AGENT_SOURCE, BrochureSendRequest, CallbackRequest, InventoryRecord, Lead, LeadStatus,
};
use crate::scoring::bant_score;
use chrono::Utc;
use rootcause::prelude::Report;
use sales_agent_conversation::{QualificationPatch, SessionManager};
use sales_agent_core::{BrochureRequestId, CallbackId, LeadId, SessionId};
use sales_agent_store::{
    DocumentStore, FieldFilter, StoreError, collections, from_document, to_document,
};
use serde_json::{Map, Value as JsonValue, json};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum inventory documents fetched per search.
pub const SEARCH_LIMIT: usize = 10;

const UNKNOWN: &str = "Unknown";

type ToolOutput = Result<JsonValue, Report<ToolError>>;

fn storage_failed(tool: &str, e: Report<StoreError>) -> ToolError {
    ToolError::StorageFailed {
        tool: tool.to_string(),
        reason: e.current_context().to_string(),
    }
}

/// Parses a generated store key into a typed id.
fn typed_id<I: FromStr>(tool: &str, key: &str) -> Result<I, ToolError>
where
    I::Err: std::fmt::Display,
{
    I::from_str(key).map_err(|e| ToolError::StorageFailed {
        tool: tool.to_string(),
        reason: format!("store returned an unexpected key '{key}': {e}"),
    })
}

fn title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The sales tool handlers, sharing one store.
#[derive(Clone)]
pub struct SalesTools {
    store: Arc<dyn DocumentStore>,
    sessions: SessionManager,
}

impl SalesTools {
    /// Creates handlers over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let sessions = SessionManager::new(store.clone());
        Self { store, sessions }
    }

    async fn insert<T: serde::Serialize>(
        &self,
        tool: &str,
        collection: &str,
        record: &T,
    ) -> Result<String, Report<ToolError>> {
        let document = to_document(record).map_err(|e| storage_failed(tool, e))?;
        let key = self
            .store
            .insert(collection, document)
            .await
            .map_err(|e| storage_failed(tool, e))?;
        Ok(key)
    }

    /// Records a callback request.
    pub async fn schedule_callback(&self, parameters: Map<String, JsonValue>) -> ToolOutput {
        const TOOL: &str = "schedule_callback";
        let p: ScheduleCallbackParams = bind(TOOL, parameters)?;

        let request = CallbackRequest {
            phone_number: p.phone_number,
            preferred_date: p.preferred_date,
            preferred_time: p.preferred_time,
            notes: p.notes.unwrap_or_default(),
            status: "scheduled".to_string(),
            created_at: Utc::now(),
            created_by: AGENT_SOURCE.to_string(),
        };
        let key = self.insert(TOOL, collections::CALLBACKS, &request).await?;
        let callback_id: CallbackId = typed_id(TOOL, &key)?;
        info!(%callback_id, "callback scheduled");

        Ok(json!({
            "callback_id": callback_id.to_string(),
            "message": format!(
                "Callback scheduled for {} at {}",
                request.preferred_date, request.preferred_time
            ),
        }))
    }

    /// Searches inventory.
    ///
    /// Category and location are exact-match filters applied by the store,
    /// which returns at most [`SEARCH_LIMIT`] documents; the query is then
    /// matched case-insensitively against name and description.
    pub async fn search_inventory(&self, parameters: Map<String, JsonValue>) -> ToolOutput {
        const TOOL: &str = "search_inventory";
        let p: SearchInventoryParams = bind(TOOL, parameters)?;

        let filters: Vec<FieldFilter> = [("category", p.category), ("location", p.location)]
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| FieldFilter::eq(field, v)))
            .collect();

        let documents = self
            .store
            .query(collections::INVENTORY, &filters, SEARCH_LIMIT)
            .await
            .map_err(|e| storage_failed(TOOL, e))?;

        let needle = p.query.to_lowercase();
        let mut results = Vec::new();
        for stored in documents {
            let record: InventoryRecord =
                from_document(stored.document).map_err(|e| storage_failed(TOOL, e))?;
            if record.matches(&needle) {
                results.push(record.into_item(stored.key));
            }
        }
        debug!(count = results.len(), "inventory searched");

        Ok(json!({
            "count": results.len(),
            "results": results,
        }))
    }

    /// Scores and records a lead.
    pub async fn create_lead(&self, parameters: Map<String, JsonValue>) -> ToolOutput {
        const TOOL: &str = "create_lead";
        let p: CreateLeadParams = bind(TOOL, parameters)?;

        let score = bant_score(p.budget.as_deref(), p.timeline.as_deref());
        let known_or_unknown =
            |value: Option<String>| value.filter(|v| !v.is_empty()).unwrap_or_else(|| UNKNOWN.to_string());

        let lead = Lead {
            customer_name: p.customer_name,
            phone_number: p.phone_number,
            email: p.email.unwrap_or_default(),
            interest: p.interest.unwrap_or_default(),
            budget: known_or_unknown(p.budget),
            timeline: known_or_unknown(p.timeline),
            notes: p.notes.unwrap_or_default(),
            status: LeadStatus::New,
            source: AGENT_SOURCE.to_string(),
            created_at: Utc::now(),
            bant_score: score,
        };
        let key = self.insert(TOOL, collections::LEADS, &lead).await?;
        let lead_id: LeadId = typed_id(TOOL, &key)?;
        info!(%lead_id, bant_score = score, "lead created");

        Ok(json!({
            "lead_id": lead_id.to_string(),
            "message": format!("Lead created successfully for {}", lead.customer_name),
        }))
    }

    /// Queues a brochure for sending.
    pub async fn send_brochure(&self, parameters: Map<String, JsonValue>) -> ToolOutput {
        const TOOL: &str = "send_brochure";
        let p: SendBrochureParams = bind(TOOL, parameters)?;

        let brochure = BrochureType::resolve(p.brochure_type.as_deref());
        let request = BrochureSendRequest {
            phone_number: p.phone_number,
            brochure_type: brochure.as_str().to_string(),
            brochure_url: brochure.url(),
            status: "pending".to_string(),
            created_at: Utc::now(),
        };
        let key = self.insert(TOOL, collections::BROCHURE_QUEUE, &request).await?;
        let request_id: BrochureRequestId = typed_id(TOOL, &key)?;
        info!(%request_id, brochure = brochure.as_str(), "brochure queued");

        Ok(json!({
            "message": format!(
                "{} brochure will be sent to {}",
                brochure.title(),
                request.phone_number
            ),
        }))
    }

    /// Applies a qualification patch to a session.
    pub async fn update_bant(&self, parameters: Map<String, JsonValue>) -> ToolOutput {
        const TOOL: &str = "update_bant";
        let p: UpdateBantParams = bind(TOOL, parameters)?;

        let session_id = SessionId::new(p.session_id);
        let patch = QualificationPatch {
            budget: p.budget,
            authority: p.authority,
            need: p.need,
            timing: p.timing,
        };
        self.sessions
            .update_qualification(&session_id, &patch)
            .await
            .map_err(|e| ToolError::StorageFailed {
                tool: TOOL.to_string(),
                reason: e.current_context().to_string(),
            })?;

        Ok(json!({ "message": "BANT qualification updated" }))
    }

    /// Looks up a price from the static price list.
    pub async fn get_pricing(&self, parameters: Map<String, JsonValue>) -> ToolOutput {
        let p: GetPricingParams = bind("get_pricing", parameters)?;
        let quote = catalog::quote(&p.service_type, p.plan.as_deref());
        Ok(json!(quote))
    }

    /// Reports availability. Every service is currently available everywhere.
    pub async fn check_availability(&self, parameters: Map<String, JsonValue>) -> ToolOutput {
        let p: CheckAvailabilityParams = bind("check_availability", parameters)?;

        let mut message = format!("{} is available in {}", title_case(&p.service_type), p.location);
        if let Some(when) = p.datetime_requested.filter(|w| !w.is_empty()) {
            message.push_str(&format!(" at {when}"));
        }

        Ok(json!({
            "available": true,
            "message": message,
            "location": p.location,
            "service": p.service_type,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_agent_store::MemoryStore;

    fn params(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    fn tools() -> (Arc<MemoryStore>, SalesTools) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SalesTools::new(store))
    }

    #[tokio::test]
    async fn schedule_callback_records_request() {
        let (store, tools) = tools();
        let out = tools
            .schedule_callback(params(json!({
                "phone_number": "250788123456",
                "preferred_date": "2026-02-01",
                "preferred_time": "10:00"
            })))
            .await
            .unwrap();

        assert_eq!(out["message"], "Callback scheduled for 2026-02-01 at 10:00");
        assert!(out["callback_id"].as_str().unwrap().starts_with("cb_"));

        let stored = store.all(collections::CALLBACKS).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].document["status"], "scheduled");
        assert_eq!(stored[0].document["created_by"], "ai_agent");
        assert_eq!(stored[0].document["notes"], "");
    }

    #[tokio::test]
    async fn create_lead_applies_defaults_and_score() {
        let (store, tools) = tools();
        let out = tools
            .create_lead(params(json!({
                "customer_name": "Aline",
                "phone_number": "250788000002",
                "budget": "maybe"
            })))
            .await
            .unwrap();
        assert_eq!(out["message"], "Lead created successfully for Aline");
        assert!(out["lead_id"].as_str().unwrap().starts_with("lead_"));

        let lead: Lead = from_document(store.all(collections::LEADS).await[0].document.clone()).unwrap();
        assert_eq!(lead.bant_score, 45);
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.source, "ai_agent");
        assert_eq!(lead.timeline, "Unknown");
        assert_eq!(lead.email, "");
    }

    #[tokio::test]
    async fn send_brochure_falls_back_to_general() {
        let (store, tools) = tools();
        let out = tools
            .send_brochure(params(json!({
                "phone_number": "250788000003",
                "brochure_type": "unknown_type"
            })))
            .await
            .unwrap();
        assert_eq!(out["message"], "General brochure will be sent to 250788000003");

        let queued = &store.all(collections::BROCHURE_QUEUE).await[0].document;
        assert_eq!(queued["brochure_url"], "https://easymo.rw/brochures/general.pdf");
        assert_eq!(queued["status"], "pending");
    }

    #[tokio::test]
    async fn search_filters_then_matches() {
        let (store, tools) = tools();
        let items = [
            json!({"name": "Moto Insurance", "description": "Third party cover", "category": "insurance", "price": 5000}),
            json!({"name": "Car Insurance", "description": "Comprehensive", "category": "insurance", "location": "Kigali", "availability": "Limited"}),
            json!({"name": "Moto taxi", "description": "Ride", "category": "transport"}),
        ];
        for item in items {
            store.insert(collections::INVENTORY, params(item)).await.unwrap();
        }

        let out = tools
            .search_inventory(params(json!({"query": "INSURANCE", "category": "insurance"})))
            .await
            .unwrap();
        assert_eq!(out["count"], 2);
        assert_eq!(out["results"][0]["availability"], "In Stock");
        assert_eq!(out["results"][1]["availability"], "Limited");

        let out = tools
            .search_inventory(params(json!({"query": "moto", "location": "Kigali"})))
            .await
            .unwrap();
        assert_eq!(out["count"], 0);
        assert_eq!(out["results"], json!([]));
    }

    #[tokio::test]
    async fn update_bant_merges_into_session() {
        let (_store, tools) = tools();
        tools
            .update_bant(params(json!({"session_id": "s1", "budget": "high", "need": ""})))
            .await
            .unwrap();

        let session = tools
            .sessions
            .get_session(&SessionId::new("s1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.qualification.budget, "high");
        assert_eq!(session.qualification.need, "Unknown");
    }

    #[tokio::test]
    async fn pricing_and_availability_are_static() {
        let (store, tools) = tools();
        let out = tools
            .get_pricing(params(json!({"service_type": "insurance", "plan": "nonexistent_plan"})))
            .await
            .unwrap();
        assert_eq!(out["price"], "Contact sales");
        assert_eq!(out["all_plans"].as_object().unwrap().len(), 3);

        let out = tools
            .check_availability(params(json!({
                "service_type": "transport",
                "location": "Huye",
                "datetime_requested": "2026-02-01 09:00"
            })))
            .await
            .unwrap();
        assert_eq!(out["available"], true);
        assert_eq!(out["message"], "Transport is available in Huye at 2026-02-01 09:00");

        assert_eq!(store.count(collections::LEADS).await, 0);
    }

    #[test]
    fn title_case_lowers_the_tail() {
        assert_eq!(title_case("iNSURANCE"), "Insurance");
        assert_eq!(title_case(""), "");
    }
}
