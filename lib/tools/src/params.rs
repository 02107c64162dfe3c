//! Typed tool parameters.
//!
//! Models do not always respect declared parameter types, so string
//! parameters also accept numbers and booleans, rendered as text. A `null`
//! optional parameter counts as absent.

use crate::error::ToolError;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

fn coerce(value: JsonValue) -> Result<String, String> {
    match value {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, got {other}")),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    coerce(JsonValue::deserialize(deserializer)?).map_err(D::Error::custom)
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => coerce(value).map(Some).map_err(D::Error::custom),
    }
}

/// Binds raw parameters to a tool's parameter type.
///
/// # Errors
///
/// Returns `ToolError::InvalidParameters` naming the offending field.
pub fn bind<P: DeserializeOwned>(tool: &str, parameters: Map<String, JsonValue>) -> Result<P, ToolError> {
    serde_json::from_value(JsonValue::Object(parameters)).map_err(|e| ToolError::InvalidParameters {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleCallbackParams {
    #[serde(deserialize_with = "lenient_string")]
    pub phone_number: String,
    #[serde(deserialize_with = "lenient_string")]
    pub preferred_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub preferred_time: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchInventoryParams {
    #[serde(deserialize_with = "lenient_string")]
    pub query: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeadParams {
    #[serde(deserialize_with = "lenient_string")]
    pub customer_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub interest: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub budget: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub timeline: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendBrochureParams {
    #[serde(deserialize_with = "lenient_string")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub brochure_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBantParams {
    #[serde(deserialize_with = "lenient_string")]
    pub session_id: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub budget: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub authority: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub need: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub timing: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPricingParams {
    #[serde(deserialize_with = "lenient_string")]
    pub service_type: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckAvailabilityParams {
    #[serde(deserialize_with = "lenient_string")]
    pub service_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub datetime_requested: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn numbers_coerce_to_strings() {
        let p: ScheduleCallbackParams = bind(
            "schedule_callback",
            params(json!({
                "phone_number": 250788123456u64,
                "preferred_date": "2026-01-02",
                "preferred_time": "14:00"
            })),
        )
        .unwrap();
        assert_eq!(p.phone_number, "250788123456");
        assert!(p.notes.is_none());
    }

    #[test]
    fn null_optional_is_absent() {
        let p: CreateLeadParams = bind(
            "create_lead",
            params(json!({"customer_name": "Aline", "phone_number": "0788", "budget": null})),
        )
        .unwrap();
        assert!(p.budget.is_none());
    }

    #[test]
    fn missing_required_names_the_field() {
        let err = bind::<CreateLeadParams>("create_lead", params(json!({"customer_name": "Aline"})))
            .unwrap_err();
        assert!(err.to_string().contains("phone_number"), "{err}");
        assert!(err.to_string().contains("create_lead"));
    }

    #[test]
    fn objects_are_rejected_for_strings() {
        let err = bind::<GetPricingParams>("get_pricing", params(json!({"service_type": {"a": 1}})))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters { .. }));
    }
}
