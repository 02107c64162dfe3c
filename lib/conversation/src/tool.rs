//! Tool schema and result envelope.
//!
//! The registry describes the tools the generation model may call. The
//! envelope is the one shape every tool invocation returns, whatever the
//! tool: `{"success": bool, "error"?: string, ...tool-specific fields}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeMap;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
}

impl ParameterKind {
    fn as_schema_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name.
    pub name: String,
    /// JSON type.
    pub kind: ParameterKind,
    /// What the model should put here.
    pub description: String,
    /// Whether the parameter must be supplied.
    pub required: bool,
    /// Allowed values, if closed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

/// Definition of a tool available to the generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    /// Creates a new tool definition with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    fn with_parameter(
        mut self,
        name: &str,
        kind: ParameterKind,
        description: &str,
        required: bool,
    ) -> Self {
        self.parameters.push(ToolParameter {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
            allowed_values: Vec::new(),
        });
        self
    }

    /// Adds a required string parameter.
    #[must_use]
    pub fn required(self, name: &str, description: &str) -> Self {
        self.with_parameter(name, ParameterKind::String, description, true)
    }

    /// Adds an optional string parameter.
    #[must_use]
    pub fn optional(self, name: &str, description: &str) -> Self {
        self.with_parameter(name, ParameterKind::String, description, false)
    }

    /// Restricts the most recently added parameter to a closed set of values.
    #[must_use]
    pub fn one_of(mut self, values: &[&str]) -> Self {
        if let Some(last) = self.parameters.last_mut() {
            last.allowed_values = values.iter().map(|v| (*v).to_string()).collect();
        }
        self
    }

    /// Names of the required parameters.
    pub fn required_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    /// Renders the parameters as a JSON-Schema object.
    #[must_use]
    pub fn input_schema(&self) -> JsonValue {
        let properties: Map<String, JsonValue> = self
            .parameters
            .iter()
            .map(|p| {
                let mut property = json!({
                    "type": p.kind.as_schema_type(),
                    "description": p.description,
                });
                if !p.allowed_values.is_empty() {
                    property["enum"] = json!(p.allowed_values);
                }
                (p.name.clone(), property)
            })
            .collect();
        let required: Vec<&str> = self.required_parameters().collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Registry of tools, iterated in name order.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    definitions: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool definition, replacing any with the same name.
    pub fn register(&mut self, definition: ToolDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.get(name)
    }

    /// Returns all registered tool definitions.
    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.definitions.values()
    }

    /// Returns owned copies of every definition.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.values().cloned().collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Converts definitions to function declarations for LLM APIs.
    #[must_use]
    pub fn to_llm_format(&self) -> Vec<JsonValue> {
        self.definitions
            .values()
            .map(|def| {
                json!({
                    "name": def.name,
                    "description": def.description,
                    "parameters": def.input_schema(),
                })
            })
            .collect()
    }
}

/// Result envelope of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the invocation succeeded.
    pub success: bool,
    /// Failure description (if failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tool-specific fields, flattened next to `success`.
    #[serde(flatten)]
    pub data: Map<String, JsonValue>,
}

impl ToolResult {
    /// Creates a successful result carrying the fields of `data`.
    ///
    /// Non-object payloads are stored under `result`.
    #[must_use]
    pub fn success(data: JsonValue) -> Self {
        let data = match data {
            JsonValue::Object(map) => map,
            JsonValue::Null => Map::new(),
            other => Map::from_iter([("result".to_string(), other)]),
        };
        Self {
            success: true,
            error: None,
            data,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: Map::new(),
        }
    }

    /// Adds a tool-specific field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.data.insert(name.into(), value);
        self
    }

    /// Returns the `message` field, if the tool produced one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(JsonValue::as_str)
    }

    /// Renders the envelope as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert("success".to_string(), JsonValue::Bool(self.success));
        if let Some(error) = &self.error {
            object.insert("error".to_string(), JsonValue::String(error.clone()));
        }
        for (name, value) in &self.data {
            object.insert(name.clone(), value.clone());
        }
        JsonValue::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition_builder() {
        let tool = ToolDefinition::new("send_brochure", "Queue a brochure")
            .required("phone_number", "Customer phone number")
            .optional("brochure_type", "Which brochure")
            .one_of(&["general", "insurance"]);

        assert_eq!(tool.name, "send_brochure");
        assert_eq!(tool.required_parameters().collect::<Vec<_>>(), vec!["phone_number"]);

        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["phone_number"]));
        assert_eq!(
            schema["properties"]["brochure_type"]["enum"],
            json!(["general", "insurance"])
        );
    }

    #[test]
    fn registry_iterates_in_name_order() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDefinition::new("update_bant", "b"));
        registry.register(ToolDefinition::new("create_lead", "a"));

        let names: Vec<_> = registry.all().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["create_lead", "update_bant"]);
        assert_eq!(registry.to_llm_format()[0]["name"], "create_lead");
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn success_envelope_flattens_fields() {
        let result = ToolResult::success(json!({"lead_id": "lead_1", "message": "ok"}));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "lead_id": "lead_1", "message": "ok"})
        );
        assert_eq!(result.message(), Some("ok"));
    }

    #[test]
    fn failure_envelope_shape() {
        let result = ToolResult::failure("Unknown tool: fly").with_field("results", json!([]));
        assert_eq!(
            result.to_json(),
            json!({"success": false, "error": "Unknown tool: fly", "results": []})
        );
        assert_eq!(serde_json::to_value(&result).unwrap(), result.to_json());
    }
}
