//! Google Gemini backend over the `generateContent` REST API.

use crate::backend::{Generation, GenerationBackend, GenerationRequest};
use crate::error::LlmError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use sales_agent_conversation::{ToolCall, TurnRole};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const PROVIDER: &str = "gemini";

/// Gemini connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,
    /// Model for ordinary turns.
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used when a request asks for thinking.
    #[serde(default = "default_thinking_model")]
    pub thinking_model: String,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_thinking_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    60
}

impl GeminiConfig {
    /// Creates a configuration with default models and endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_model(),
            thinking_model: default_thinking_model(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: Option<String>,
    #[serde(default)]
    args: JsonValue,
}

/// Gemini generation backend.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Creates a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, Report<LlmError>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| LlmError::ProviderUnavailable {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    fn model_for(&self, request: &GenerationRequest) -> &str {
        if request.options.use_thinking {
            &self.config.thinking_model
        } else {
            &self.config.model
        }
    }

    /// Builds the `generateContent` request body.
    fn request_body(request: &GenerationRequest) -> JsonValue {
        let mut contents: Vec<JsonValue> = request
            .history
            .iter()
            .map(|message| {
                let role = match message.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "model",
                };
                json!({"role": role, "parts": [{"text": message.content}]})
            })
            .collect();

        contents.push(json!({"role": "user", "parts": [{"text": request.user_message}]}));

        for exchange in &request.tool_exchanges {
            contents.push(json!({
                "role": "model",
                "parts": [{"functionCall": {
                    "name": exchange.call.name,
                    "args": exchange.call.parameters,
                }}],
            }));
            contents.push(json!({
                "role": "user",
                "parts": [{"functionResponse": {
                    "name": exchange.call.name,
                    "response": exchange.result.to_json(),
                }}],
            }));
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.95,
                "topK": 40,
                "maxOutputTokens": 2048,
            },
        });

        if !request.system_instruction.is_empty() {
            body["systemInstruction"] = json!({"parts": [{"text": request.system_instruction}]});
        }

        // The API rejects search grounding combined with function declarations.
        if !request.tools.is_empty() {
            let declarations: Vec<JsonValue> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema(),
                    })
                })
                .collect();
            body["tools"] = json!([{"functionDeclarations": declarations}]);
        } else if request.options.use_grounding {
            body["tools"] = json!([{"googleSearch": {}}]);
        }

        body
    }

    fn parse_response(response: GenerateContentResponse) -> Result<Generation, LlmError> {
        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        let mut text = String::new();
        for part in parts {
            if let Some(call) = part.function_call {
                let name = call.name.filter(|n| !n.is_empty()).ok_or_else(|| {
                    LlmError::MalformedToolCall {
                        reason: "function call without a name".to_string(),
                    }
                })?;
                let parameters = match call.args {
                    JsonValue::Object(map) => map,
                    JsonValue::Null => serde_json::Map::new(),
                    other => {
                        return Err(LlmError::MalformedToolCall {
                            reason: format!("arguments for '{name}' are not an object: {other}"),
                        });
                    }
                };
                return Ok(Generation::ToolCall(ToolCall::new(name, parameters)));
            }
            if let Some(chunk) = part.text {
                text.push_str(&chunk);
            }
        }

        let text = text.trim();
        if text.is_empty() {
            Err(LlmError::EmptyResponse)
        } else {
            Ok(Generation::Text(text.to_string()))
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    #[instrument(skip(self, request), fields(model = self.model_for(request), tools = request.tools.len()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, Report<LlmError>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.model_for(request)
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::ProviderUnavailable {
                        provider: PROVIDER.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Gemini returned an error status");

            return Err(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                LlmError::RateLimited { retry_after_secs }
            } else if status.is_server_error() {
                LlmError::ProviderUnavailable {
                    provider: PROVIDER.to_string(),
                    reason: format!("status {status}"),
                }
            } else {
                LlmError::RequestFailed {
                    reason: format!("status {status}: {body}"),
                }
            }
            .into());
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        let generation = Self::parse_response(parsed)?;
        debug!(
            tool_call = matches!(generation, Generation::ToolCall(_)),
            "Gemini generation complete"
        );
        Ok(generation)
    }

    fn provider(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatMessage, GenerationOptions};
    use sales_agent_conversation::{ToolDefinition, ToolResult};
    use serde_json::Map;

    fn parse(value: JsonValue) -> Result<Generation, LlmError> {
        GeminiBackend::parse_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn config_defaults() {
        let config: GeminiConfig = serde_json::from_value(json!({"api_key": "k"})).unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.thinking_model, "gemini-2.5-pro");
        assert_eq!(config.request_timeout_seconds, 60);
    }

    #[test]
    fn body_maps_roles_and_exchanges() {
        let mut request = GenerationRequest::new("budget is high")
            .with_system("persona")
            .with_history(vec![ChatMessage::user("Muraho"), ChatMessage::assistant("Muraho!")]);
        request.push_exchange(
            ToolCall::new("get_pricing", Map::new()),
            ToolResult::success(json!({"price": "RWF 10,000/month"})),
        );

        let body = GeminiBackend::request_body(&request);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 5);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "budget is high");
        assert_eq!(contents[3]["parts"][0]["functionCall"]["name"], "get_pricing");
        assert_eq!(
            contents[4]["parts"][0]["functionResponse"]["response"]["success"],
            true
        );
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "persona");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn grounding_only_without_function_tools() {
        let options = GenerationOptions {
            use_grounding: true,
            use_thinking: false,
        };
        let plain = GenerationRequest::new("hi").with_options(options);
        assert!(GeminiBackend::request_body(&plain)["tools"][0].get("googleSearch").is_some());

        let with_tools = plain.with_tools(vec![ToolDefinition::new("get_pricing", "prices")]);
        let body = GeminiBackend::request_body(&with_tools);
        assert!(body["tools"][0].get("googleSearch").is_none());
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "get_pricing");
    }

    #[test]
    fn parses_text() {
        let generation = parse(json!({
            "candidates": [{"content": {"parts": [{"text": "Muraho! "}, {"text": "Nagufasha iki?"}]}}]
        }))
        .unwrap();
        assert_eq!(generation, Generation::Text("Muraho! Nagufasha iki?".to_string()));
    }

    #[test]
    fn parses_function_call() {
        let generation = parse(json!({
            "candidates": [{"content": {"parts": [{"functionCall": {
                "name": "create_lead",
                "args": {"customer_name": "Aline", "phone_number": "0788"}
            }}]}}]
        }))
        .unwrap();
        match generation {
            Generation::ToolCall(call) => {
                assert_eq!(call.name, "create_lead");
                assert_eq!(call.parameters["customer_name"], "Aline");
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_and_empty() {
        let err = parse(json!({
            "candidates": [{"content": {"parts": [{"functionCall": {"name": "x", "args": [1]}}]}}]
        }))
        .unwrap_err();
        assert!(matches!(err, LlmError::MalformedToolCall { .. }));

        assert_eq!(parse(json!({"candidates": []})).unwrap_err(), LlmError::EmptyResponse);
    }

    #[test]
    fn thinking_selects_pro_model() {
        let backend = GeminiBackend::new(GeminiConfig::new("k")).unwrap();
        let request = GenerationRequest::new("hi").with_options(GenerationOptions {
            use_grounding: false,
            use_thinking: true,
        });
        assert_eq!(backend.model_for(&request), "gemini-2.5-pro");
    }
}
