//! Tool dispatch.
//!
//! The dispatcher is the failure-containment boundary for side effects:
//! whatever a handler does, `dispatch` returns a [`ToolResult`] envelope and
//! never an error, so a conversational turn can always produce a reply.

use crate::error::ToolError;
use crate::handlers::SalesTools;
use crate::redact;
use rootcause::prelude::Report;
use sales_agent_conversation::{ToolCall, ToolResult};
use sales_agent_store::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Default bound on a single handler call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// The closed set of dispatchable tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ScheduleCallback,
    SearchInventory,
    CreateLead,
    SendBrochure,
    UpdateBant,
    GetPricing,
    CheckAvailability,
}

impl ToolName {
    /// Every tool, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::ScheduleCallback,
        Self::SearchInventory,
        Self::CreateLead,
        Self::SendBrochure,
        Self::UpdateBant,
        Self::GetPricing,
        Self::CheckAvailability,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleCallback => "schedule_callback",
            Self::SearchInventory => "search_inventory",
            Self::CreateLead => "create_lead",
            Self::SendBrochure => "send_brochure",
            Self::UpdateBant => "update_bant",
            Self::GetPricing => "get_pricing",
            Self::CheckAvailability => "check_availability",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool {
                name: s.to_string(),
            })
    }
}

/// Record of one dispatched tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchedTool {
    /// The call as requested by the model.
    pub call: ToolCall,
    /// The envelope returned.
    pub result: ToolResult,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

impl DispatchedTool {
    /// Returns whether the tool succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.success
    }
}

/// Routes tool calls by name to the sales tool handlers.
#[derive(Clone)]
pub struct ToolDispatcher {
    tools: SalesTools,
    timeout: Duration,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            tools: SalesTools::new(store),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Sets the bound on each handler call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn invoke(
        &self,
        tool: ToolName,
        parameters: Map<String, JsonValue>,
    ) -> Result<JsonValue, Report<ToolError>> {
        match tool {
            ToolName::ScheduleCallback => self.tools.schedule_callback(parameters).await,
            ToolName::SearchInventory => self.tools.search_inventory(parameters).await,
            ToolName::CreateLead => self.tools.create_lead(parameters).await,
            ToolName::SendBrochure => self.tools.send_brochure(parameters).await,
            ToolName::UpdateBant => self.tools.update_bant(parameters).await,
            ToolName::GetPricing => self.tools.get_pricing(parameters).await,
            ToolName::CheckAvailability => self.tools.check_availability(parameters).await,
        }
    }

    /// Runs the named tool and returns its envelope. Never fails.
    pub async fn dispatch(&self, name: &str, parameters: Map<String, JsonValue>) -> ToolResult {
        let tool = match ToolName::from_str(name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = name, "model requested an unknown tool");
                return ToolResult::failure(e.to_string());
            }
        };

        let preview = redact::preview(&parameters);
        let outcome = match tokio::time::timeout(self.timeout, self.invoke(tool, parameters)).await
        {
            Ok(outcome) => outcome.map_err(|e| e.current_context().clone()),
            Err(_) => Err(ToolError::Timeout {
                tool: tool.as_str().to_string(),
                after: self.timeout,
            }),
        };

        match outcome {
            Ok(data) => {
                info!(tool = tool.as_str(), "tool succeeded");
                ToolResult::success(data)
            }
            Err(e) => {
                warn!(tool = tool.as_str(), params = %preview, error = %e, "tool failed");
                let result = ToolResult::failure(e.to_string());
                if tool == ToolName::SearchInventory {
                    result.with_field("results", JsonValue::Array(Vec::new()))
                } else {
                    result
                }
            }
        }
    }

    /// Dispatches a model tool call and records its latency.
    pub async fn dispatch_call(&self, call: &ToolCall) -> DispatchedTool {
        let started = Instant::now();
        let result = self.dispatch(&call.name, call.parameters.clone()).await;
        DispatchedTool {
            call: call.clone(),
            result,
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}
