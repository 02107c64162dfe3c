//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//! Nested keys use `__`, e.g. `WHATSAPP__ACCESS_TOKEN` or
//! `AGENT__MAX_TOOL_ROUNDS`.

use sales_agent_ai::GeminiConfig;
use sales_agent_conversation::SessionKeyPolicy;
use sales_agent_messaging::WhatsAppConfig;
use sales_agent_orchestrator::TurnConfig;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL connection URL. Without one, documents live in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Pool size for the PostgreSQL store.
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// WhatsApp Business API configuration.
    pub whatsapp: WhatsAppConfig,

    /// Gemini configuration.
    pub gemini: GeminiConfig,

    /// Conversation behaviour.
    #[serde(default)]
    pub agent: AgentConfig,
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Conversation behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Deadline for one generation call, in seconds.
    #[serde(default = "default_generation_timeout_seconds")]
    pub generation_timeout_seconds: u64,

    /// Deadline for one tool handler call, in seconds.
    #[serde(default = "default_tool_timeout_seconds")]
    pub tool_timeout_seconds: u64,

    /// Deadline for one store operation, in seconds.
    #[serde(default = "default_store_timeout_seconds")]
    pub store_timeout_seconds: u64,

    /// Tool calls allowed per user message.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// How WhatsApp contacts map to sessions.
    #[serde(default)]
    pub session_key_policy: SessionKeyPolicy,

    /// Whether turns ask for search grounding.
    ///
    /// Gemini ignores this for agent turns: they always carry function
    /// tools, and grounding is only sent on tool-less requests.
    #[serde(default = "default_use_grounding")]
    pub use_grounding: bool,
}

fn default_generation_timeout_seconds() -> u64 {
    30
}

fn default_tool_timeout_seconds() -> u64 {
    10
}

fn default_store_timeout_seconds() -> u64 {
    5
}

fn default_max_tool_rounds() -> usize {
    3
}

fn default_use_grounding() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            generation_timeout_seconds: default_generation_timeout_seconds(),
            tool_timeout_seconds: default_tool_timeout_seconds(),
            store_timeout_seconds: default_store_timeout_seconds(),
            max_tool_rounds: default_max_tool_rounds(),
            session_key_policy: SessionKeyPolicy::default(),
            use_grounding: default_use_grounding(),
        }
    }
}

impl AgentConfig {
    /// Turn controller settings.
    #[must_use]
    pub fn turn_config(&self) -> TurnConfig {
        TurnConfig {
            generation_timeout: Duration::from_secs(self.generation_timeout_seconds),
            max_tool_rounds: self.max_tool_rounds,
            use_grounding: self.use_grounding,
        }
    }

    #[must_use]
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_seconds)
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
