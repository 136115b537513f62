//! Server Configuration
//!
//! Read from the environment after `.env` is loaded. Gateway credentials
//! are read separately by `OpenAiConfig`.

use std::path::PathBuf;
use std::time::Duration;

use agent_core::{AgentConfig, Locale, RoutingPolicy};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

/// How replies without tool calls are recognized as final
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoutingMode {
    #[default]
    Structural,
    Markers,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub locale: Locale,
    pub routing: RoutingMode,
    pub model: String,
    pub temperature: f32,
    pub max_iterations: usize,
    pub gateway_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let agent = AgentConfig::default();
        Self {
            bind_addr: "0.0.0.0:8000".into(),
            db_path: PathBuf::from("datos.sqlite"),
            locale: Locale::default(),
            routing: RoutingMode::default(),
            model: agent.generation.model,
            temperature: agent.generation.temperature,
            max_iterations: agent.max_iterations,
            gateway_timeout: agent.gateway_timeout,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from a variable lookup. Unset or blank variables keep defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(path) = get("AGREEMENTS_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(tag) = get("AGENT_LOCALE") {
            config.locale = Locale::parse(&tag).ok_or_else(|| invalid("AGENT_LOCALE", &tag))?;
        }
        if let Some(mode) = get("AGENT_ROUTING") {
            config.routing = match mode.to_ascii_lowercase().as_str() {
                "structural" => RoutingMode::Structural,
                "markers" => RoutingMode::Markers,
                _ => return Err(invalid("AGENT_ROUTING", &mode)),
            };
        }
        if let Some(model) = get("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(value) = get("OPENAI_TEMPERATURE") {
            config.temperature = value.parse().map_err(|_| invalid("OPENAI_TEMPERATURE", &value))?;
        }
        if let Some(value) = get("AGENT_MAX_ITERATIONS") {
            config.max_iterations = value
                .parse::<usize>()
                .ok()
                .filter(|max| *max > 0)
                .ok_or_else(|| invalid("AGENT_MAX_ITERATIONS", &value))?;
        }
        if let Some(value) = get("GATEWAY_TIMEOUT_SECS") {
            let secs = value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid("GATEWAY_TIMEOUT_SECS", &value))?;
            config.gateway_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn routing_policy(&self) -> RoutingPolicy {
        match self.routing {
            RoutingMode::Structural => RoutingPolicy::Structural,
            RoutingMode::Markers => agreement_tools::marker_routing(self.locale),
        }
    }
}

fn invalid(var: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}
