//! Application State

use std::sync::Arc;

use agent_core::{AgentBuilder, AgentService, LlmProvider, Result};
use agreement_tools::{AgreementStore, phrases, tool_registry};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Request front door; holds the init failure when the gateway is missing
    pub service: Arc<AgentService>,

    /// LLM provider (None if it could not be constructed)
    pub provider: Option<Arc<dyn LlmProvider>>,

    /// Agreement data the tools read
    pub store: Arc<dyn AgreementStore>,
}

impl AppState {
    /// Wire the agent once at startup. A provider error leaves the service
    /// in its initialization-failure state instead of aborting.
    pub fn build(
        config: &ServerConfig,
        provider: Result<Arc<dyn LlmProvider>>,
        store: Arc<dyn AgreementStore>,
    ) -> Self {
        let (provider, agent) = match provider {
            Ok(provider) => {
                let agent = AgentBuilder::new()
                    .provider(Arc::clone(&provider))
                    .tools(tool_registry(&store, config.locale))
                    .system_prompt(phrases::system_prompt(config.locale))
                    .model(config.model.clone())
                    .temperature(config.temperature)
                    .max_iterations(config.max_iterations)
                    .gateway_timeout(config.gateway_timeout)
                    .routing(config.routing_policy())
                    .locale(config.locale)
                    .build();
                (Some(provider), agent)
            }
            Err(err) => (None, Err(err)),
        };

        if let Ok(agent) = &agent {
            tracing::info!(
                tools = ?agent.tools().names(),
                model = %config.model,
                locale = %config.locale,
                "Agent ready"
            );
        }

        Self {
            service: Arc::new(AgentService::from_build(agent, config.locale)),
            provider,
            store,
        }
    }
}
