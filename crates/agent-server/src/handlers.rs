//! HTTP Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use agent_core::{ReplyStatus, Termination};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ApiChatResponse {
    pub response: String,
    pub status: ReplyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub agent_ready: bool,
    pub gateway_connected: bool,
    pub store_connected: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gateway_connected = match &state.provider {
        Some(provider) => provider.health_check().await.unwrap_or(false),
        None => false,
    };
    let store_connected = state.store.health_check().await;
    let agent_ready = state.service.is_ready();

    Json(HealthResponse {
        status: if agent_ready && gateway_connected && store_connected {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        agent_ready,
        gateway_connected,
        store_connected,
    })
}

/// `POST /chat/?query=...`
pub async fn chat_query(
    State(state): State<AppState>,
    Query(request): Query<ChatRequest>,
) -> Json<ChatResponse> {
    tracing::info!(query_len = request.query.len(), "Chat request");
    let reply = state.service.answer(&request.query).await;
    Json(ChatResponse { response: reply.text })
}

/// `POST /api/chat` with a JSON body
pub async fn chat_json(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ApiChatResponse> {
    tracing::info!(query_len = request.query.len(), "Chat request");
    let reply = state.service.answer(&request.query).await;
    Json(ApiChatResponse {
        response: reply.text,
        status: reply.status,
        termination: reply.termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use agent_core::provider::{Completion, GenerationOptions, ProviderInfo};
    use agent_core::{AgentError, LlmProvider, Message, Result, ToolCall, ToolSchema};
    use agreement_tools::{AgreementStore, MemoryStore};

    use crate::config::ServerConfig;

    struct Script(Mutex<VecDeque<Completion>>);

    #[async_trait]
    impl LlmProvider for Script {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "script".into(),
                endpoint: "memory".into(),
                supports_tools: true,
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> Result<Completion> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::Gateway("script exhausted".into()))
        }
    }

    fn store() -> Arc<dyn AgreementStore> {
        Arc::new(
            MemoryStore::new()
                .with_customer("A100", "Ana Ruiz", "PS-1")
                .with_consumption("A100", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), 350.5),
        )
    }

    fn ready(replies: Vec<Completion>) -> AppState {
        let provider: Arc<dyn LlmProvider> = Arc::new(Script(Mutex::new(replies.into())));
        AppState::build(&ServerConfig::default(), Ok(provider), store())
    }

    fn uninitialized() -> AppState {
        AppState::build(
            &ServerConfig::default(),
            Err(AgentError::Initialization("OPENAI_API_KEY is not set".into())),
            store(),
        )
    }

    fn ask(query: &str) -> ChatRequest {
        ChatRequest { query: query.into() }
    }

    #[tokio::test]
    async fn test_query_endpoint_relays_lookup() {
        let state = ready(vec![
            Completion::tool_use(vec![ToolCall::new("query_customer_master").with_arg("agreement_id", "ZZZ")]),
            Completion::text("No information found for agreement ZZZ."),
        ]);

        let Json(body) = chat_query(State(state), Query(ask("agreement ZZZ"))).await;
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"response": "No information found for agreement ZZZ."})
        );
    }

    #[tokio::test]
    async fn test_json_endpoint() {
        let state = ready(vec![Completion::text("Hello! Ask me about an agreement.")]);

        let Json(body) = chat_json(State(state), Json(ask("hi"))).await;
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response"], "Hello! Ask me about an agreement.");
        assert_eq!(value["status"], "answered");
        assert_eq!(value["termination"], "finalized");
    }

    #[tokio::test]
    async fn test_uninitialized_agent_answers_fixed_message() {
        let Json(body) = chat_query(State(uninitialized()), Query(ask("hola"))).await;
        assert_eq!(body.response, "Error: Agent not initialized. Check API key.");
    }

    #[tokio::test]
    async fn test_gateway_failure_is_not_leaked() {
        let state = ready(Vec::new());

        let Json(body) = chat_json(State(state), Json(ask("A100"))).await;
        assert_eq!(body.status, ReplyStatus::Failed);
        assert!(!body.response.contains("script exhausted"));
    }

    #[tokio::test]
    async fn test_health_reports_components() {
        let Json(health) = health_check(State(uninitialized())).await;
        assert_eq!(health.status, "degraded");
        assert!(!health.agent_ready);
        assert!(!health.gateway_connected);
        assert!(health.store_connected);

        let Json(health) = health_check(State(ready(Vec::new()))).await;
        assert_eq!(health.status, "healthy");
    }
}
