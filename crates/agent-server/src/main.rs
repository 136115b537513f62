//! agreement-agent HTTP Server
//!
//! Axum front end for the agreement Q&A agent. One question per request,
//! answered through the agreement lookup tools.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::OpenAiProvider;
use agreement_tools::{AgreementStore, SqliteStore};

use crate::config::ServerConfig;
use crate::handlers::{chat_json, chat_query, health_check};
use crate::state::AppState;

/// Build the router over shared state
fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/chat/", post(chat_query))
        .route("/api/chat", post(chat_json))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    // Agreement data
    let store: Arc<dyn AgreementStore> = Arc::new(SqliteStore::new(&config.db_path));
    if store.health_check().await {
        tracing::info!(store = store.name(), "Agreement store reachable");
    } else {
        tracing::warn!(store = store.name(), "Agreement store not reachable - lookups will fail");
    }

    // LLM provider
    let provider = OpenAiProvider::from_env().map(|p| Arc::new(p) as Arc<dyn LlmProvider>);
    if let Ok(provider) = &provider {
        match provider.health_check().await {
            Ok(true) => tracing::info!(endpoint = %provider.info().endpoint, "Gateway reachable"),
            Ok(false) | Err(_) => {
                tracing::warn!(endpoint = %provider.info().endpoint, "Gateway not reachable");
            }
        }
    }

    let state = AppState::build(&config, provider, store);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("Agreement agent listening on http://{}", config.bind_addr);
    tracing::info!("  GET  /health           - Health check");
    tracing::info!("  POST /chat/?query=...  - Ask a question");
    tracing::info!("  POST /api/chat         - Ask a question (JSON body)");

    axum::serve(listener, app).await?;

    Ok(())
}
