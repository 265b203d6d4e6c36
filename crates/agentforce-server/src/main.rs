//! Agentforce Chat Server
//!
//! Axum-based server rendering a chat page and relaying messages to a
//! Salesforce Agentforce agent. Replies come back as htmx fragments.

mod handlers;
mod state;
mod views;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agentforce_core::{AgentforceConfig, AgentforceError};
use agentforce_runtime::AgentforceClient;

use crate::handlers::{chat, health, home};
use crate::state::AppState;
use crate::views::Views;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let views = Arc::new(Views::new()?);

    // Configuration is checked once, before any client exists
    let state = match AgentforceConfig::from_env() {
        Ok(config) => {
            tracing::info!(
                instance_url = %config.instance_url,
                agent_id = %config.agent_id,
                timeout_secs = config.http_timeout.as_secs(),
                "✓ Agentforce configured"
            );
            let client = AgentforceClient::new(config)?;
            AppState::configured(Arc::new(client), views)
        }
        Err(AgentforceError::ConfigurationMissing(missing)) => {
            tracing::warn!("⚠ Agentforce not configured - serving setup instructions");
            for key in &missing {
                tracing::warn!("  Missing {} ({})", key.env_var(), key.description());
            }
            AppState::unconfigured(missing, views)
        }
        Err(e) => return Err(e.into()),
    };

    let app = router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 agentforce-chat running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /        - Chat page");
    tracing::info!("  POST /chat    - Send message (htmx fragment)");
    tracing::info!("  GET  /health  - Health check");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
