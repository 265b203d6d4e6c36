//! HTTP Handlers

use axum::{
    Form, Json,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use agentforce_core::{ConversationId, run_turn};

use crate::state::AppState;

/// Cookie binding a browser to its conversation
pub const CONVERSATION_COOKIE: &str = "agentforce_conversation";

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub configured: bool,
    pub authenticated: bool,
    pub conversations: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Chat page, or configuration instructions when settings are missing
pub async fn home(State(state): State<AppState>) -> Response {
    let page = if state.agent.is_some() {
        state.views.chat_page()
    } else {
        state.views.config_required_page(&state.missing_config)
    };

    render(page)
}

/// One chat turn; always answers with an HTML fragment
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let Some(agent) = state.agent.as_ref() else {
        return render(state.views.alert("Client not initialized"));
    };

    if form.message.trim().is_empty() {
        return Html(String::new()).into_response();
    }

    let requested = conversation_from_cookies(&headers);
    let (conversation, created) = state.conversations.get_or_create(requested.as_ref()).await;
    tracing::info!(
        conversation_id = %conversation.id(),
        new_conversation = created,
        message_chars = form.message.chars().count(),
        "Chat request"
    );

    let turn = run_turn(agent.as_ref(), &conversation, &form.message).await;
    let mut response = render(state.views.turn_fragment(&turn));

    // Nothing worth keeping if the first turn never got a session
    if created && conversation.session().is_none() {
        state.conversations.remove(conversation.id()).await;
        return response;
    }

    if created {
        let cookie = format!(
            "{CONVERSATION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            conversation.id()
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Invalid conversation cookie: {}", e),
        }
    }

    response
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let authenticated = match &state.agent {
        Some(agent) => agent.is_authenticated().await,
        None => false,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        configured: state.agent.is_some(),
        authenticated,
        conversations: state.conversations.active_count().await,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn render(result: Result<String, minijinja::Error>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

fn conversation_from_cookies(headers: &HeaderMap) -> Option<ConversationId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CONVERSATION_COOKIE)
        .and_then(|(_, value)| ConversationId::parse(value))
}
