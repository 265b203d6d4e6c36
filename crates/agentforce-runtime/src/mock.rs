//! Mock Agentforce API
//!
//! In-process axum server imitating the token, session and message endpoints.
//! Records every request so tests can assert on call counts and wire shapes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};

struct MockState {
    base_url: String,
    scope: String,
    token_status: u16,
    session_status: u16,
    message_status: u16,
    auth_calls: AtomicUsize,
    session_requests: Mutex<Vec<Value>>,
    agent_ids: Mutex<Vec<String>>,
    message_requests: Mutex<Vec<Value>>,
    message_session_ids: Mutex<Vec<String>>,
}

pub struct MockAgentforce {
    state: Arc<MockState>,
}

pub struct MockBuilder {
    scope: String,
    token_status: u16,
    session_status: u16,
    message_status: u16,
}

impl MockBuilder {
    pub fn token_status(mut self, status: u16) -> Self {
        self.token_status = status;
        self
    }

    pub fn session_status(mut self, status: u16) -> Self {
        self.session_status = status;
        self
    }

    pub fn message_status(mut self, status: u16) -> Self {
        self.message_status = status;
        self
    }

    pub async fn start(self) -> MockAgentforce {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(MockState {
            base_url: format!("http://{addr}"),
            scope: self.scope,
            token_status: self.token_status,
            session_status: self.session_status,
            message_status: self.message_status,
            auth_calls: AtomicUsize::new(0),
            session_requests: Mutex::new(Vec::new()),
            agent_ids: Mutex::new(Vec::new()),
            message_requests: Mutex::new(Vec::new()),
            message_session_ids: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/services/oauth2/token", post(token))
            .route("/einstein/ai-agent/v1/agents/{agent_id}/sessions", post(create_session))
            .route("/einstein/ai-agent/v1/sessions/{session_id}/messages", post(send_message))
            .with_state(state.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        MockAgentforce { state }
    }
}

impl MockAgentforce {
    pub const TOKEN: &'static str = "00Dmock!token";
    pub const REPLY: &'static str = "Hi, I'm your Agentforce agent.";
    pub const ERROR_BODY: &'static str = r#"[{"errorCode":"MOCK_FAILURE","message":"mock failure"}]"#;
    pub const ALL_SCOPES: &'static str = "api chatbot_api sfap_api";

    pub fn builder() -> MockBuilder {
        MockBuilder {
            scope: Self::ALL_SCOPES.into(),
            token_status: 200,
            session_status: 200,
            message_status: 200,
        }
    }

    /// Start with default statuses, granting `scope`
    pub async fn start(scope: &str) -> Self {
        let mut builder = Self::builder();
        builder.scope = scope.into();
        builder.start().await
    }

    pub fn base_url(&self) -> String {
        self.state.base_url.clone()
    }

    pub fn auth_calls(&self) -> usize {
        self.state.auth_calls.load(Ordering::SeqCst)
    }

    pub fn session_requests(&self) -> Vec<Value> {
        self.state.session_requests.lock().unwrap().clone()
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.state.agent_ids.lock().unwrap().clone()
    }

    pub fn message_requests(&self) -> Vec<Value> {
        self.state.message_requests.lock().unwrap().clone()
    }

    pub fn message_session_ids(&self) -> Vec<String> {
        self.state.message_session_ids.lock().unwrap().clone()
    }
}

fn failure(status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, MockAgentforce::ERROR_BODY).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MockAgentforce::TOKEN))
}

async fn token(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.auth_calls.fetch_add(1, Ordering::SeqCst);

    let valid_grant = form.get("grant_type").map(String::as_str) == Some("client_credentials")
        && form.contains_key("client_id")
        && form.contains_key("client_secret");
    if state.token_status != 200 || !valid_grant {
        return failure(if valid_grant { state.token_status } else { 400 });
    }

    Json(json!({
        "access_token": MockAgentforce::TOKEN,
        "api_instance_url": state.base_url,
        "scope": state.scope,
        "token_type": "Bearer",
    }))
    .into_response()
}

async fn create_session(
    State(state): State<Arc<MockState>>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return failure(401);
    }

    let count = {
        let mut requests = state.session_requests.lock().unwrap();
        requests.push(body);
        requests.len()
    };
    state.agent_ids.lock().unwrap().push(agent_id);

    if state.session_status != 200 {
        return failure(state.session_status);
    }

    Json(json!({
        "sessionId": format!("session-{count}"),
        "messages": [{"type": "Inform", "message": "Welcome!"}],
    }))
    .into_response()
}

async fn send_message(
    State(state): State<Arc<MockState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return failure(401);
    }

    state.message_requests.lock().unwrap().push(body);
    state.message_session_ids.lock().unwrap().push(session_id);

    if state.message_status != 200 {
        return failure(state.message_status);
    }

    Json(json!({
        "messages": [{
            "type": "Inform",
            "id": "msg-1",
            "feedbackId": "fb-1",
            "message": MockAgentforce::REPLY,
        }],
    }))
    .into_response()
}
