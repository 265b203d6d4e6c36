//! Agentforce API Client
//!
//! Implementation of `AgentApi` over the Agentforce REST API: an OAuth2
//! client-credentials exchange against the org, then session and message calls
//! against the API host the token response points to.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};

use agentforce_core::{
    agent::{AgentApi, AuthState, REQUIRED_SCOPES, Variable},
    config::AgentforceConfig,
    error::{AgentforceError, AuthFailure, Result},
    reply::AgentReply,
    session::SessionId,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

const AGENT_API_PATH: &str = "einstein/ai-agent/v1";

/// Prefix of the external session key sent when opening a session
const SESSION_KEY_PREFIX: &str = "agentforce-chat";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    api_instance_url: String,
    #[serde(default)]
    scope: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    external_session_key: String,
    instance_config: InstanceConfig<'a>,
    feature_support: &'static str,
    streaming_capabilities: StreamingCapabilities,
    bypass_user: bool,
}

#[derive(Serialize)]
struct InstanceConfig<'a> {
    endpoint: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamingCapabilities {
    chunk_types: &'static [&'static str],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    session_id: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: OutgoingMessage<'a>,
    variables: &'a [Variable],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingMessage<'a> {
    sequence_id: i64,
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Agentforce agent API client
pub struct AgentforceClient {
    http: reqwest::Client,
    config: AgentforceConfig,
    auth: RwLock<Option<AuthState>>,
    /// Serializes `ensure_authenticated` so only one token exchange runs
    auth_gate: Mutex<()>,
    last_sequence_id: AtomicI64,
}

impl AgentforceClient {
    /// Create a client; no network traffic until the first call
    pub fn new(config: AgentforceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            config,
            auth: RwLock::new(None),
            auth_gate: Mutex::new(()),
            last_sequence_id: AtomicI64::new(0),
        })
    }

    async fn require_auth(&self) -> Result<AuthState> {
        self.auth
            .read()
            .await
            .clone()
            .ok_or(AgentforceError::NotAuthenticated)
    }

    /// Current time in milliseconds, bumped past every id issued before
    fn next_sequence_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_sequence_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    fn external_session_key() -> String {
        format!("{SESSION_KEY_PREFIX}-{}", Utc::now().timestamp_micros())
    }

    fn client_id_preview(&self) -> String {
        self.config.client_id.chars().take(10).collect()
    }
}

#[async_trait]
impl AgentApi for AgentforceClient {
    async fn authenticate(&self) -> Result<()> {
        let url = format!("{}/services/oauth2/token", self.config.instance_url);
        tracing::debug!(url = %url, client_id = %self.client_id_preview(), "Authenticating");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;

        let (status, body) = read_body(response).await?;
        tracing::debug!(status = status.as_u16(), "Auth response");

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %body, "Token exchange rejected");
            return Err(AuthFailure::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        let scopes: BTreeSet<String> = token.scope.split_whitespace().map(String::from).collect();

        let missing = AuthState::missing_scopes(&scopes);
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Token lacks required scopes");
            let mut required: Vec<String> = REQUIRED_SCOPES.iter().map(|s| (*s).to_string()).collect();
            required.sort();
            return Err(AuthFailure::MissingScopes {
                required,
                granted: scopes.into_iter().collect(),
            }
            .into());
        }

        let state = AuthState {
            access_token: token.access_token,
            api_base_url: token.api_instance_url.trim_end_matches('/').to_string(),
            scopes,
        };
        tracing::info!(api_base_url = %state.api_base_url, "Authenticated with Salesforce");
        *self.auth.write().await = Some(state);

        Ok(())
    }

    async fn ensure_authenticated(&self) -> Result<()> {
        if self.is_authenticated().await {
            return Ok(());
        }

        let _gate = self.auth_gate.lock().await;
        // Another caller may have finished while we waited
        if self.is_authenticated().await {
            return Ok(());
        }
        self.authenticate().await
    }

    async fn is_authenticated(&self) -> bool {
        self.auth.read().await.is_some()
    }

    async fn create_session(&self) -> Result<SessionId> {
        let auth = self.require_auth().await?;
        let url = format!(
            "{}/{AGENT_API_PATH}/agents/{}/sessions",
            auth.api_base_url, self.config.agent_id
        );

        let request = CreateSessionRequest {
            external_session_key: Self::external_session_key(),
            instance_config: InstanceConfig {
                endpoint: &self.config.instance_url,
            },
            feature_support: "Streaming",
            streaming_capabilities: StreamingCapabilities {
                chunk_types: &["Text"],
            },
            bypass_user: true,
        };
        tracing::debug!(
            url = %url,
            external_session_key = %request.external_session_key,
            "Creating agent session"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&auth.access_token)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        let (status, body) = read_body(response).await?;
        tracing::debug!(status = status.as_u16(), body = %body, "Session response");

        if !status.is_success() {
            return Err(AgentforceError::SessionCreation {
                status: status.as_u16(),
                body,
            });
        }

        let created: SessionCreated = serde_json::from_str(&body)?;
        Ok(SessionId::from_string(created.session_id))
    }

    async fn send_message(
        &self,
        session: &SessionId,
        text: &str,
        variables: &[Variable],
    ) -> Result<AgentReply> {
        let auth = self.require_auth().await?;
        let url = format!("{}/{AGENT_API_PATH}/sessions/{session}/messages", auth.api_base_url);

        let request = SendMessageRequest {
            message: OutgoingMessage {
                sequence_id: self.next_sequence_id(),
                kind: "Text",
                text,
            },
            variables,
        };
        tracing::debug!(
            session_id = %session,
            sequence_id = request.message.sequence_id,
            chars = text.chars().count(),
            "Sending message"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&auth.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            tracing::warn!(session_id = %session, status = status.as_u16(), "Message rejected");
            return Err(AgentforceError::MessageSend {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok(AgentReply::from(value))
    }
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    Ok((status, body))
}

fn transport(err: reqwest::Error) -> AgentforceError {
    AgentforceError::Transport(err.to_string())
}
