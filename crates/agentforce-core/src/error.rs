//! Error Types

use thiserror::Error;

use crate::config::ConfigKey;

/// Result type alias for Agentforce operations
pub type Result<T> = std::result::Result<T, AgentforceError>;

/// Errors raised while talking to the Agentforce API
#[derive(Error, Debug)]
pub enum AgentforceError {
    /// One or more required configuration values are absent
    #[error("Configuration required: missing {}", display_keys(.0))]
    ConfigurationMissing(Vec<ConfigKey>),

    /// OAuth token exchange failed
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthFailure),

    /// Session or message call issued before authentication
    #[error("Client not authenticated")]
    NotAuthenticated,

    /// Remote session could not be created
    #[error("Session creation failed: {status} - {body}")]
    SessionCreation { status: u16, body: String },

    /// Message was rejected by the agent API
    #[error("Message send failed: {status} - {body}")]
    MessageSend { status: u16, body: String },

    /// Connection, TLS or timeout failure before any status was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Successful response whose body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

/// Why the token exchange was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// Non-2xx response from the token endpoint
    #[error("{status} - {body}")]
    Rejected { status: u16, body: String },

    /// Token was issued without every scope the agent API needs
    #[error(
        "missing required OAuth scopes. Required: {}, Found: {}",
        .required.join(" "),
        .granted.join(" ")
    )]
    MissingScopes {
        required: Vec<String>,
        granted: Vec<String>,
    },
}

fn display_keys(keys: &[ConfigKey]) -> String {
    keys.iter()
        .map(|k| k.env_var())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AgentforceError {
    /// HTTP status of the failed remote call, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication(AuthFailure::Rejected { status, .. })
            | Self::SessionCreation { status, .. }
            | Self::MessageSend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of the failed remote call, when one was received
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Authentication(AuthFailure::Rejected { body, .. })
            | Self::SessionCreation { body, .. }
            | Self::MessageSend { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Short machine-readable code, used in logs and JSON responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "CONFIGURATION_MISSING",
            Self::Authentication(_) => "AUTHENTICATION_FAILED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::SessionCreation { .. } => "SESSION_CREATION_FAILED",
            Self::MessageSend { .. } => "MESSAGE_SEND_FAILED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }
}

impl From<serde_json::Error> for AgentforceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
