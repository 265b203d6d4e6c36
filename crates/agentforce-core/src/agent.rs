//! Agent API Abstraction
//!
//! The chat turn only talks to the remote agent through [`AgentApi`], so the
//! HTTP client can be swapped for an in-memory fake in tests.
//!
//! ## Call order
//!
//! ```text
//! authenticate ──▶ create_session ──▶ send_message (repeated)
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::reply::AgentReply;
use crate::session::SessionId;

/// OAuth scopes the agent API requires on the access token
pub const REQUIRED_SCOPES: [&str; 3] = ["sfap_api", "chatbot_api", "api"];

/// Result of a successful token exchange
#[derive(Clone)]
pub struct AuthState {
    /// Bearer token for the agent API
    pub access_token: String,

    /// Base URL the agent API lives under (differs from the org domain)
    pub api_base_url: String,

    /// Scopes granted with the token
    pub scopes: BTreeSet<String>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("access_token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl AuthState {
    /// Required scopes not present in `granted`, sorted
    pub fn missing_scopes(granted: &BTreeSet<String>) -> Vec<String> {
        let mut missing: Vec<String> = REQUIRED_SCOPES
            .iter()
            .filter(|scope| !granted.contains(**scope))
            .map(|scope| (*scope).to_string())
            .collect();
        missing.sort();
        missing
    }
}

/// Context variable forwarded to the agent alongside a message
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,

    /// Agentforce data type, e.g. `Text`
    #[serde(rename = "type")]
    pub kind: String,

    pub value: serde_json::Value,
}

impl Variable {
    /// Text-typed variable
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "Text".into(),
            value: serde_json::Value::String(value.into()),
        }
    }
}

/// Remote conversational agent
///
/// Implementations hold the authentication state; sessions are owned by the
/// caller (see [`crate::session::Conversation`]).
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// Run the OAuth client-credentials exchange and store the result.
    ///
    /// Calling it again repeats the exchange and replaces the stored state.
    async fn authenticate(&self) -> Result<()>;

    /// Authenticate only when no state is held yet.
    ///
    /// Concurrent callers must not trigger more than one exchange.
    async fn ensure_authenticated(&self) -> Result<()>;

    /// Whether an access token is held
    async fn is_authenticated(&self) -> bool;

    /// Open a new remote agent session
    async fn create_session(&self) -> Result<SessionId>;

    /// Send one text message within `session`
    async fn send_message(
        &self,
        session: &SessionId,
        text: &str,
        variables: &[Variable],
    ) -> Result<AgentReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_scopes_superset_is_empty() {
        let granted: BTreeSet<String> = ["api", "chatbot_api", "sfap_api", "refresh_token"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(AuthState::missing_scopes(&granted).is_empty());
    }

    #[test]
    fn test_missing_scopes_subset() {
        let granted: BTreeSet<String> = ["api"].into_iter().map(String::from).collect();
        assert_eq!(
            AuthState::missing_scopes(&granted),
            vec!["chatbot_api".to_string(), "sfap_api".to_string()]
        );
    }

    #[test]
    fn test_variable_wire_shape() {
        let var = Variable::text("$Context.Locale", "en_US");
        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(json["type"], "Text");
        assert_eq!(json["name"], "$Context.Locale");
        assert_eq!(json["value"], "en_US");
    }
}
