//! Agentforce Configuration
//!
//! Credentials for the connected app plus the agent to talk to. Loaded once at
//! startup; any missing value keeps the server in "configuration required" mode.

use std::time::Duration;

use crate::error::{AgentforceError, Result};

/// Default timeout for every outbound HTTP call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the optional HTTP timeout override
pub const HTTP_TIMEOUT_ENV: &str = "AGENTFORCE_HTTP_TIMEOUT_SECS";

/// One of the four required configuration values
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    InstanceUrl,
    ClientId,
    ClientSecret,
    AgentId,
}

impl ConfigKey {
    /// All required keys, in display order
    pub const ALL: [Self; 4] = [
        Self::InstanceUrl,
        Self::ClientId,
        Self::ClientSecret,
        Self::AgentId,
    ];

    pub const fn env_var(self) -> &'static str {
        match self {
            Self::InstanceUrl => "SALESFORCE_INSTANCE_URL",
            Self::ClientId => "SALESFORCE_CLIENT_ID",
            Self::ClientSecret => "SALESFORCE_CLIENT_SECRET",
            Self::AgentId => "SALESFORCE_AGENT_ID",
        }
    }

    /// Human description shown on the configuration page
    pub const fn description(self) -> &'static str {
        match self {
            Self::InstanceUrl => "Your Salesforce org domain",
            Self::ClientId => "Connected app client ID",
            Self::ClientSecret => "Connected app client secret",
            Self::AgentId => "Agent ID",
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.env_var())
    }
}

/// Connected-app credentials and agent selection
#[derive(Clone)]
pub struct AgentforceConfig {
    /// Org domain, e.g. `https://mydomain.my.salesforce.com` (no trailing slash)
    pub instance_url: String,

    pub client_id: String,

    pub client_secret: String,

    pub agent_id: String,

    /// Applied to every outbound request
    pub http_timeout: Duration,
}

impl std::fmt::Debug for AgentforceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentforceConfig")
            .field("instance_url", &self.instance_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("agent_id", &self.agent_id)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl AgentforceConfig {
    pub fn new(
        instance_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        let instance_url: String = instance_url.into();
        Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            agent_id: agent_id.into(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Override the HTTP timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Load from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup.
    ///
    /// Blank values count as missing. Every missing key is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: ConfigKey| {
            lookup(key.env_var())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let instance_url = value(ConfigKey::InstanceUrl);
        let client_id = value(ConfigKey::ClientId);
        let client_secret = value(ConfigKey::ClientSecret);
        let agent_id = value(ConfigKey::AgentId);

        let (Some(instance_url), Some(client_id), Some(client_secret), Some(agent_id)) =
            (instance_url, client_id, client_secret, agent_id)
        else {
            let missing = ConfigKey::ALL
                .into_iter()
                .filter(|key| value(*key).is_none())
                .collect();
            return Err(AgentforceError::ConfigurationMissing(missing));
        };

        let timeout = match lookup(HTTP_TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid {}, using default", HTTP_TIMEOUT_ENV);
                DEFAULT_HTTP_TIMEOUT_SECS
            }),
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self::new(instance_url, client_id, client_secret, agent_id)
            .with_timeout(Duration::from_secs(timeout)))
    }
}
