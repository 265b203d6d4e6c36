//! # agentforce-runtime
//!
//! HTTP implementation of [`AgentApi`](agentforce_core::AgentApi) for the
//! Salesforce Agentforce agent API.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentforce_runtime::{AgentforceClient, AgentforceConfig};
//!
//! let client = AgentforceClient::new(AgentforceConfig::from_env()?)?;
//! client.authenticate().await?;
//! let session = client.create_session().await?;
//! let reply = client.send_message(&session, "Hello", &[]).await?;
//! ```

pub mod agentforce;

#[cfg(test)]
mod mock;

pub use agentforce::AgentforceClient;

// Re-export core types for convenience
pub use agentforce_core::{
    AgentApi, AgentReply, AgentforceConfig, AgentforceError, AuthState, Projection, Result,
    SessionId, Variable,
};
