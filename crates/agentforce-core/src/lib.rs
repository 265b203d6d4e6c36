//! # agentforce-core
//!
//! Core logic for a web chat front-end to a Salesforce Agentforce agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         run_turn                              │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌────────────────┐   │
//! │  │ Conversation │──│    AgentApi      │──│  AgentReply    │   │
//! │  │ (session id) │  │ auth/session/msg │  │  → Projection  │   │
//! │  └──────────────┘  └──────────────────┘  └────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `AgentApi` trait keeps the HTTP client (see `agentforce-runtime`) out
//! of the turn logic.

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod reply;
pub mod session;

pub use agent::{AgentApi, AuthState, REQUIRED_SCOPES, Variable};
pub use chat::{ChatTurn, run_turn};
pub use config::{AgentforceConfig, ConfigKey};
pub use error::{AgentforceError, AuthFailure, Result};
pub use reply::{AgentReply, Projection};
pub use session::{Conversation, ConversationId, ConversationStore, SessionId};
