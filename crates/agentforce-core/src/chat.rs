//! Chat Turns
//!
//! One user message in, one [`ChatTurn`] out. Failures are folded into the
//! turn so the web layer always has something to render.

use crate::agent::AgentApi;
use crate::error::{AgentforceError, Result};
use crate::reply::{AgentReply, Projection};
use crate::session::Conversation;

/// Outcome of a single chat turn
#[derive(Debug)]
pub enum ChatTurn {
    /// The agent answered
    Exchange {
        user_text: String,
        reply: Projection,
    },

    /// Something in authenticate / create session / send failed
    Failed {
        user_text: String,
        error: AgentforceError,
    },
}

impl ChatTurn {
    pub fn user_text(&self) -> &str {
        match self {
            Self::Exchange { user_text, .. } | Self::Failed { user_text, .. } => user_text,
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Relay `text` to the agent within `conversation`.
///
/// Authenticates and opens the remote session on first use. Never returns an
/// error: every failure becomes [`ChatTurn::Failed`].
pub async fn run_turn(agent: &dyn AgentApi, conversation: &Conversation, text: &str) -> ChatTurn {
    match exchange(agent, conversation, text).await {
        Ok(reply) => {
            let reply = reply.project();
            tracing::debug!(
                conversation_id = %conversation.id(),
                fallback = reply.is_dump(),
                "Agent replied"
            );
            ChatTurn::Exchange {
                user_text: text.to_string(),
                reply,
            }
        }
        Err(error) => {
            tracing::error!(
                conversation_id = %conversation.id(),
                code = error.code(),
                status = ?error.status(),
                "Chat turn failed: {}",
                error
            );
            ChatTurn::Failed {
                user_text: text.to_string(),
                error,
            }
        }
    }
}

async fn exchange(agent: &dyn AgentApi, conversation: &Conversation, text: &str) -> Result<AgentReply> {
    let session = conversation.ensure_ready(agent).await?;
    agent.send_message(session, text, &[]).await
}
