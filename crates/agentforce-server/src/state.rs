//! Application State

use std::sync::Arc;

use agentforce_core::{AgentApi, ConfigKey, ConversationStore};

use crate::views::Views;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agent client (None while configuration is incomplete)
    pub agent: Option<Arc<dyn AgentApi>>,

    /// Required settings that were absent at startup
    pub missing_config: Arc<[ConfigKey]>,

    /// One conversation per browser
    pub conversations: Arc<ConversationStore>,

    /// Compiled templates
    pub views: Arc<Views>,
}

impl AppState {
    /// Fully configured: chat is available
    pub fn configured(agent: Arc<dyn AgentApi>, views: Arc<Views>) -> Self {
        Self {
            agent: Some(agent),
            missing_config: Arc::new([]),
            conversations: Arc::new(ConversationStore::new()),
            views,
        }
    }

    /// Missing settings: only the configuration page is served
    pub fn unconfigured(missing: Vec<ConfigKey>, views: Arc<Views>) -> Self {
        Self {
            agent: None,
            missing_config: missing.into(),
            conversations: Arc::new(ConversationStore::new()),
            views,
        }
    }
}
