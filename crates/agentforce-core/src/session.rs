//! Session Management
//!
//! A [`Conversation`] is one browser's chat: it lazily opens a remote agent
//! session and reuses it for every later turn. [`ConversationStore`] maps
//! conversation ids (carried in a cookie) to their contexts and forgets the
//! ones that go idle.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{OnceCell, RwLock};
use uuid::Uuid;

use crate::agent::AgentApi;
use crate::error::{AgentforceError, Result};

/// Conversations untouched for this long are dropped
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on live conversations
pub const DEFAULT_MAX_CONVERSATIONS: usize = 10_000;

/// Remote-assigned agent session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local conversation identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept only well-formed UUIDs so arbitrary cookie values never become keys
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One chat's state: the remote session, once opened
#[derive(Debug)]
pub struct Conversation {
    id: ConversationId,
    session: OnceCell<SessionId>,
    created_at: DateTime<Utc>,
    /// Unix millis of the last lookup
    last_active: AtomicI64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_id(ConversationId::new())
    }

    pub fn with_id(id: ConversationId) -> Self {
        let created_at = Utc::now();
        Self {
            id,
            session: OnceCell::new(),
            created_at,
            last_active: AtomicI64::new(created_at.timestamp_millis()),
        }
    }

    pub const fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Remote session, if one has been opened
    pub fn session(&self) -> Option<&SessionId> {
        self.session.get()
    }

    /// Authenticate and open the remote session if not done yet.
    ///
    /// Concurrent turns on the same conversation share a single session
    /// creation. A failed attempt leaves the conversation empty so the next
    /// turn tries again.
    pub async fn ensure_ready(&self, agent: &dyn AgentApi) -> Result<&SessionId> {
        agent.ensure_authenticated().await?;
        self.session
            .get_or_try_init(|| async {
                let session = agent.create_session().await?;
                tracing::info!(
                    conversation_id = %self.id,
                    session_id = %session,
                    "Opened agent session"
                );
                Ok::<_, AgentforceError>(session)
            })
            .await
    }

    fn touch(&self) {
        self.last_active
            .fetch_max(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn idle_millis(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_active.load(Ordering::Relaxed))
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory registry of live conversations.
///
/// Idle conversations are swept whenever a new one is started, and the least
/// recently used one gives way once the registry is full.
pub struct ConversationStore {
    conversations: RwLock<HashMap<ConversationId, Arc<Conversation>>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_MAX_CONVERSATIONS)
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    /// Look up a conversation and mark it active
    pub async fn get(&self, id: &ConversationId) -> Option<Arc<Conversation>> {
        let conversation = self.conversations.read().await.get(id).cloned()?;
        conversation.touch();
        Some(conversation)
    }

    /// Return the conversation for `id`, or start a fresh one.
    ///
    /// The boolean is `true` when a new conversation was created; its id then
    /// differs from the requested one and must be handed back to the browser.
    pub async fn get_or_create(&self, id: Option<&ConversationId>) -> (Arc<Conversation>, bool) {
        if let Some(id) = id {
            if let Some(existing) = self.get(id).await {
                return (existing, false);
            }
        }

        let conversation = Arc::new(Conversation::new());
        let mut conversations = self.conversations.write().await;
        self.evict(&mut conversations);
        conversations.insert(conversation.id().clone(), conversation.clone());
        tracing::debug!(
            conversation_id = %conversation.id(),
            active = conversations.len(),
            "Started conversation"
        );
        (conversation, true)
    }

    /// Drop a conversation; the remote session is simply abandoned
    pub async fn remove(&self, id: &ConversationId) -> bool {
        self.conversations.write().await.remove(id).is_some()
    }

    /// Number of live conversations
    pub async fn active_count(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Sweep idle entries, then make room for one more
    fn evict(&self, conversations: &mut HashMap<ConversationId, Arc<Conversation>>) {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();
        let ttl_ms = i64::try_from(self.idle_ttl.as_millis()).unwrap_or(i64::MAX);

        conversations.retain(|id, conversation| {
            let keep = conversation.idle_millis(now_ms) < ttl_ms;
            if !keep {
                tracing::debug!(
                    conversation_id = %id,
                    age_secs = (now - conversation.created_at).num_seconds(),
                    "Evicted idle conversation"
                );
            }
            keep
        });

        while conversations.len() >= self.capacity {
            let Some(oldest) = conversations
                .values()
                .max_by_key(|conversation| conversation.idle_millis(now_ms))
                .map(|conversation| conversation.id().clone())
            else {
                break;
            };
            conversations.remove(&oldest);
            tracing::warn!(conversation_id = %oldest, "Conversation limit reached, evicted least recent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_parse() {
        let id = ConversationId::new();
        assert_eq!(ConversationId::parse(id.as_str()), Some(id));
        assert_eq!(ConversationId::parse("not-a-uuid"), None);
    }

    #[tokio::test]
    async fn test_store_reuses_known_conversation() {
        let store = ConversationStore::new();
        let (first, created) = store.get_or_create(None).await;
        assert!(created);

        let (again, created) = store.get_or_create(Some(first.id())).await;
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_store_replaces_unknown_id() {
        let store = ConversationStore::new();
        let stale = ConversationId::new();
        let (conversation, created) = store.get_or_create(Some(&stale)).await;
        assert!(created);
        assert_ne!(conversation.id(), &stale);
        assert!(store.remove(conversation.id()).await);
        assert!(!store.remove(conversation.id()).await);
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_is_bounded_by_capacity() {
        let store = ConversationStore::with_limits(DEFAULT_IDLE_TTL, 3);
        for _ in 0..50 {
            store.get_or_create(None).await;
        }
        assert_eq!(store.active_count().await, 3);
    }

    #[tokio::test]
    async fn test_full_store_evicts_least_recently_used() {
        let store = ConversationStore::with_limits(DEFAULT_IDLE_TTL, 2);
        let (first, _) = store.get_or_create(None).await;
        let (second, _) = store.get_or_create(None).await;

        // Make `second` the stale one
        second.last_active.store(0, Ordering::Relaxed);
        store.get_or_create(None).await;

        assert!(store.get(first.id()).await.is_some());
        assert!(store.get(second.id()).await.is_none());
        assert_eq!(store.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_idle_conversations_are_swept() {
        let store = ConversationStore::with_limits(Duration::from_secs(60), 100);
        let (idle, _) = store.get_or_create(None).await;
        let (busy, _) = store.get_or_create(None).await;

        let two_minutes_ago = Utc::now().timestamp_millis() - 120_000;
        idle.last_active.store(two_minutes_ago, Ordering::Relaxed);

        store.get_or_create(None).await;
        assert!(store.get(idle.id()).await.is_none());
        assert!(store.get(busy.id()).await.is_some());
        assert_eq!(store.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_lookup_refreshes_activity() {
        let store = ConversationStore::new();
        let (conversation, _) = store.get_or_create(None).await;
        conversation.last_active.store(0, Ordering::Relaxed);

        store.get(conversation.id()).await;
        assert!(conversation.idle_millis(Utc::now().timestamp_millis()) < 60_000);
    }

    #[test]
    fn test_new_conversation_has_no_session() {
        assert!(Conversation::new().session().is_none());
    }
}
