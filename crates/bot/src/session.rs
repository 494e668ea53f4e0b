//! Per-chat session state for the conversational checkout.
//!
//! A chat gets a session when the Mini App hands off a successful login
//! through `web_app_data`; the session dies on logout or process restart.
//! Sessions live only in process memory. That loss-on-restart is a
//! documented limitation of the deployment model, not something this
//! module tries to paper over.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::ChatId;
use tokio::sync::Mutex;

use samovar_core::{OrderId, UserId, UserRole};

/// Authenticated account data carried by the web-app login handoff.
///
/// The wire payload historically spells the address field `adress`; both
/// spellings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "adress")]
    pub address: Option<String>,
}

/// The confirmation prompt a chat has not answered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// Web-app query id the confirmation message was built for.
    pub query_id: String,
    /// `None` when order persistence was unavailable at submit time.
    pub order_id: Option<OrderId>,
}

/// Session record for one chat.
///
/// Presence in the store is the authentication signal: records are only
/// ever created from a successful login handoff and removed on logout.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub user: SessionUser,
    pub created_at: DateTime<Utc>,
    /// The next plain-text message is consumed as a shipping address.
    pub awaiting_address: bool,
    pub pending: Option<PendingConfirmation>,
}

impl ChatSession {
    /// Create a fresh session for a just-authenticated user.
    #[must_use]
    pub fn new(user: SessionUser) -> Self {
        Self {
            user,
            created_at: Utc::now(),
            awaiting_address: false,
            pending: None,
        }
    }
}

/// Mutation applied to a session under the store's per-chat lock.
pub type SessionUpdate = Box<dyn FnOnce(&mut ChatSession) + Send>;

/// Injected session-store abstraction.
///
/// All mutation goes through [`SessionStore::update`], a single locked
/// read-modify-write, so the HTTP side and the bot side never interleave
/// writes for the same chat.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Snapshot of the session for `chat`, if one exists.
    async fn get(&self, chat: ChatId) -> Option<ChatSession>;

    /// Create or replace the session for `chat`.
    async fn insert(&self, chat: ChatId, session: ChatSession);

    /// Delete the session for `chat`. Returns `false` if none existed.
    async fn remove(&self, chat: ChatId) -> bool;

    /// Apply `apply` to the session for `chat` atomically.
    ///
    /// Returns `false` (without calling `apply`) if the chat has no
    /// session.
    async fn update(&self, chat: ChatId, apply: SessionUpdate) -> bool;

    /// Number of live sessions.
    async fn count(&self) -> usize;
}

/// In-memory [`SessionStore`] for single-instance deployments.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: Mutex<HashMap<ChatId, ChatSession>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, chat: ChatId) -> Option<ChatSession> {
        self.inner.lock().await.get(&chat).cloned()
    }

    async fn insert(&self, chat: ChatId, session: ChatSession) {
        self.inner.lock().await.insert(chat, session);
    }

    async fn remove(&self, chat: ChatId) -> bool {
        self.inner.lock().await.remove(&chat).is_some()
    }

    async fn update(&self, chat: ChatId, apply: SessionUpdate) -> bool {
        let mut sessions = self.inner.lock().await;
        match sessions.get_mut(&chat) {
            Some(session) => {
                apply(session);
                true
            }
            None => false,
        }
    }

    async fn count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: UserId::new(42),
            username: "alice".to_owned(),
            role: UserRole::User,
            email: None,
            address: Some("Street 1".to_owned()),
        }
    }

    #[tokio::test]
    async fn update_is_a_no_op_without_a_session() {
        let store = InMemorySessionStore::new();
        let applied = store
            .update(ChatId(1), Box::new(|s| s.awaiting_address = true))
            .await;
        assert!(!applied);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn update_mutates_in_place() {
        let store = InMemorySessionStore::new();
        store.insert(ChatId(1), ChatSession::new(user())).await;

        let applied = store
            .update(
                ChatId(1),
                Box::new(|s| {
                    s.awaiting_address = true;
                    s.user.address = Some("Street 2".to_owned());
                }),
            )
            .await;

        assert!(applied);
        let session = store.get(ChatId(1)).await.expect("session");
        assert!(session.awaiting_address);
        assert_eq!(session.user.address.as_deref(), Some("Street 2"));
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let store = InMemorySessionStore::new();
        store.insert(ChatId(7), ChatSession::new(user())).await;
        assert!(store.remove(ChatId(7)).await);
        assert!(!store.remove(ChatId(7)).await);
    }

    #[test]
    fn session_user_accepts_legacy_address_spelling() {
        let parsed: SessionUser = serde_json::from_str(
            r#"{"id": 42, "username": "alice", "role": "user", "adress": "Street 1"}"#,
        )
        .expect("deserialize");
        assert_eq!(parsed.address.as_deref(), Some("Street 1"));
    }
}
