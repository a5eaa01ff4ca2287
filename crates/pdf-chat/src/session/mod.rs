//! Per-browser-session conversation state

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::chain::ConversationChain;
use crate::error::{Error, Result};
use crate::pipeline::handle_user_input;
use crate::types::{render_history, DocumentSummary, RenderedMessage, SessionInfo};

/// One user's session
struct Session {
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
    documents: Vec<DocumentSummary>,
    /// None until documents have been processed
    conversation: Option<Arc<Mutex<ConversationChain>>>,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_active: now,
            documents: Vec::new(),
            conversation: None,
        }
    }
}

/// Concurrent map of live sessions.
///
/// Map guards are never held across an await; the per-session conversation
/// is cloned out and locked separately, which serialises turns within a
/// session without blocking other sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with no conversation
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::new());
        tracing::debug!("Created session {}", id);
        id
    }

    /// Snapshot of a session including its rendered history
    pub async fn get(&self, id: Uuid) -> Result<SessionInfo> {
        let (created_at, last_active, documents, conversation) = {
            let session = self.lookup(id)?;
            (
                session.created_at,
                session.last_active,
                session.documents.clone(),
                session.conversation.clone(),
            )
        };

        let history = match &conversation {
            Some(chain) => render_history(chain.lock().await.history()),
            None => Vec::new(),
        };

        Ok(SessionInfo {
            session_id: id,
            created_at,
            last_active,
            ready: conversation.is_some(),
            documents,
            history,
        })
    }

    /// Drop a session and its conversation
    pub fn remove(&self, id: Uuid) -> Result<()> {
        self.sessions
            .remove(&id)
            .map(|_| tracing::debug!("Removed session {}", id))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Replace the session's conversation with a freshly built one
    pub fn install_conversation(
        &self,
        id: Uuid,
        chain: ConversationChain,
        documents: Vec<DocumentSummary>,
    ) -> Result<()> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        session.conversation = Some(Arc::new(Mutex::new(chain)));
        session.documents = documents;
        session.last_active = Utc::now();
        Ok(())
    }

    /// Ask a question in the session's conversation
    pub async fn ask(&self, id: Uuid, question: &str) -> Result<(String, Vec<RenderedMessage>)> {
        let conversation = {
            let mut session = self
                .sessions
                .get_mut(&id)
                .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
            session.last_active = Utc::now();
            session
                .conversation
                .clone()
                .ok_or_else(|| Error::ConversationNotReady(id.to_string()))?
        };

        let mut chain = conversation.lock().await;
        handle_user_input(&mut chain, question).await
    }

    /// Drop every session idle for longer than `ttl`, returning how many went
    pub fn evict_idle(&self, ttl: chrono::Duration) -> usize {
        match Utc::now().checked_sub_signed(ttl) {
            Some(cutoff) => self.evict_inactive_since(cutoff),
            None => 0,
        }
    }

    fn evict_inactive_since(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, session| {
            let keep = session.last_active >= cutoff;
            if !keep {
                tracing::info!("Evicting idle session {}", id);
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Whether the session exists
    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn lookup(&self, id: Uuid) -> Result<dashmap::mapref::one::Ref<'_, Uuid, Session>> {
        self.sessions
            .get(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }
}
