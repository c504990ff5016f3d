//! Conversation sessions and their persistence
//!
//! [`SessionStore`] owns the ordered list of sessions and the active
//! session pointer. Every mutation rewrites the whole list and the pointer
//! to the backing [`KeyValueStore`]; there is no incremental diffing.
//!
//! The store never lets the list become empty: loading an empty store
//! creates a session, and deleting the last remaining session is refused
//! with [`ProcuraiError::LastSession`].

use crate::error::{ProcuraiError, Result};
use crate::language::Language;
use crate::storage::KeyValueStore;
use std::sync::Arc;

pub mod types;
pub use types::{
    generate_title, HistoryEntry, Message, Role, Session, SessionSummary, DEFAULT_TITLE,
};

/// Key holding the serialized session list
pub const SESSIONS_KEY: &str = "chat_sessions";

/// Key holding the active session identifier
pub const ACTIVE_SESSION_KEY: &str = "active_session_id";

/// Ordered, persisted collection of chat sessions
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    sessions: Vec<Session>,
    active: usize,
    default_language: Language,
    last_id: i64,
}

impl SessionStore {
    /// Load sessions from `kv`
    ///
    /// The active session is the stored pointer when it names a known
    /// session, otherwise the first session in the list. When the store
    /// holds no sessions a new one is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or written.
    /// A corrupt session list is logged and treated as empty.
    pub fn load(kv: Arc<dyn KeyValueStore>, default_language: Language) -> Result<Self> {
        let sessions: Vec<Session> = match kv.get(SESSIONS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable session list: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let last_id = sessions
            .iter()
            .flat_map(|s| {
                std::iter::once(s.id.as_str()).chain(s.messages.iter().map(|m| m.id.as_str()))
            })
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);

        let stored_active = kv.get(ACTIVE_SESSION_KEY)?;

        let mut store = Self {
            kv,
            sessions,
            active: 0,
            default_language,
            last_id,
        };

        if store.sessions.is_empty() {
            tracing::info!("No stored sessions, creating the first one");
            store.create()?;
            return Ok(store);
        }

        match stored_active.and_then(|id| store.position(&id)) {
            Some(index) => store.active = index,
            None => {
                store.active = 0;
                store
                    .kv
                    .set(ACTIVE_SESSION_KEY, &store.sessions[0].id)?;
            }
        }

        tracing::debug!(
            "Loaded {} sessions, active {}",
            store.sessions.len(),
            store.active_id()
        );
        Ok(store)
    }

    /// Start a new empty session, prepend it and make it active
    pub fn create(&mut self) -> Result<&Session> {
        let id = self.next_id();
        let session = Session::new(id.to_string(), self.default_language, now_millis());
        tracing::info!("Created session {}", session.id);
        self.sessions.insert(0, session);
        self.active = 0;
        self.save()?;
        Ok(&self.sessions[0])
    }

    /// Make the session `id` active
    ///
    /// Returns `false` without changing anything when `id` is unknown.
    pub fn switch(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.position(id) else {
            tracing::debug!("Ignoring switch to unknown session {}", id);
            return Ok(false);
        };
        self.active = index;
        self.kv.set(ACTIVE_SESSION_KEY, id)?;
        Ok(true)
    }

    /// Delete the session `id`
    ///
    /// When the deleted session was active, the first remaining session
    /// becomes active. Returns `false` when `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ProcuraiError::LastSession`] when only one session exists;
    /// the store is left unchanged.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        if self.sessions.len() == 1 {
            return Err(ProcuraiError::LastSession.into());
        }

        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        self.sessions.remove(index);
        if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }

        tracing::info!("Deleted session {}", id);
        self.save()?;
        Ok(true)
    }

    /// Append a message to the active session
    ///
    /// The first message of a session still titled "New Chat" names it.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) -> Result<&Message> {
        let id = self.next_id();
        let active = self.active;
        let session = &mut self.sessions[active];

        session.messages.push(Message {
            id: id.to_string(),
            role,
            content: content.into(),
        });
        if session.title == DEFAULT_TITLE {
            session.title = generate_title(&session.messages[0].content);
        }
        session.timestamp = now_millis();

        self.save()?;
        let session = &self.sessions[active];
        Ok(&session.messages[session.messages.len() - 1])
    }

    /// Change the language of the active session
    pub fn set_language(&mut self, language: Language) -> Result<()> {
        let session = &mut self.sessions[self.active];
        session.language = language;
        session.timestamp = now_millis();
        self.save()
    }

    /// The active session
    pub fn active(&self) -> &Session {
        &self.sessions[self.active]
    }

    /// Identifier of the active session
    pub fn active_id(&self) -> &str {
        &self.sessions[self.active].id
    }

    /// All sessions, newest first
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Look up a session by identifier
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Sidebar entries for all sessions
    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(Session::summary).collect()
    }

    /// Role/content history of the active session
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.active().messages.iter().map(HistoryEntry::from).collect()
    }

    /// Contents of the user messages in the active session
    pub fn user_messages(&self) -> Vec<String> {
        self.active()
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .collect()
    }

    /// Rewrite the full session list and the active pointer
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.sessions)?;
        self.kv.set(SESSIONS_KEY, &json)?;
        self.kv.set(ACTIVE_SESSION_KEY, self.active_id())?;
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    fn next_id(&mut self) -> i64 {
        let id = now_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
