use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title given to a session until its first message arrives
pub const DEFAULT_TITLE: &str = "New Chat";

/// Maximum number of characters taken from the first message for a title
pub const TITLE_MAX_CHARS: usize = 50;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person at the keyboard
    User,
    /// The backend assistant
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Time-derived identifier
    pub id: String,
    /// Author of the message
    pub role: Role,
    /// Message text (Markdown for assistant replies)
    pub content: String,
}

/// One persisted conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Time-derived identifier
    pub id: String,
    /// Display title, derived from the first message
    pub title: String,
    /// Last modification time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Messages in arrival order
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Language requests in this session are made in
    #[serde(default)]
    pub language: Language,
}

impl Session {
    /// Create an empty session
    pub fn new(id: impl Into<String>, language: Language, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            timestamp,
            messages: Vec::new(),
            language,
        }
    }

    /// Sidebar view of this session
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            timestamp: self.timestamp,
            message_count: self.messages.len(),
        }
    }
}

/// Sidebar entry for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Last modification time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Number of messages in the session
    pub message_count: usize,
}

/// Role/content pair sent to the backend as conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Derive a session title from its first message
///
/// Keeps the first 50 characters and appends `...` when anything was cut.
///
/// # Examples
///
/// ```
/// use procurai::session::generate_title;
///
/// assert_eq!(generate_title("Total budget?"), "Total budget?");
/// let long = "x".repeat(60);
/// assert_eq!(generate_title(&long), format!("{}...", "x".repeat(50)));
/// ```
pub fn generate_title(first_message: &str) -> String {
    let mut chars = first_message.chars();
    let title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", title)
    } else {
        title
    }
}
