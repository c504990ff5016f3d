//! procurai - Terminal client for the procurement assistant
//!
//! This library provides the pieces behind the `procurai` binary: a
//! consumer for the assistant's streamed answers, a persisted session
//! store, debounced query suggestions and terminal rendering.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `stream`: Line decoding and folding of the `data:` event stream
//! - `api`: HTTP client for the chat and suggestion endpoints
//! - `session`: Chat sessions persisted as one JSON document
//! - `storage`: Key-value store (SQLite, in-memory)
//! - `auth`: Login gate
//! - `suggestions`: Debounced suggestion panel
//! - `view`: Markdown, progress and empty-state rendering
//! - `notify`: Toast notifications
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use procurai::{ChatApi, Config, SessionStore};
//! use procurai::commands::send_chat_message;
//! use procurai::storage::{KeyValueStore, SqliteKvStore};
//! use procurai::stream::NoopObserver;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new()?);
//!     let mut store = SessionStore::load(kv, config.chat.default_language)?;
//!     let api = ChatApi::new(&config.server)?;
//!     let outcome = send_chat_message(&api, &mut store, "What is the total budget?", &mut NoopObserver).await?;
//!     println!("{}", outcome.response);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod language;
pub mod notify;
pub mod session;
pub mod storage;
pub mod stream;
pub mod suggestions;
pub mod view;

// Re-export commonly used types
pub use api::{ChatApi, ChatRequest, SuggestionRequest, SuggestionSource};
pub use config::Config;
pub use error::{ProcuraiError, Result};
pub use language::Language;
pub use session::SessionStore;
pub use suggestions::{SuggestionPanel, SuggestionState};

#[cfg(test)]
pub mod test_utils;
