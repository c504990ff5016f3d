//! Error types for Procurai
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Procurai operations
///
/// This enum covers configuration loading, the HTTP API, decoding of the
/// chat event stream, session persistence and the login gate.
#[derive(Error, Debug)]
pub enum ProcuraiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend API errors (non-success status, malformed body)
    #[error("API error: {0}")]
    Api(String),

    /// A record on the chat event stream could not be decoded
    #[error("Stream decode error: {0}")]
    StreamDecode(String),

    /// The backend reported a failure through an `error` record
    #[error("Chat request failed: {0}")]
    StreamFailed(String),

    /// Key-value storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Attempted to delete the only remaining session
    #[error("You must have at least one chat session")]
    LastSession,

    /// No session with the given identifier exists
    #[error("No chat session with id {0}")]
    UnknownSession(String),

    /// A command that requires login was run without it
    #[error("Not logged in. Run `procurai login` first")]
    NotAuthenticated,

    /// Login attempt with a wrong email/password pair
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for Procurai operations
///
/// Uses `anyhow::Error` so callers can attach context while still being
/// able to downcast to [`ProcuraiError`].
pub type Result<T> = anyhow::Result<T>;
