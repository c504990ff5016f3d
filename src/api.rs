//! HTTP client for the assistant backend
//!
//! Two endpoints are used:
//!
//! - `POST /api/chat/stream` answers with a `data:` record stream that is
//!   handed to [`crate::stream::consume_stream`].
//! - `POST /api/suggestions` answers with `{"suggestions": [...]}`.
//!
//! The chat stream has no overall timeout: once the read loop starts it
//! runs until the body ends or fails. Only connection setup is bounded.

use crate::config::ServerConfig;
use crate::error::{ProcuraiError, Result};
use crate::language::Language;
use crate::session::HistoryEntry;
use crate::stream::{consume_stream, StreamObserver, StreamOutcome};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Body of a chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// New user message
    pub message: String,
    /// Language the answer should be given in
    pub language: Language,
    /// Prior messages of the conversation, oldest first
    pub history: Vec<HistoryEntry>,
}

/// Body of a suggestion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// What the user has typed so far
    pub partial_input: String,
    /// Language of the conversation
    pub language: Language,
    /// Earlier user messages of the conversation
    pub conversation_context: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Anything that can produce query suggestions
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Suggest completions for a partial query
    async fn fetch_suggestions(&self, request: &SuggestionRequest) -> Result<Vec<String>>;
}

/// Client for the assistant backend
#[derive(Debug, Clone)]
pub struct ChatApi {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl ChatApi {
    /// Build a client from server settings
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(ProcuraiError::from)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(ProcuraiError::from)?;

        Ok(Self {
            client,
            base_url,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `path` to the base URL, keeping any path prefix it has
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProcuraiError::Config(format!("Base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Open the chat stream and return its raw body
    ///
    /// # Errors
    ///
    /// Returns [`ProcuraiError::Api`] for a non-success status and
    /// [`ProcuraiError::Http`] when the request cannot be sent.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>>> {
        let url = self.endpoint("/api/chat/stream")?;
        tracing::debug!(
            "POST {} ({} history entries, language {})",
            url,
            request.history.len(),
            request.language
        );

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(ProcuraiError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcuraiError::Api(format!("Streaming request failed: {}", status)).into());
        }

        Ok(response.bytes_stream())
    }

    /// Send a chat message and consume the streamed answer
    pub async fn send_message<O>(
        &self,
        request: &ChatRequest,
        observer: &mut O,
    ) -> Result<StreamOutcome>
    where
        O: StreamObserver + ?Sized,
    {
        let body = self.stream_chat(request).await?;
        consume_stream(body, observer).await
    }
}

#[async_trait]
impl SuggestionSource for ChatApi {
    async fn fetch_suggestions(&self, request: &SuggestionRequest) -> Result<Vec<String>> {
        let url = self.endpoint("/api/suggestions")?;

        let response = self
            .client
            .post(url)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(ProcuraiError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcuraiError::Api(format!("Suggestion request failed: {}", status)).into());
        }

        let body: SuggestionResponse = response.json().await.map_err(ProcuraiError::from)?;
        tracing::debug!(
            "Received {} suggestions for {:?}",
            body.suggestions.len(),
            request.partial_input
        );
        Ok(body.suggestions)
    }
}
