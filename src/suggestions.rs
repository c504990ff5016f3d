//! Debounced query suggestions
//!
//! [`SuggestionPanel`] turns keystrokes into suggestion requests. Every
//! input cancels the pending timer and, once the input has been quiet for
//! the debounce period, one request is sent. Each scheduled fetch carries a
//! generation number and its result is only published if no newer input
//! arrived in the meantime.

use crate::api::{SuggestionRequest, SuggestionSource};
use crate::config::SuggestionsConfig;
use crate::language::Language;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable panel state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    /// Current suggestions, best first
    pub suggestions: Vec<String>,
    /// True while a fetch is scheduled or in flight
    pub loading: bool,
    /// Index of the highlighted suggestion
    pub selected: Option<usize>,
}

#[derive(Debug, Clone, Default)]
struct RequestContext {
    language: Language,
    conversation_context: Vec<String>,
}

/// Debounced suggestion fetcher with a selectable result list
pub struct SuggestionPanel<S: SuggestionSource + 'static> {
    source: Arc<S>,
    runtime: Handle,
    debounce: Duration,
    min_chars: usize,
    context: Arc<Mutex<RequestContext>>,
    last_input: Mutex<Option<String>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<SuggestionState>>,
}

impl<S: SuggestionSource + 'static> SuggestionPanel<S> {
    /// Create a panel on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(source: Arc<S>, config: &SuggestionsConfig) -> Self {
        Self::with_handle(source, config, Handle::current())
    }

    /// Create a panel that spawns its timers on `runtime`
    pub fn with_handle(source: Arc<S>, config: &SuggestionsConfig, runtime: Handle) -> Self {
        let (state, _) = watch::channel(SuggestionState::default());
        Self {
            source,
            runtime,
            debounce: Duration::from_millis(config.debounce_ms),
            min_chars: config.min_chars,
            context: Arc::new(Mutex::new(RequestContext::default())),
            last_input: Mutex::new(None),
            pending: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    /// Update the language and earlier user messages sent with requests
    ///
    /// When the context actually changes, the current input is fetched
    /// again with the new context.
    pub fn set_context(&self, language: Language, conversation_context: Vec<String>) {
        let changed = match self.context.lock() {
            Ok(mut ctx) => {
                let changed = ctx.language != language
                    || ctx.conversation_context != conversation_context;
                ctx.language = language;
                ctx.conversation_context = conversation_context;
                changed
            }
            Err(_) => false,
        };
        if !changed {
            return;
        }

        let current = self.last_input.lock().ok().and_then(|last| last.clone());
        if let Some(text) = current {
            self.schedule(&text);
        }
    }

    /// React to the input changing
    ///
    /// The same input twice in a row is ignored. Input shorter than the
    /// minimum length clears the list without a request.
    pub fn on_input(&self, text: &str) {
        {
            let Ok(mut last) = self.last_input.lock() else {
                return;
            };
            if last.as_deref() == Some(text) {
                return;
            }
            *last = Some(text.to_string());
        }
        self.schedule(text);
    }

    fn schedule(&self, text: &str) {
        self.abort_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if text.trim().chars().count() < self.min_chars {
            self.state.send_modify(|s| {
                s.suggestions.clear();
                s.selected = None;
                s.loading = false;
            });
            return;
        }

        self.state.send_modify(|s| s.loading = true);

        let (language, conversation_context) = match self.context.lock() {
            Ok(ctx) => (ctx.language, ctx.conversation_context.clone()),
            Err(_) => (Language::default(), Vec::new()),
        };
        let request = SuggestionRequest {
            partial_input: text.to_string(),
            language,
            conversation_context,
        };

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let debounce = self.debounce;

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = source.fetch_suggestions(&request).await;

            if current.load(Ordering::SeqCst) != generation {
                tracing::trace!("Dropping stale suggestions for {:?}", request.partial_input);
                return;
            }

            let suggestions = match result {
                Ok(suggestions) => suggestions,
                Err(e) => {
                    tracing::error!("Error fetching suggestions: {}", e);
                    Vec::new()
                }
            };
            state.send_modify(|s| {
                s.selected = if suggestions.is_empty() { None } else { Some(0) };
                s.suggestions = suggestions;
                s.loading = false;
            });
        });

        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(handle);
        }
    }

    /// Move the highlight down, stopping at the last suggestion
    pub fn select_next(&self) {
        self.state.send_modify(|s| {
            if s.suggestions.is_empty() {
                return;
            }
            let last = s.suggestions.len() - 1;
            s.selected = Some(match s.selected {
                None => 0,
                Some(i) => (i + 1).min(last),
            });
        });
    }

    /// Move the highlight up; above the first suggestion nothing is selected
    pub fn select_previous(&self) {
        self.state.send_modify(|s| {
            s.selected = match s.selected {
                None | Some(0) => None,
                Some(i) => Some(i - 1),
            };
        });
    }

    /// Highlight a specific suggestion
    ///
    /// Returns `false` when the index is out of range.
    pub fn select(&self, index: usize) -> bool {
        let mut found = false;
        self.state.send_modify(|s| {
            if index < s.suggestions.len() {
                s.selected = Some(index);
                found = true;
            }
        });
        found
    }

    /// Text of the highlighted suggestion
    pub fn selected(&self) -> Option<String> {
        let state = self.state.borrow();
        state
            .selected
            .and_then(|i| state.suggestions.get(i))
            .cloned()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SuggestionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.state.subscribe()
    }

    /// Stop the pending timer and forget the last input
    ///
    /// A fetch already in flight is discarded when it returns.
    pub fn cancel(&self) {
        self.abort_pending();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_input.lock() {
            *last = None;
        }
        self.state.send_modify(|s| s.loading = false);
    }

    /// Drop the list and the highlight
    pub fn clear(&self) {
        self.cancel();
        self.state.send_modify(|s| {
            s.suggestions.clear();
            s.selected = None;
        });
    }

    fn abort_pending(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

impl<S: SuggestionSource + 'static> Drop for SuggestionPanel<S> {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
