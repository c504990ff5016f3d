use super::event::StreamEvent;
use super::progress::ProgressTracker;
use crate::error::{ProcuraiError, Result};

/// Whether the fold should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// More records may follow
    Continue,
    /// A terminating record was seen
    Done,
}

/// Result of a finished stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Final response text
    pub response: String,
    /// True when the text came from a `complete` record rather than the
    /// concatenated fragments
    pub from_complete: bool,
}

/// Folds stream events into progress state and a response buffer
#[derive(Debug, Default)]
pub struct StreamAssembler {
    progress: ProgressTracker,
    buffer: String,
    final_text: Option<String>,
    done: bool,
}

impl StreamAssembler {
    /// Start a fold with all phases pending and an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event
    ///
    /// Events after a terminating record are ignored.
    ///
    /// # Errors
    ///
    /// An `error` record yields [`ProcuraiError::StreamFailed`] with the
    /// carried message.
    pub fn apply(&mut self, event: StreamEvent) -> Result<Flow> {
        if self.done {
            return Ok(Flow::Done);
        }

        match event {
            StreamEvent::Progress { step, status } => {
                if !self.progress.apply(step, status) {
                    tracing::trace!("Progress {} {} changed nothing", step, status);
                }
                Ok(Flow::Continue)
            }
            StreamEvent::Content { content } => {
                self.buffer.push_str(&content);
                Ok(Flow::Continue)
            }
            ref complete @ StreamEvent::Complete { .. } => {
                self.final_text = complete.final_text().map(str::to_string);
                self.progress.finish_active();
                self.done = true;
                Ok(Flow::Done)
            }
            ref error @ StreamEvent::Error { .. } => {
                self.done = true;
                let message = error.error_message().unwrap_or_default().to_string();
                Err(ProcuraiError::StreamFailed(message).into())
            }
        }
    }

    /// Current progress state
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Fragments received so far, concatenated in arrival order
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether a terminating record was seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Final result: the `complete` payload, or the buffer when the stream
    /// ended without one
    pub fn finish(self) -> StreamOutcome {
        match self.final_text {
            Some(response) => StreamOutcome {
                response,
                from_complete: true,
            },
            None => StreamOutcome {
                response: self.buffer,
                from_complete: false,
            },
        }
    }
}
