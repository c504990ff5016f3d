//! Chat event stream consumer
//!
//! The chat endpoint answers with newline-delimited records of the form
//! `data: <json>`. This module turns the raw response body into:
//!
//! - a [`ProgressTracker`] with four named phases, and
//! - a response buffer that grows as `content` fragments arrive.
//!
//! Decoding is split in three layers:
//!
//! 1. [`EventLineDecoder`] reassembles transport chunks into lines and
//!    parses each `data:` line into a [`StreamEvent`].
//! 2. [`StreamAssembler`] folds events into progress and buffer state.
//! 3. [`consume_stream`] drives both over an async byte stream and reports
//!    every change to a [`StreamObserver`] for live rendering.
//!
//! Any decode failure or transport error aborts the whole request.

use crate::error::{ProcuraiError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};

pub mod assembler;
pub mod decoder;
pub mod event;
pub mod progress;

pub use assembler::{Flow, StreamAssembler, StreamOutcome};
pub use decoder::EventLineDecoder;
pub use event::{StepStatus, StreamEvent};
pub use progress::{ProgressPhase, ProgressTracker, PHASE_LABELS};

/// Receives live updates while a stream is consumed
pub trait StreamObserver {
    /// Progress changed
    fn on_progress(&mut self, _progress: &ProgressTracker) {}

    /// A fragment arrived; `buffer` is everything received so far
    fn on_content(&mut self, _buffer: &str, _fragment: &str) {}
}

/// Observer that ignores every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StreamObserver for NoopObserver {}

/// Consume a chat response body until it ends or a terminating record
/// arrives
///
/// # Arguments
///
/// * `byte_stream` - Raw response body as a stream of byte chunks
/// * `observer` - Notified after every progress change and fragment
///
/// # Errors
///
/// Fails on a transport error, a record that cannot be decoded, or an
/// `error` record from the backend. No partial result is returned in any
/// of these cases.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use procurai::stream::{consume_stream, NoopObserver};
///
/// let body = "data: {\"type\":\"content\",\"content\":\"Hi\"}\n\n";
/// let chunks = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from(body))]);
/// let outcome = futures::executor::block_on(consume_stream(chunks, &mut NoopObserver)).unwrap();
/// assert_eq!(outcome.response, "Hi");
/// ```
pub async fn consume_stream<S, E, O>(byte_stream: S, observer: &mut O) -> Result<StreamOutcome>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
    O: StreamObserver + ?Sized,
{
    let mut decoder = EventLineDecoder::new();
    let mut assembler = StreamAssembler::new();
    let mut chunks = 0usize;

    futures::pin_mut!(byte_stream);

    while let Some(chunk) = byte_stream.next().await {
        let chunk = chunk.map_err(|e| {
            ProcuraiError::Api(format!("stream interrupted after {} chunks: {}", chunks, e))
        })?;
        chunks += 1;

        for event in decoder.push(&chunk)? {
            if fold(&mut assembler, event, observer)? == Flow::Done {
                tracing::debug!("Stream terminated by record after {} chunks", chunks);
                return Ok(assembler.finish());
            }
        }
    }

    if let Some(event) = decoder.finish()? {
        fold(&mut assembler, event, observer)?;
    }

    tracing::debug!(
        "Stream ended after {} chunks ({} bytes buffered)",
        chunks,
        assembler.buffer().len()
    );
    Ok(assembler.finish())
}

fn fold<O>(assembler: &mut StreamAssembler, event: StreamEvent, observer: &mut O) -> Result<Flow>
where
    O: StreamObserver + ?Sized,
{
    let fragment = match &event {
        StreamEvent::Content { content } => Some(content.clone()),
        _ => None,
    };
    let before = assembler.progress().clone();

    let flow = assembler.apply(event)?;

    if *assembler.progress() != before {
        observer.on_progress(assembler.progress());
    }
    if let Some(fragment) = fragment {
        observer.on_content(assembler.buffer(), &fragment);
    }
    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        progress_updates: usize,
        buffers: Vec<String>,
    }

    impl StreamObserver for Recorder {
        fn on_progress(&mut self, _progress: &ProgressTracker) {
            self.progress_updates += 1;
        }

        fn on_content(&mut self, buffer: &str, _fragment: &str) {
            self.buffers.push(buffer.to_string());
        }
    }

    fn chunks(parts: &[&str]) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> {
        let owned: Vec<_> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        futures::stream::iter(owned)
    }

    #[tokio::test]
    async fn test_reference_example() {
        let body = [
            "data: {\"type\":\"progress\",\"step\":1,\"status\":\"active\"}\n\n",
            "data: {\"type\":\"content\",\"content\":\"Hello \"}\n\n",
            "data: {\"type\":\"progress\",\"step\":1,\"status\":\"completed\"}\n\n",
            "data: {\"type\":\"progress\",\"step\":2,\"status\":\"active\"}\n\n",
            "data: {\"type\":\"content\",\"content\":\"world\"}\n\n",
            "data: {\"type\":\"progress\",\"step\":2,\"status\":\"completed\"}\n\n",
            "data: {\"type\":\"complete\",\"response\":\"Hello world\"}\n\n",
        ];
        let mut recorder = Recorder::default();
        let outcome = consume_stream(chunks(&body), &mut recorder).await.unwrap();

        assert_eq!(outcome.response, "Hello world");
        assert!(outcome.from_complete);
        assert_eq!(recorder.buffers, vec!["Hello ", "Hello world"]);
        assert_eq!(recorder.progress_updates, 4);
    }

    #[tokio::test]
    async fn test_stops_reading_after_complete() {
        let body = [
            "data: {\"type\":\"complete\",\"response\":\"done\"}\n",
            "data: {not even json}\n",
        ];
        let outcome = consume_stream(chunks(&body), &mut NoopObserver)
            .await
            .unwrap();
        assert_eq!(outcome.response, "done");
    }

    #[tokio::test]
    async fn test_error_record_fails_request() {
        let body = [
            "data: {\"type\":\"content\",\"content\":\"part\"}\n",
            "data: {\"type\":\"error\",\"content\":\"backend exploded\",\"done\":true}\n",
        ];
        let err = consume_stream(chunks(&body), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("backend exploded"));
    }

    #[tokio::test]
    async fn test_transport_error_fails_request() {
        let items: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"type\":\"content\",\"content\":\"part\"}\n",
            )),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )),
        ];
        let err = consume_stream(futures::stream::iter(items), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProcuraiError>(),
            Some(ProcuraiError::Api(_))
        ));
    }

    #[tokio::test]
    async fn test_trailing_record_without_newline() {
        let body = [
            "data: {\"type\":\"content\",\"content\":\"a\"}\n",
            "data: {\"type\":\"content\",\"content\":\"b\"}",
        ];
        let outcome = consume_stream(chunks(&body), &mut NoopObserver)
            .await
            .unwrap();
        assert_eq!(outcome.response, "ab");
        assert!(!outcome.from_complete);
    }

    #[tokio::test]
    async fn test_redundant_progress_not_reported() {
        let body = [
            "data: {\"type\":\"progress\",\"step\":2,\"status\":\"completed\"}\n",
            "data: {\"type\":\"progress\",\"step\":1,\"status\":\"active\"}\n",
        ];
        let mut recorder = Recorder::default();
        consume_stream(chunks(&body), &mut recorder).await.unwrap();
        assert_eq!(recorder.progress_updates, 1);
    }
}
