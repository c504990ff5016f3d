use super::event::StreamEvent;
use crate::error::{ProcuraiError, Result};
use bytes::{Buf, BytesMut};

/// Prefix that marks a record line
pub const DATA_MARKER: &str = "data:";

/// Reassembles transport chunks into event records
///
/// The transport delivers arbitrary byte boundaries, so bytes are held
/// until a newline completes the line. Splitting happens on raw bytes,
/// which keeps multi-byte characters that straddle a chunk boundary
/// intact.
#[derive(Debug, Default)]
pub struct EventLineDecoder {
    buffer: BytesMut,
}

impl EventLineDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk and return every record it completes
    ///
    /// # Errors
    ///
    /// Returns [`ProcuraiError::StreamDecode`] for a completed line that is
    /// not valid UTF-8, not valid JSON, or carries an unknown `type`.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos);
            self.buffer.advance(1);
            if let Some(event) = decode_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Decode whatever is left once the stream has ended
    pub fn finish(&mut self) -> Result<Option<StreamEvent>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let line = self.buffer.split();
        decode_line(&line)
    }

    /// Number of bytes waiting for a line terminator
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

/// Decode a single line without its terminator
///
/// Blank lines and lines that do not start with `data:` yield `None`.
pub fn decode_line(raw: &[u8]) -> Result<Option<StreamEvent>> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| ProcuraiError::StreamDecode(format!("invalid UTF-8 in record: {}", e)))?;
    let line = line.strip_suffix('\r').unwrap_or(line);

    let Some(payload) = line.strip_prefix(DATA_MARKER) else {
        if !line.trim().is_empty() {
            tracing::trace!("Skipping non-data line: {}", line);
        }
        return Ok(None);
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    let event = serde_json::from_str(payload)
        .map_err(|e| ProcuraiError::StreamDecode(format!("{}: {}", e, payload)))?;
    Ok(Some(event))
}
