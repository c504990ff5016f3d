use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one progress phase
///
/// Ordered so that a status can only move forward within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Not started
    Pending,
    /// Currently running
    Active,
    /// Finished
    Completed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Active => f.write_str("active"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// One record of the chat event stream
///
/// Records are JSON objects discriminated by their `type` field.
/// Fields the client does not act on (`total`, `message`, `done`) are
/// accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// A progress phase changed status
    Progress {
        /// 1-based phase number
        step: u32,
        /// New status of that phase
        status: StepStatus,
    },

    /// A fragment of the response text
    Content {
        /// Text to append to the running buffer
        content: String,
    },

    /// The final response
    Complete {
        /// Final response text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<String>,
        /// Alternate field some backends use for the final text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },

    /// The backend failed to produce a response
    Error {
        /// Failure description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Alternate field for the failure description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl StreamEvent {
    /// Final text carried by a `complete` record, if any
    pub fn final_text(&self) -> Option<&str> {
        match self {
            Self::Complete { response, content } => response.as_deref().or(content.as_deref()),
            _ => None,
        }
    }

    /// Failure message carried by an `error` record
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { content, message } => Some(
                content
                    .as_deref()
                    .or(message.as_deref())
                    .unwrap_or("unknown error"),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_ignores_extra_fields() {
        let json = r#"{"type":"progress","step":2,"total":4,"status":"active","message":"Searching for information"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            StreamEvent::Progress {
                step: 2,
                status: StepStatus::Active
            }
        );
    }

    #[test]
    fn test_content_ignores_done_flag() {
        let json = r#"{"type":"content","content":"Hello ","done":false}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            StreamEvent::Content {
                content: "Hello ".to_string()
            }
        );
    }

    #[test]
    fn test_complete_prefers_response_field() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"complete","response":"a","content":"b"}"#).unwrap();
        assert_eq!(event.final_text(), Some("a"));

        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"complete","content":"b","done":true}"#).unwrap();
        assert_eq!(event.final_text(), Some("b"));

        let event: StreamEvent = serde_json::from_str(r#"{"type":"complete"}"#).unwrap();
        assert_eq!(event.final_text(), None);
    }

    #[test]
    fn test_error_message_fallbacks() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"error","content":"boom","done":true}"#).unwrap();
        assert_eq!(event.error_message(), Some("boom"));

        let event: StreamEvent = serde_json::from_str(r#"{"type":"error"}"#).unwrap();
        assert_eq!(event.error_message(), Some("unknown error"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = serde_json::from_str::<StreamEvent>(r#"{"type":"heartbeat"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_ordering() {
        assert!(StepStatus::Pending < StepStatus::Active);
        assert!(StepStatus::Active < StepStatus::Completed);
    }
}
