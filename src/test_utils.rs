//! Test utilities for procurai
//!
//! Helpers for building stores, configurations and chat stream bodies in
//! unit tests.

use crate::auth;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{KeyValueStore, MemoryKvStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Panics
///
/// Panics if the directory cannot be created
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// An empty in-memory store
pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryKvStore::new())
}

/// An in-memory store with the demo account logged in
///
/// # Panics
///
/// Panics if the login is rejected
pub fn logged_in_store() -> Arc<dyn KeyValueStore> {
    let kv = memory_store();
    auth::login(kv.as_ref(), auth::DEMO_EMAIL, auth::DEMO_PASSWORD)
        .expect("demo credentials must be accepted");
    kv
}

/// Default configuration pointed at `base_url`, with a short debounce
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.server.base_url = base_url.to_string();
    config.chat.color = false;
    config.suggestions.debounce_ms = 20;
    config
}

/// Encode events as a chat stream body, one `data:` record per event
pub fn stream_body(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect()
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcuraiError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_logged_in_store() {
        let kv = logged_in_store();
        assert!(auth::is_authenticated(kv.as_ref()).unwrap());
    }

    #[test]
    fn test_stream_body_format() {
        let body = stream_body(&[serde_json::json!({"type": "content", "content": "a"})]);
        assert_eq!(body, "data: {\"content\":\"a\",\"type\":\"content\"}\n\n");
    }

    #[test]
    fn test_test_config_is_valid() {
        let config = test_config("http://127.0.0.1:1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(ProcuraiError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }
}
