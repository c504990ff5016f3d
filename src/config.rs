//! Configuration management for procurai
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ProcuraiError, Result};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for procurai
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Assistant backend connection settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat behavior
    #[serde(default)]
    pub chat: ChatConfig,
    /// Query suggestion settings
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
}

/// Assistant backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Connection setup timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Whole-request timeout for suggestion lookups in seconds.
    /// The chat stream is not bounded.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Language for new sessions
    #[serde(default)]
    pub default_language: Language,

    /// Colorize terminal output
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_color() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_language: Language::default(),
            color: default_color(),
        }
    }
}

/// Query suggestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    /// Fetch suggestions while typing in chat
    #[serde(default = "default_suggestions_enabled")]
    pub enabled: bool,

    /// Quiet period after the last keystroke before fetching
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum trimmed input length that triggers a fetch
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

fn default_suggestions_enabled() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_min_chars() -> usize {
    3
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            enabled: default_suggestions_enabled(),
            debounce_ms: default_debounce_ms(),
            min_chars: default_min_chars(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProcuraiError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ProcuraiError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("PROCURAI_API_URL") {
            self.server.base_url = url;
        }

        if let Ok(language) = std::env::var("PROCURAI_LANGUAGE") {
            match Language::parse_str(&language) {
                Ok(value) => self.chat.default_language = value,
                Err(_) => tracing::warn!("Invalid PROCURAI_LANGUAGE: {}", language),
            }
        }

        if let Ok(color) = std::env::var("PROCURAI_COLOR") {
            if let Ok(value) = color.parse() {
                self.chat.color = value;
            } else {
                tracing::warn!("Invalid PROCURAI_COLOR: {}", color);
            }
        }

        if let Ok(enabled) = std::env::var("PROCURAI_SUGGESTIONS_ENABLED") {
            if let Ok(value) = enabled.parse() {
                self.suggestions.enabled = value;
            } else {
                tracing::warn!("Invalid PROCURAI_SUGGESTIONS_ENABLED: {}", enabled);
            }
        }

        if let Ok(debounce) = std::env::var("PROCURAI_SUGGESTIONS_DEBOUNCE_MS") {
            if let Ok(value) = debounce.parse() {
                self.suggestions.debounce_ms = value;
            } else {
                tracing::warn!("Invalid PROCURAI_SUGGESTIONS_DEBOUNCE_MS: {}", debounce);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(url) = &cli.api_url {
            tracing::debug!("Using backend URL override: {}", url);
            self.server.base_url = url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ProcuraiError::Config`] naming the first invalid setting
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.server.base_url).map_err(|e| {
            ProcuraiError::Config(format!(
                "server.base_url is not a valid URL ({}): {}",
                self.server.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProcuraiError::Config(format!(
                "server.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.server.connect_timeout_seconds == 0 {
            return Err(ProcuraiError::Config(
                "server.connect_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(ProcuraiError::Config(
                "server.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.suggestions.debounce_ms == 0 || self.suggestions.debounce_ms > 10_000 {
            return Err(ProcuraiError::Config(
                "suggestions.debounce_ms must be between 1 and 10000".to_string(),
            )
            .into());
        }

        if self.suggestions.min_chars == 0 {
            return Err(ProcuraiError::Config(
                "suggestions.min_chars must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: [&str; 5] = [
        "PROCURAI_API_URL",
        "PROCURAI_LANGUAGE",
        "PROCURAI_COLOR",
        "PROCURAI_SUGGESTIONS_ENABLED",
        "PROCURAI_SUGGESTIONS_DEBOUNCE_MS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.server.connect_timeout_seconds, 10);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.chat.default_language, Language::En);
        assert!(config.chat.color);
        assert!(config.suggestions.enabled);
        assert_eq!(config.suggestions.debounce_ms, 300);
        assert_eq!(config.suggestions.min_chars, 3);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_url() {
        let mut config = Config::default();
        config.server.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.server.base_url = "ftp://backend".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_config_validation_zero_timeouts() {
        let mut config = Config::default();
        config.server.connect_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.request_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_debounce_range() {
        let mut config = Config::default();
        config.suggestions.debounce_ms = 0;
        assert!(config.validate().is_err());
        config.suggestions.debounce_ms = 10_001;
        assert!(config.validate().is_err());
        config.suggestions.debounce_ms = 10_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_min_chars() {
        let mut config = Config::default();
        config.suggestions.min_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
server:
  base_url: https://procurement.example.com
chat:
  default_language: ar
  color: false
suggestions:
  debounce_ms: 150
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.base_url, "https://procurement.example.com");
        assert_eq!(config.server.connect_timeout_seconds, 10);
        assert_eq!(config.chat.default_language, Language::Ar);
        assert!(!config.chat.color);
        assert!(config.suggestions.enabled);
        assert_eq!(config.suggestions.debounce_ms, 150);
        assert_eq!(config.suggestions.min_chars, 3);
    }

    #[test]
    fn test_config_from_yaml_rejects_unknown_language() {
        let yaml = "chat:\n  default_language: fr\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let config = Config::load("nonexistent.yaml", &crate::cli::Cli::default()).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8000");
    }

    #[test]
    #[serial]
    fn test_load_reads_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  base_url: http://filehost:1234").unwrap();

        let config = Config::load(
            file.path().to_str().unwrap(),
            &crate::cli::Cli::default(),
        )
        .unwrap();
        assert_eq!(config.server.base_url, "http://filehost:1234");
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml_fails() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [unclosed").unwrap();

        let result = Config::load(file.path().to_str().unwrap(), &crate::cli::Cli::default());
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("PROCURAI_API_URL", "http://envhost:8000");
        std::env::set_var("PROCURAI_LANGUAGE", "arabic");
        std::env::set_var("PROCURAI_COLOR", "false");
        std::env::set_var("PROCURAI_SUGGESTIONS_ENABLED", "false");
        std::env::set_var("PROCURAI_SUGGESTIONS_DEBOUNCE_MS", "500");

        let config = Config::load("nonexistent.yaml", &crate::cli::Cli::default()).unwrap();
        clear_env();

        assert_eq!(config.server.base_url, "http://envhost:8000");
        assert_eq!(config.chat.default_language, Language::Ar);
        assert!(!config.chat.color);
        assert!(!config.suggestions.enabled);
        assert_eq!(config.suggestions.debounce_ms, 500);
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        clear_env();
        std::env::set_var("PROCURAI_LANGUAGE", "klingon");
        std::env::set_var("PROCURAI_SUGGESTIONS_DEBOUNCE_MS", "soon");

        let config = Config::load("nonexistent.yaml", &crate::cli::Cli::default()).unwrap();
        clear_env();

        assert_eq!(config.chat.default_language, Language::En);
        assert_eq!(config.suggestions.debounce_ms, 300);
    }

    #[test]
    #[serial]
    fn test_cli_override_beats_env() {
        clear_env();
        std::env::set_var("PROCURAI_API_URL", "http://envhost:8000");
        let cli = crate::cli::Cli {
            api_url: Some("http://clihost:8000".to_string()),
            ..Default::default()
        };

        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        clear_env();

        assert_eq!(config.server.base_url, "http://clihost:8000");
    }
}
