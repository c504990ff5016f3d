//! Supported conversation languages
//!
//! Each session carries a language tag that is sent with every chat and
//! suggestion request. The tag is stored as its short code (`en`, `ar`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language a conversation is held in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Arabic
    Ar,
}

impl Language {
    /// All supported languages, in menu order
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    /// Short code sent on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ar => "العربية (Arabic)",
        }
    }

    /// Header shown above the suggestion list
    pub fn suggestions_label(&self) -> &'static str {
        match self {
            Self::En => "Smart Suggestions",
            Self::Ar => "اقتراحات ذكية",
        }
    }

    /// Parse a language from its code
    ///
    /// # Examples
    ///
    /// ```
    /// use procurai::language::Language;
    ///
    /// assert_eq!(Language::parse_str("AR").unwrap(), Language::Ar);
    /// assert!(Language::parse_str("fr").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ar" | "arabic" => Ok(Self::Ar),
            other => Err(format!(
                "Unknown language: {}. Supported: {}",
                other,
                Self::ALL
                    .iter()
                    .map(|l| l.code())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_and_names() {
        assert_eq!(Language::parse_str("en").unwrap(), Language::En);
        assert_eq!(Language::parse_str(" Arabic ").unwrap(), Language::Ar);
    }

    #[test]
    fn test_parse_unknown_lists_supported() {
        let err = Language::parse_str("de").unwrap_err();
        assert!(err.contains("en, ar"));
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Ar).unwrap(), "\"ar\"");
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::En);
    }

    #[test]
    fn test_suggestions_label_localized() {
        assert_eq!(Language::En.suggestions_label(), "Smart Suggestions");
        assert_ne!(Language::Ar.suggestions_label(), "Smart Suggestions");
    }
}
