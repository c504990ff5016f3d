//! Short user-facing notifications
//!
//! Toasts go to stderr so they never mix with answer text on stdout.

use colored::Colorize;
use std::fmt;
use std::io::Write;

/// Visual weight of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastVariant {
    /// Informational
    #[default]
    Default,
    /// Something failed or was refused
    Destructive,
}

/// A one-line notification with a title and a description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    /// Informational toast
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    /// Failure toast
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }

    /// Toast shown when a chat request fails for any reason
    pub fn request_failed() -> Self {
        Self::destructive("Error", "Failed to get a response. Please try again.")
    }

    pub fn new_chat() -> Self {
        Self::info("New Chat", "Started a new conversation")
    }

    pub fn chat_deleted() -> Self {
        Self::info("Chat Deleted", "Conversation removed from history")
    }

    pub fn cannot_delete() -> Self {
        Self::destructive("Cannot Delete", "You must have at least one chat session")
    }

    pub fn login_succeeded() -> Self {
        Self::info("Login Successful", "Welcome to Procurement AI Chatbot!")
    }

    pub fn login_failed() -> Self {
        Self::destructive("Login Failed", "Invalid email or password. Please try again.")
    }

    pub fn logged_out() -> Self {
        Self::info("Logged Out", "You have been successfully logged out.")
    }

    /// Render with or without color
    pub fn render(&self, color: bool) -> String {
        if !color {
            return self.to_string();
        }
        let title = match self.variant {
            ToastVariant::Default => self.title.green().bold(),
            ToastVariant::Destructive => self.title.red().bold(),
        };
        format!("{}: {}", title, self.description)
    }

    /// Print to stderr
    pub fn show(&self, color: bool) {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = writeln!(stderr, "{}", self.render(color)) {
            tracing::debug!("Failed to write toast: {}", e);
        }
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
