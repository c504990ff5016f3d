//! Command-line interface definition for procurai
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for login, chat, one-shot questions, session
//! management and suggestion lookups.

use clap::{Parser, Subcommand};

/// procurai - Terminal client for the procurement assistant
///
/// Ask questions about budgets, projects and requests and watch the
/// answer stream in.
#[derive(Parser, Debug, Clone)]
#[command(name = "procurai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the assistant backend URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Path to the local store database
    #[arg(long)]
    pub store_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for procurai
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out
    Logout,

    /// Start an interactive chat
    Chat {
        /// Session to open instead of the active one
        #[arg(short, long)]
        session: Option<String>,

        /// Answer language (en, ar)
        #[arg(short, long)]
        language: Option<String>,

        /// Disable query suggestions
        #[arg(long)]
        no_suggestions: bool,
    },

    /// Ask a single question in the active session
    Ask {
        /// The question
        message: String,

        /// Answer language (en, ar)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Manage chat sessions
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Fetch query suggestions for partial input
    Suggest {
        /// What has been typed so far
        partial: String,

        /// Language of the query (en, ar)
        #[arg(short, long)]
        language: Option<String>,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions, newest first
    List,

    /// Start a new session and make it active
    New,

    /// Make another session active
    Switch {
        /// Session ID
        id: String,
    },

    /// Delete a session
    Delete {
        /// Session ID
        id: String,
    },

    /// Print the messages of a session
    Show {
        /// Session ID (defaults to the active session)
        id: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_url: None,
            store_path: None,
            command: Commands::Sessions {
                command: SessionCommand::List,
            },
        }
    }
}
