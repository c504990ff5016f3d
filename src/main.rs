//! procurai - Terminal client for the procurement assistant
//!
#![doc = "procurai - Terminal client for the procurement assistant"]
#![doc = "Main entry point for the procurai application."]

use anyhow::Result;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use procurai::cli::{Cli, Commands};
use procurai::commands;
use procurai::config::Config;
use procurai::language::Language;
use procurai::session::SessionStore;
use procurai::storage::{KeyValueStore, SqliteKvStore, STORE_DB_ENV};

/// Set to `json` for one JSON object per log line
const LOG_FORMAT_ENV: &str = "PROCURAI_LOG_FORMAT";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Mirror a CLI store path into the environment so the store
    // initializer picks it up.
    if let Some(db_path) = &cli.store_path {
        std::env::set_var(STORE_DB_ENV, db_path);
        tracing::info!("Using store DB override from CLI: {}", db_path);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    if !config.chat.color {
        colored::control::set_override(false);
    }

    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new()?);
    let color = config.chat.color;

    // Execute command
    match cli.command {
        Commands::Login { email, password } => {
            tracing::info!("Starting login");
            commands::auth::run_login(kv.as_ref(), email, password, color)?;
            Ok(())
        }
        Commands::Logout => {
            commands::auth::run_logout(kv.as_ref(), color)?;
            Ok(())
        }
        Commands::Chat {
            session,
            language,
            no_suggestions,
        } => {
            let language = parse_language(language.as_deref())?;
            if let Some(id) = &session {
                tracing::debug!("Opening session: {}", id);
            }
            commands::chat::run_chat(config, kv, session, language, no_suggestions).await?;
            Ok(())
        }
        Commands::Ask { message, language } => {
            let language = parse_language(language.as_deref())?;
            commands::ask::run_ask(&config, kv, &message, language).await?;
            Ok(())
        }
        Commands::Sessions { command } => {
            tracing::debug!("Starting sessions command");
            procurai::auth::require_login(kv.as_ref())?;
            let mut store = SessionStore::load(kv, config.chat.default_language)?;
            commands::sessions::handle_sessions(command, &mut store, color)?;
            Ok(())
        }
        Commands::Suggest { partial, language } => {
            let language = parse_language(language.as_deref())?;
            commands::suggest::run_suggest(&config, kv, &partial, language).await?;
            Ok(())
        }
    }
}

fn parse_language(value: Option<&str>) -> Result<Option<Language>> {
    value
        .map(|v| {
            Language::parse_str(v)
                .map_err(|e| anyhow::Error::from(procurai::ProcuraiError::Config(e)))
        })
        .transpose()
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "procurai=debug"
    } else {
        "procurai=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
