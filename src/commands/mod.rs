/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive chat with live progress and suggestions
- `ask`: One question, answered in the active session
- `auth`: Login gate
- `sessions`: Session listing and management
- `suggest`: One-off suggestion lookup

Every chat turn goes through [`send_chat_message`], which owns the rule
for what is persisted when.
*/

use crate::api::{ChatApi, ChatRequest};
use crate::error::Result;
use crate::session::{Role, SessionStore};
use crate::stream::{StreamObserver, StreamOutcome};

// Special commands parser for the chat loop
pub mod special_commands;

// Session management commands
pub mod sessions;

/// Send one user message in the active session
///
/// The history sent with the request is the conversation before this
/// message. The user message is stored before the request starts; the
/// assistant reply is stored only when the stream finishes successfully.
///
/// # Errors
///
/// Returns the request or stream failure. Nothing is appended for the
/// assistant in that case.
pub async fn send_chat_message<O>(
    api: &ChatApi,
    store: &mut SessionStore,
    message: &str,
    observer: &mut O,
) -> Result<StreamOutcome>
where
    O: StreamObserver + ?Sized,
{
    let request = ChatRequest {
        message: message.to_string(),
        language: store.active().language,
        history: store.history(),
    };
    store.append_message(Role::User, message)?;

    let outcome = api.send_message(&request, observer).await?;
    store.append_message(Role::Assistant, outcome.response.clone())?;
    Ok(outcome)
}

// Login gate commands
pub mod auth {
    //! Login and logout.
    //!
    //! Missing credentials are prompted for on the terminal.

    use crate::auth;
    use crate::error::{ProcuraiError, Result};
    use crate::notify::Toast;
    use crate::storage::KeyValueStore;
    use rustyline::DefaultEditor;

    fn prompt(label: &str) -> Result<String> {
        let mut rl = DefaultEditor::new()?;
        let line = rl.readline(label)?;
        Ok(line.trim().to_string())
    }

    /// Log in, prompting for whatever was not given
    pub fn run_login(
        kv: &dyn KeyValueStore,
        email: Option<String>,
        password: Option<String>,
        color: bool,
    ) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => prompt("Email: ")?,
        };
        let password = match password {
            Some(password) => password,
            None => prompt("Password: ")?,
        };

        match auth::login(kv, &email, &password) {
            Ok(()) => {
                Toast::login_succeeded().show(color);
                Ok(())
            }
            Err(e)
                if matches!(
                    e.downcast_ref::<ProcuraiError>(),
                    Some(ProcuraiError::InvalidCredentials)
                ) =>
            {
                Toast::login_failed().show(color);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Log out
    pub fn run_logout(kv: &dyn KeyValueStore, color: bool) -> Result<()> {
        auth::logout(kv)?;
        Toast::logged_out().show(color);
        Ok(())
    }
}

// One-shot question
pub mod ask {
    //! Ask a single question in the active session and stream the answer
    //! to stdout.

    use super::*;
    use crate::auth;
    use crate::config::Config;
    use crate::language::Language;
    use crate::notify::Toast;
    use crate::storage::KeyValueStore;
    use crate::view::LiveView;
    use std::sync::Arc;

    /// Run `procurai ask`
    pub async fn run_ask(
        config: &Config,
        kv: Arc<dyn KeyValueStore>,
        message: &str,
        language: Option<Language>,
    ) -> Result<()> {
        auth::require_login(kv.as_ref())?;

        let api = ChatApi::new(&config.server)?;
        let mut store = SessionStore::load(kv, config.chat.default_language)?;
        if let Some(language) = language {
            if language != store.active().language {
                store.set_language(language)?;
            }
        }

        let mut view = LiveView::new(std::io::stdout(), config.chat.color);
        match send_chat_message(&api, &mut store, message, &mut view).await {
            Ok(outcome) => {
                view.finish(&outcome);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Chat request failed: {:#}", e);
                Toast::request_failed().show(config.chat.color);
                Err(e)
            }
        }
    }
}

// One-off suggestion lookup
pub mod suggest {
    //! Print the suggestions the backend has for a partial query.

    use crate::api::{ChatApi, SuggestionRequest, SuggestionSource};
    use crate::config::Config;
    use crate::error::Result;
    use crate::language::Language;
    use crate::session::SessionStore;
    use crate::storage::KeyValueStore;
    use crate::suggestions::SuggestionState;
    use crate::view::render_suggestions;
    use std::sync::Arc;

    /// Run `procurai suggest`
    ///
    /// The active session's user messages are sent as context.
    pub async fn run_suggest(
        config: &Config,
        kv: Arc<dyn KeyValueStore>,
        partial: &str,
        language: Option<Language>,
    ) -> Result<()> {
        crate::auth::require_login(kv.as_ref())?;
        let store = SessionStore::load(kv, config.chat.default_language)?;
        let language = language.unwrap_or(store.active().language);

        let api = ChatApi::new(&config.server)?;
        let suggestions = api
            .fetch_suggestions(&SuggestionRequest {
                partial_input: partial.trim().to_string(),
                language,
                conversation_context: store.user_messages(),
            })
            .await?;

        if suggestions.is_empty() {
            println!("No suggestions for {:?}", partial);
            return Ok(());
        }
        let state = SuggestionState {
            selected: None,
            loading: false,
            suggestions,
        };
        println!("{}", render_suggestions(&state, language, config.chat.color));
        Ok(())
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Runs a readline loop over the active session. While typing, the
    //! suggestion panel fetches completions in the background: the hint
    //! after the cursor shows the highlighted suggestion, Alt-Up/Alt-Down
    //! move the highlight and Tab replaces the input with a suggestion.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::auth;
    use crate::config::Config;
    use crate::error::ProcuraiError;
    use crate::language::Language;
    use crate::notify::Toast;
    use crate::storage::KeyValueStore;
    use crate::suggestions::SuggestionPanel;
    use crate::view::{render_suggestions, LiveView};
    use colored::Colorize;
    use rustyline::completion::{Completer, Pair};
    use rustyline::error::ReadlineError;
    use rustyline::highlight::Highlighter;
    use rustyline::hint::Hinter;
    use rustyline::history::DefaultHistory;
    use rustyline::validate::Validator;
    use rustyline::{
        Cmd, ConditionalEventHandler, Context, Editor, Event, EventContext, EventHandler,
        Helper, KeyCode, KeyEvent, Modifiers, RepeatCount,
    };
    use std::sync::Arc;

    type Panel = SuggestionPanel<ChatApi>;

    /// Readline helper backed by the suggestion panel
    pub struct ChatHelper {
        panel: Option<Arc<Panel>>,
    }

    impl ChatHelper {
        fn active_panel(&self, line: &str) -> Option<&Arc<Panel>> {
            if line.trim_start().starts_with('/') {
                return None;
            }
            self.panel.as_ref()
        }
    }

    impl Hinter for ChatHelper {
        type Hint = String;

        fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
            let panel = self.active_panel(line)?;
            panel.on_input(line);
            if pos < line.len() {
                return None;
            }

            let state = panel.snapshot();
            if state.loading {
                return Some("  …".to_string());
            }
            let index = state.selected?;
            let selected = state.suggestions.get(index)?;
            Some(format!(
                "  › {} ({}/{}, Tab)",
                selected,
                index + 1,
                state.suggestions.len()
            ))
        }
    }

    impl Completer for ChatHelper {
        type Candidate = Pair;

        fn complete(
            &self,
            line: &str,
            _pos: usize,
            _ctx: &Context<'_>,
        ) -> rustyline::Result<(usize, Vec<Pair>)> {
            let Some(panel) = self.active_panel(line) else {
                return Ok((0, Vec::new()));
            };
            let state = panel.snapshot();
            let start = state.selected.unwrap_or(0);
            let candidates = state
                .suggestions
                .iter()
                .cycle()
                .skip(start)
                .take(state.suggestions.len())
                .map(|s| Pair {
                    display: s.clone(),
                    replacement: s.clone(),
                })
                .collect();
            Ok((0, candidates))
        }
    }

    impl Highlighter for ChatHelper {}

    impl Validator for ChatHelper {}

    impl Helper for ChatHelper {}

    struct MoveSelection {
        panel: Arc<Panel>,
        forward: bool,
    }

    impl ConditionalEventHandler for MoveSelection {
        fn handle(
            &self,
            _evt: &Event,
            _n: RepeatCount,
            _positive: bool,
            _ctx: &EventContext,
        ) -> Option<Cmd> {
            if self.forward {
                self.panel.select_next();
            } else {
                self.panel.select_previous();
            }
            Some(Cmd::Repaint)
        }
    }

    enum LoopAction {
        Continue,
        Send(String),
        Exit,
    }

    struct ChatLoop {
        api: ChatApi,
        kv: Arc<dyn KeyValueStore>,
        store: SessionStore,
        panel: Option<Arc<Panel>>,
        color: bool,
    }

    impl ChatLoop {
        fn refresh_panel_context(&self) {
            if let Some(panel) = &self.panel {
                panel.clear();
                panel.set_context(self.store.active().language, self.store.user_messages());
            }
        }

        fn print_banner(&self) -> Result<()> {
            let user = auth::current_user(self.kv.as_ref())?.unwrap_or_default();
            println!(
                "{} {}",
                "Procurement AI".bold(),
                format!("({})", user).dimmed()
            );
            println!(
                "Session: {} [{}]  Type /help for commands\n",
                self.store.active().title,
                self.store.active().language.display_name()
            );
            sessions::print_transcript(self.store.active(), self.color);
            Ok(())
        }

        async fn submit(&mut self, text: &str) {
            if let Some(panel) = &self.panel {
                panel.clear();
            }

            let mut view = LiveView::new(std::io::stdout(), self.color);
            match send_chat_message(&self.api, &mut self.store, text, &mut view).await {
                Ok(outcome) => {
                    view.finish(&outcome);
                    println!();
                }
                Err(e) => {
                    println!();
                    tracing::error!("Chat request failed: {:#}", e);
                    Toast::request_failed().show(self.color);
                }
            }

            self.refresh_panel_context();
        }

        fn handle_command(&mut self, command: SpecialCommand) -> Result<LoopAction> {
            match command {
                SpecialCommand::NewSession => {
                    self.store.create()?;
                    Toast::new_chat().show(self.color);
                    self.refresh_panel_context();
                    sessions::print_transcript(self.store.active(), self.color);
                }
                SpecialCommand::ListSessions => sessions::print_session_table(&self.store),
                SpecialCommand::SwitchSession(id) => {
                    if self.store.switch(&id)? {
                        println!("Switched to {}\n", self.store.active().title);
                        self.refresh_panel_context();
                        sessions::print_transcript(self.store.active(), self.color);
                    } else {
                        eprintln!("{}", ProcuraiError::UnknownSession(id));
                    }
                }
                SpecialCommand::DeleteSession(id) => {
                    if let Err(e) = sessions::delete_session(&mut self.store, &id, self.color) {
                        eprintln!("{}", e);
                    }
                    self.refresh_panel_context();
                }
                SpecialCommand::SetLanguage(language) => {
                    self.set_language(language)?;
                }
                SpecialCommand::ShowSuggestions => match &self.panel {
                    Some(panel) => {
                        let state = panel.snapshot();
                        if state.suggestions.is_empty() && !state.loading {
                            println!("No suggestions yet. Keep typing a question first.");
                        } else {
                            let language = self.store.active().language;
                            println!("{}", render_suggestions(&state, language, self.color));
                        }
                    }
                    None => println!("Suggestions are disabled"),
                },
                SpecialCommand::PickSuggestion(n) => {
                    let picked = self
                        .panel
                        .as_ref()
                        .filter(|panel| panel.select(n - 1))
                        .and_then(|panel| panel.selected());
                    match picked {
                        Some(text) => {
                            println!("{} {}", "›".cyan(), text);
                            return Ok(LoopAction::Send(text));
                        }
                        None => eprintln!("No suggestion number {}", n),
                    }
                }
                SpecialCommand::History => {
                    sessions::print_transcript(self.store.active(), self.color)
                }
                SpecialCommand::Logout => {
                    super::auth::run_logout(self.kv.as_ref(), self.color)?;
                    return Ok(LoopAction::Exit);
                }
                SpecialCommand::Help => print_help(),
                SpecialCommand::Exit => return Ok(LoopAction::Exit),
                SpecialCommand::None => {}
            }
            Ok(LoopAction::Continue)
        }

        fn set_language(&mut self, language: Language) -> Result<()> {
            self.store.set_language(language)?;
            self.refresh_panel_context();
            println!("Language set to {}", language.display_name());
            Ok(())
        }
    }

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `kv` - Store holding sessions and the login flag
    /// * `session` - Session to open instead of the active one
    /// * `language` - Language override for the opened session
    /// * `no_suggestions` - Disable the suggestion panel
    ///
    /// # Errors
    ///
    /// Fails when not logged in, when `session` names no session, or
    /// when the store cannot be read or written. Failed chat requests are
    /// reported and the loop continues.
    pub async fn run_chat(
        config: Config,
        kv: Arc<dyn KeyValueStore>,
        session: Option<String>,
        language: Option<Language>,
        no_suggestions: bool,
    ) -> Result<()> {
        auth::require_login(kv.as_ref())?;
        tracing::info!("Starting interactive chat mode");

        let api = ChatApi::new(&config.server)?;
        let mut store = SessionStore::load(Arc::clone(&kv), config.chat.default_language)?;
        if let Some(id) = session {
            if !store.switch(&id)? {
                return Err(ProcuraiError::UnknownSession(id).into());
            }
        }

        let panel = if config.suggestions.enabled && !no_suggestions {
            Some(Arc::new(SuggestionPanel::new(
                Arc::new(api.clone()),
                &config.suggestions,
            )))
        } else {
            tracing::debug!("Suggestions disabled");
            None
        };

        let mut chat = ChatLoop {
            api,
            kv,
            store,
            panel: panel.clone(),
            color: config.chat.color,
        };
        if let Some(language) = language {
            chat.store.set_language(language)?;
        }
        chat.refresh_panel_context();

        let mut rl: Editor<ChatHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ChatHelper {
            panel: panel.clone(),
        }));
        if let Some(panel) = &panel {
            for (code, forward) in [(KeyCode::Down, true), (KeyCode::Up, false)] {
                rl.bind_sequence(
                    KeyEvent(code, Modifiers::ALT),
                    EventHandler::Conditional(Box::new(MoveSelection {
                        panel: Arc::clone(panel),
                        forward,
                    })),
                );
            }
        }

        chat.print_banner()?;

        loop {
            let prompt = format!("[{}] > ", chat.store.active().language);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let text = match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {
                            rl.add_history_entry(trimmed)?;
                            trimmed.to_string()
                        }
                        Ok(command) => match chat.handle_command(command)? {
                            LoopAction::Continue => continue,
                            LoopAction::Exit => break,
                            LoopAction::Send(text) => text,
                        },
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    };

                    chat.submit(&text).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(panel) = &panel {
            panel.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::NoopObserver;
    use crate::test_utils::{logged_in_store, stream_body, test_config};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_success_persists_both_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&[
                json!({"type": "content", "content": "Hello "}),
                json!({"type": "content", "content": "world"}),
                json!({"type": "complete", "response": "Hello world"}),
            ])))
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let api = ChatApi::new(&config.server).unwrap();
        let mut store = SessionStore::load(logged_in_store(), config.chat.default_language).unwrap();

        send_chat_message(&api, &mut store, "Say hello", &mut NoopObserver)
            .await
            .unwrap();

        let messages = &store.active().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Say hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hello world");
        assert_eq!(store.active().title, "Say hello");
    }

    #[tokio::test]
    async fn test_history_excludes_new_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/stream"))
            .and(body_json(json!({
                "message": "second",
                "language": "en",
                "history": [
                    {"role": "user", "content": "first"},
                    {"role": "assistant", "content": "ok"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&[
                json!({"type": "complete", "response": "done"}),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let api = ChatApi::new(&config.server).unwrap();
        let mut store = SessionStore::load(logged_in_store(), config.chat.default_language).unwrap();
        store.append_message(Role::User, "first").unwrap();
        store.append_message(Role::Assistant, "ok").unwrap();

        send_chat_message(&api, &mut store, "second", &mut NoopObserver)
            .await
            .unwrap();
        assert_eq!(store.active().messages.len(), 4);
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&[
                json!({"type": "content", "content": "partial"}),
                json!({"type": "error", "content": "query failed"}),
            ])))
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let api = ChatApi::new(&config.server).unwrap();
        let mut store = SessionStore::load(logged_in_store(), config.chat.default_language).unwrap();

        let result = send_chat_message(&api, &mut store, "Show high risk projects", &mut NoopObserver).await;
        assert!(result.is_err());

        let messages = &store.active().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }
}
