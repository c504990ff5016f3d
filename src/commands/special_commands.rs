//! Special commands parser for interactive chat
//!
//! Lines starting with `/` manage sessions, language and suggestions
//! instead of being sent to the assistant. Command names are
//! case-insensitive; arguments keep their case.

use crate::language::Language;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new session and make it active
    NewSession,

    /// List sessions, newest first
    ListSessions,

    /// Make another session active
    SwitchSession(String),

    /// Delete a session
    DeleteSession(String),

    /// Change the language of the active session
    SetLanguage(Language),

    /// Show the suggestions for the last typed input
    ShowSuggestions,

    /// Send the n-th suggestion (1-based) as the next message
    PickSuggestion(usize),

    /// Print the messages of the active session
    History,

    /// Sign out and leave the chat
    Logout,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the assistant.
    None,
}

fn split_command(trimmed: &str) -> (String, &str) {
    match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (trimmed.to_lowercase(), ""),
    }
}

fn required<'a>(command: &str, usage: &str, arg: &'a str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(arg)
    }
}

fn no_argument(command: &str, arg: &str, parsed: SpecialCommand) -> Result<SpecialCommand, CommandError> {
    if arg.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        })
    }
}

/// Parse user input into a special command
///
/// # Arguments
///
/// * `input` - The user input string
///
/// # Returns
///
/// Returns `SpecialCommand::None` for regular messages
///
/// # Errors
///
/// Returns [`CommandError`] for an unknown command or a bad argument
///
/// # Examples
///
/// ```
/// use procurai::commands::special_commands::{parse_special_command, SpecialCommand};
/// use procurai::language::Language;
///
/// assert_eq!(parse_special_command("/lang ar").unwrap(), SpecialCommand::SetLanguage(Language::Ar));
/// assert_eq!(parse_special_command("Show high risk projects").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = split_command(trimmed);
    match name.as_str() {
        "/new" => no_argument("/new", arg, SpecialCommand::NewSession),
        "/sessions" => no_argument("/sessions", arg, SpecialCommand::ListSessions),
        "/switch" => {
            let id = required("/switch", "/switch <session_id>", arg)?;
            Ok(SpecialCommand::SwitchSession(id.to_string()))
        }
        "/delete" => {
            let id = required("/delete", "/delete <session_id>", arg)?;
            Ok(SpecialCommand::DeleteSession(id.to_string()))
        }
        "/lang" | "/language" => {
            let code = required("/lang", "/lang <en|ar>", arg)?;
            Language::parse_str(code)
                .map(SpecialCommand::SetLanguage)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/lang".to_string(),
                    arg: code.to_string(),
                })
        }
        "/suggest" | "/suggestions" => no_argument("/suggest", arg, SpecialCommand::ShowSuggestions),
        "/pick" => {
            let n = required("/pick", "/pick <number>", arg)?;
            match n.parse::<usize>() {
                Ok(index) if index > 0 => Ok(SpecialCommand::PickSuggestion(index)),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/pick".to_string(),
                    arg: n.to_string(),
                }),
            }
        }
        "/history" => no_argument("/history", arg, SpecialCommand::History),
        "/logout" => no_argument("/logout", arg, SpecialCommand::Logout),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSIONS:
  /new              - Start a new conversation
  /sessions         - List conversations
  /switch <id>      - Continue another conversation
  /delete <id>      - Delete a conversation
  /history          - Show the messages of this conversation

LANGUAGE:
  /lang <en|ar>     - Answer in English or Arabic

SUGGESTIONS:
  /suggest          - Show suggestions for what you typed last
  /pick <n>         - Send suggestion number n
  <Tab>             - Replace the input with the highlighted suggestion

OTHER:
  /logout           - Sign out and leave
  /help             - Show this help message
  /exit, exit, quit - Leave the chat
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("What is the total budget?").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(
            parse_special_command("exit the building").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "QUIT", "/exit", "/quit", "  exit  "] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(
            parse_special_command("/new").unwrap(),
            SpecialCommand::NewSession
        );
        assert_eq!(
            parse_special_command("/Sessions").unwrap(),
            SpecialCommand::ListSessions
        );
        assert_eq!(
            parse_special_command("/switch 1718000000000").unwrap(),
            SpecialCommand::SwitchSession("1718000000000".to_string())
        );
        assert_eq!(
            parse_special_command("/DELETE  abc").unwrap(),
            SpecialCommand::DeleteSession("abc".to_string())
        );
    }

    #[test]
    fn test_switch_without_id() {
        assert_eq!(
            parse_special_command("/switch").unwrap_err(),
            CommandError::MissingArgument {
                command: "/switch".to_string(),
                usage: "/switch <session_id>".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_language() {
        assert_eq!(
            parse_special_command("/lang en").unwrap(),
            SpecialCommand::SetLanguage(Language::En)
        );
        assert_eq!(
            parse_special_command("/lang Arabic").unwrap(),
            SpecialCommand::SetLanguage(Language::Ar)
        );
        assert!(matches!(
            parse_special_command("/lang fr"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/lang"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_pick() {
        assert_eq!(
            parse_special_command("/pick 2").unwrap(),
            SpecialCommand::PickSuggestion(2)
        );
        assert!(parse_special_command("/pick 0").is_err());
        assert!(parse_special_command("/pick two").is_err());
    }

    #[test]
    fn test_no_argument_commands_reject_arguments() {
        assert_eq!(
            parse_special_command("/new now").unwrap_err(),
            CommandError::UnsupportedArgument {
                command: "/new".to_string(),
                arg: "now".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_special_command("/frobnicate").unwrap_err(),
            CommandError::UnknownCommand("/frobnicate".to_string())
        );
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
        assert_eq!(
            parse_special_command("/history").unwrap(),
            SpecialCommand::History
        );
        assert_eq!(
            parse_special_command("/logout").unwrap(),
            SpecialCommand::Logout
        );
        assert_eq!(
            parse_special_command("/suggest").unwrap(),
            SpecialCommand::ShowSuggestions
        );
    }
}
