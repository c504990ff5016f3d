use crate::cli::SessionCommand;
use crate::error::{ProcuraiError, Result};
use crate::notify::Toast;
use crate::session::{Session, SessionStore};
use crate::view::{render_empty_state, render_message};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle `procurai sessions ...`
pub fn handle_sessions(command: SessionCommand, store: &mut SessionStore, color: bool) -> Result<()> {
    match command {
        SessionCommand::List => {
            print_session_table(store);
            Ok(())
        }
        SessionCommand::New => {
            let id = store.create()?.id.clone();
            Toast::new_chat().show(color);
            println!("Active session: {}", id);
            Ok(())
        }
        SessionCommand::Switch { id } => {
            if !store.switch(&id)? {
                return Err(ProcuraiError::UnknownSession(id).into());
            }
            println!("Switched to {}", store.active().title);
            Ok(())
        }
        SessionCommand::Delete { id } => delete_session(store, &id, color),
        SessionCommand::Show { id } => {
            let session = match id {
                Some(id) => store
                    .get(&id)
                    .ok_or_else(|| ProcuraiError::UnknownSession(id.clone()))?,
                None => store.active(),
            };
            print_transcript(session, color);
            Ok(())
        }
    }
}

/// Delete a session, turning the refusal to delete the last one into a
/// toast
pub fn delete_session(store: &mut SessionStore, id: &str, color: bool) -> Result<()> {
    match store.delete(id) {
        Ok(true) => {
            Toast::chat_deleted().show(color);
            Ok(())
        }
        Ok(false) => Err(ProcuraiError::UnknownSession(id.to_string()).into()),
        Err(e) if matches!(e.downcast_ref::<ProcuraiError>(), Some(ProcuraiError::LastSession)) => {
            Toast::cannot_delete().show(color);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Print all sessions as a table, marking the active one
pub fn print_session_table(store: &SessionStore) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Language".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for summary in store.summaries() {
        let marker = if summary.id == store.active_id() {
            "*"
        } else {
            ""
        };
        let language = store
            .get(&summary.id)
            .map(|s| s.language.code())
            .unwrap_or("-");
        let updated = chrono::DateTime::from_timestamp_millis(summary.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(prettytable::row![
            marker,
            summary.id,
            summary.title,
            language,
            summary.message_count,
            updated
        ]);
    }

    table.printstd();
}

/// Print the messages of a session, or the welcome text when it has none
pub fn print_transcript(session: &Session, color: bool) {
    if session.messages.is_empty() {
        println!("{}", render_empty_state(session.language));
        return;
    }
    for message in &session.messages {
        println!("{}\n", render_message(message, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::storage::{KeyValueStore, MemoryKvStore};
    use std::sync::Arc;

    fn store_with_sessions(count: usize) -> SessionStore {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKvStore::new());
        let mut store = SessionStore::load(kv, Language::En).unwrap();
        for _ in 1..count {
            store.create().unwrap();
        }
        store
    }

    #[test]
    fn test_delete_last_session_is_refused_without_error() {
        let mut store = store_with_sessions(1);
        let id = store.active_id().to_string();
        delete_session(&mut store, &id, false).unwrap();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.active_id(), id);
    }

    #[test]
    fn test_delete_unknown_session_errors() {
        let mut store = store_with_sessions(2);
        let err = delete_session(&mut store, "missing", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProcuraiError>(),
            Some(ProcuraiError::UnknownSession(_))
        ));
    }

    #[test]
    fn test_switch_unknown_session_errors() {
        let mut store = store_with_sessions(1);
        let result = handle_sessions(
            SessionCommand::Switch {
                id: "missing".to_string(),
            },
            &mut store,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_then_delete_via_commands() {
        let mut store = store_with_sessions(1);
        let first = store.active_id().to_string();
        handle_sessions(SessionCommand::New, &mut store, false).unwrap();
        assert_eq!(store.sessions().len(), 2);
        assert_ne!(store.active_id(), first);

        let second = store.active_id().to_string();
        handle_sessions(SessionCommand::Delete { id: second }, &mut store, false).unwrap();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.active_id(), first);
    }
}
