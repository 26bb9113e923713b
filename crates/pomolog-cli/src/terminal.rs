//! Terminal-side collaborators: stdin prompts, desktop notifications and
//! vault note lookup.

use async_trait::async_trait;
use chrono::NaiveDate;
use notify_rust::Notification;
use pomolog_core::gateway::{ConfirmationGateway, EndChoice};
use pomolog_core::notify::{end_notification, NotificationSink};
use pomolog_core::storage::LoggingConfig;
use pomolog_core::{Mode, NoteRef, NoteResolver};
use std::fmt::Write as _;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Env var naming the note to link entries to when `--note` is absent.
pub const ACTIVE_NOTE_ENV: &str = "POMOLOG_ACTIVE_NOTE";

/// Prompts on stderr, answers from stdin. End of input declines a start
/// and keeps an ended session running.
pub struct TerminalGateway {
    input: Mutex<Lines<BufReader<Stdin>>>,
    assume_yes: bool,
}

impl TerminalGateway {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            assume_yes,
        }
    }

    async fn ask(&self, prompt: &str) -> Option<String> {
        eprint!("{prompt}");
        let _ = std::io::stderr().flush();
        match self.input.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read answer from stdin");
                None
            }
        }
    }
}

#[async_trait]
impl ConfirmationGateway for TerminalGateway {
    async fn confirm_start(&self, candidate: Mode) -> bool {
        if self.assume_yes {
            return true;
        }
        let question = if candidate == Mode::Pomo {
            "Start pomodoro?"
        } else {
            "Start break?"
        };
        match self.ask(&format!("{question} [Y/n] ")).await {
            Some(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes"),
            None => false,
        }
    }

    async fn confirm_end_of_session(&self, ending: Mode, next: Mode) -> EndChoice {
        let options = EndChoice::options_for(ending);
        let mut menu = format!("\n{ending} finished. [c]ontinue, [n]ext {next}, [q]uit");
        if options.contains(&EndChoice::Unsuccessful) {
            menu.push_str(", [u]nsuccessful");
        }
        menu.push_str(": ");

        loop {
            let Some(answer) = self.ask(&menu).await else {
                return EndChoice::Continue;
            };
            match answer.parse::<EndChoice>() {
                Ok(choice) if options.contains(&choice) => return choice,
                Ok(choice) => eprintln!("{choice:?} is not available here"),
                Err(e) => eprintln!("{e}"),
            }
        }
    }

    async fn prompt_unsuccessful_reason(&self) -> String {
        self.ask("Reason: ")
            .await
            .map(|r| r.trim().to_string())
            .unwrap_or_default()
    }
}

/// Bell plus a desktop notification; notices go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl NotificationSink for DesktopNotifier {
    fn play_sound(&self) {
        eprint!("\x07");
        let _ = std::io::stderr().flush();
    }

    fn show_system_notification(&self, mode: Mode, use_emoji: bool) {
        let Some(n) = end_notification(mode, use_emoji) else {
            return;
        };
        if let Err(e) = Notification::new()
            .summary(&n.title)
            .body(&n.body)
            .appname("pomolog")
            .show()
        {
            tracing::debug!(error = %e, "desktop notification failed");
        }
    }

    fn notice(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// Notes inside the vault directory.
pub struct VaultNotes {
    active: Option<NoteRef>,
    daily_folder: String,
    daily_format: String,
}

impl VaultNotes {
    /// `active` wins over [`ACTIVE_NOTE_ENV`].
    pub fn new(logging: &LoggingConfig, active: Option<String>) -> Self {
        let active = active
            .or_else(|| std::env::var(ACTIVE_NOTE_ENV).ok())
            .filter(|n| !n.trim().is_empty())
            .map(NoteRef::new);
        Self {
            active,
            daily_folder: logging.daily_note_folder.clone(),
            daily_format: logging.daily_note_format.clone(),
        }
    }
}

impl NoteResolver for VaultNotes {
    fn active_note(&self) -> Option<NoteRef> {
        self.active.clone()
    }

    fn daily_note_path(&self, date: NaiveDate) -> Option<String> {
        let mut name = String::new();
        // Bad format strings surface as fmt errors, not panics.
        write!(name, "{}", date.format(&self.daily_format)).ok()?;
        if name.is_empty() {
            return None;
        }
        let folder = self.daily_folder.trim_matches('/');
        Some(if folder.is_empty() {
            format!("{name}.md")
        } else {
            format!("{folder}/{name}.md")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(folder: &str, format: &str) -> LoggingConfig {
        LoggingConfig {
            daily_note_folder: folder.into(),
            daily_note_format: format.into(),
            ..LoggingConfig::default()
        }
    }

    #[test]
    fn daily_note_path_uses_folder_and_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let notes = VaultNotes::new(&logging("Journal/", "%Y-%m-%d"), None);
        assert_eq!(notes.daily_note_path(date).as_deref(), Some("Journal/2026-03-02.md"));

        let notes = VaultNotes::new(&logging("", "%d.%m.%Y"), None);
        assert_eq!(notes.daily_note_path(date).as_deref(), Some("02.03.2026.md"));
    }

    #[test]
    fn explicit_active_note() {
        let notes = VaultNotes::new(&LoggingConfig::default(), Some("Thesis.md".into()));
        assert_eq!(notes.active_note(), Some(NoteRef::new("Thesis.md")));
    }
}
