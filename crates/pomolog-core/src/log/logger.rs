//! Session logger: turns timer events into log lines and keeps the
//! daily heading of the destination up to date.

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::debug;

use super::format::{time_of_day, time_range, EntryKind, LogEntry};
use super::store::LogStore;
use super::summary::{self, DailyTotals};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::notes::{NoteRef, NoteResolver};
use crate::storage::{LogDestination, LoggingConfig};
use crate::timer::Mode;

/// Where a line ends up and how it is placed there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Inside today's daily section, with heading totals.
    Daily(String),
    /// Prepended to the top of the file.
    Prepend(String),
}

impl Target {
    pub fn path(&self) -> &str {
        match self {
            Target::Daily(p) | Target::Prepend(p) => p,
        }
    }
}

/// Per-entry context supplied by the timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryContext<'a> {
    pub active_note: Option<&'a NoteRef>,
    /// Custom-run note that replaces the configured destination.
    pub note_override: Option<&'a str>,
}

/// A session that has ended and is about to be written.
#[derive(Debug, Clone)]
pub struct FinishedSession {
    pub mode: Mode,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub elapsed_ms: u64,
    pub nominal_ms: u64,
}

pub struct SessionLogger {
    config: LoggingConfig,
    store: Arc<dyn LogStore>,
    clock: Arc<dyn Clock>,
    notes: Arc<dyn NoteResolver>,
}

impl SessionLogger {
    pub fn new(
        config: LoggingConfig,
        store: Arc<dyn LogStore>,
        clock: Arc<dyn Clock>,
        notes: Arc<dyn NoteResolver>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            notes,
        }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Destination for regular entries.
    pub fn target(&self, note_override: Option<&str>) -> Result<Target> {
        if let Some(note) = note_override.filter(|n| !n.trim().is_empty()) {
            return Ok(Target::Daily(note.to_string()));
        }
        match self.config.destination {
            LogDestination::FixedFile => Ok(Target::Prepend(self.config.log_file.clone())),
            LogDestination::CustomNote => Ok(Target::Daily(self.config.log_note.clone())),
            LogDestination::ActiveDailyNote => {
                let today = self.clock.now().date_naive();
                self.notes
                    .daily_note_path(today)
                    .map(Target::Daily)
                    .ok_or_else(|| CoreError::NoDestination(format!("no daily note for {today}")))
            }
        }
    }

    /// Destination for unsuccessful-pomodoro entries.
    pub fn unsuccessful_target(&self, note_override: Option<&str>) -> Result<Target> {
        match self.config.unsuccessful_log_file.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(Target::Prepend(path.to_string())),
            _ => self.target(note_override),
        }
    }

    fn link(&self, ctx: &EntryContext<'_>) -> Option<String> {
        if !self.config.include_active_note_link {
            return None;
        }
        ctx.active_note.map(|note| self.notes.markdown_link(note))
    }

    pub async fn log_start(&self, mode: Mode, at: DateTime<Local>, ctx: EntryContext<'_>) -> Result<()> {
        let entry = LogEntry {
            mode,
            kind: EntryKind::Start,
            time: time_of_day(at),
            duration_ms: None,
            reason: None,
            link: self.link(&ctx),
        };
        let target = self.target(ctx.note_override)?;
        self.write_entry(&target, &entry.render()).await
    }

    pub async fn log_finished(&self, session: &FinishedSession, ctx: EntryContext<'_>) -> Result<()> {
        let entry = LogEntry {
            mode: session.mode,
            kind: EntryKind::for_finished(session.elapsed_ms, session.nominal_ms),
            time: time_range(session.started_at, session.ended_at),
            duration_ms: Some(session.elapsed_ms),
            reason: None,
            link: self.link(&ctx),
        };
        let target = self.target(ctx.note_override)?;
        self.write_entry(&target, &entry.render()).await
    }

    pub async fn log_unsuccessful(&self, reason: &str, ctx: EntryContext<'_>) -> Result<()> {
        let entry = LogEntry {
            mode: Mode::Pomo,
            kind: EntryKind::Unsuccessful,
            time: time_of_day(self.clock.now()),
            duration_ms: None,
            reason: Some(reason.to_string()),
            link: self.link(&ctx),
        };
        let target = self.unsuccessful_target(ctx.note_override)?;
        self.write_entry(&target, &entry.render()).await
    }

    async fn ensure_exists(&self, path: &str) -> Result<()> {
        if !self.store.exists(path).await {
            debug!(path, "creating log file");
            self.store.create(path).await?;
        }
        Ok(())
    }

    /// Read-modify-write of one destination.
    pub async fn write_entry(&self, target: &Target, line: &str) -> Result<()> {
        let path = target.path();
        self.ensure_exists(path).await?;
        let content = self.store.read(path).await?;

        let updated = match target {
            Target::Prepend(_) => format!("{line}\n{content}"),
            Target::Daily(_) => {
                let today = self.clock.now().date_naive();
                let with_entry = summary::insert_entry(&content, today, line);
                summary::refresh(&with_entry, today)
            }
        };

        self.store.write(path, &updated).await?;
        debug!(path, line, "log entry written");
        Ok(())
    }

    /// Recompute today's heading in the regular destination without
    /// adding an entry. Returns the totals, or `None` when today has no
    /// section yet.
    pub async fn refresh_today(&self, note_override: Option<&str>) -> Result<Option<DailyTotals>> {
        let target = self.target(note_override)?;
        let Target::Daily(path) = target else {
            return Ok(None);
        };
        if !self.store.exists(&path).await {
            return Ok(None);
        }
        let today = self.clock.now().date_naive();
        let content = self.store.read(&path).await?;
        let refreshed = summary::refresh(&content, today);
        if refreshed != content {
            self.store.write(&path, &refreshed).await?;
        }
        Ok(summary::section_totals(&refreshed, today))
    }

    /// Today's totals as the log currently reads.
    pub async fn today_totals(&self, note_override: Option<&str>) -> Result<Option<DailyTotals>> {
        let target = self.target(note_override)?;
        let Target::Daily(path) = target else {
            return Ok(None);
        };
        if !self.store.exists(&path).await {
            return Ok(None);
        }
        let content = self.store.read(&path).await?;
        Ok(summary::section_totals(&content, self.clock.now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::log::store::MemoryLogStore;
    use crate::notes::NoNotes;
    use chrono::{Duration, NaiveDate, TimeZone};

    struct DailyNotes;

    impl NoteResolver for DailyNotes {
        fn active_note(&self) -> Option<NoteRef> {
            None
        }

        fn daily_note_path(&self, date: NaiveDate) -> Option<String> {
            Some(format!("Daily/{}.md", date.format("%Y-%m-%d")))
        }
    }

    fn nine() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn logger_with(
        config: LoggingConfig,
        notes: Arc<dyn NoteResolver>,
    ) -> (SessionLogger, Arc<MemoryLogStore>, ManualClock) {
        let store = Arc::new(MemoryLogStore::new());
        let clock = ManualClock::new(nine());
        let logger = SessionLogger::new(config, store.clone(), Arc::new(clock.clone()), notes);
        (logger, store, clock)
    }

    fn pomo(start: DateTime<Local>, minutes: i64) -> FinishedSession {
        FinishedSession {
            mode: Mode::Pomo,
            started_at: start,
            ended_at: start + Duration::minutes(minutes),
            elapsed_ms: (minutes * 60_000) as u64,
            nominal_ms: 25 * 60_000,
        }
    }

    #[tokio::test]
    async fn daily_totals_for_two_pomos_and_a_break() {
        let (logger, store, clock) = logger_with(LoggingConfig::default(), Arc::new(NoNotes));
        let ctx = EntryContext::default();

        logger.log_finished(&pomo(nine(), 25), ctx).await.unwrap();
        let brk = FinishedSession {
            mode: Mode::ShortBreak,
            started_at: nine() + Duration::minutes(25),
            ended_at: nine() + Duration::minutes(30),
            elapsed_ms: 5 * 60_000,
            nominal_ms: 5 * 60_000,
        };
        logger.log_finished(&brk, ctx).await.unwrap();
        clock.advance(Duration::minutes(50));
        logger.log_finished(&pomo(nine() + Duration::minutes(30), 20), ctx).await.unwrap();

        let content = store.contents("Pomodoro.md").unwrap();
        let heading = content.lines().next().unwrap();
        assert_eq!(
            heading,
            "## Pomodoro 2026-03-02 (Monday) — 🍅 45:00, 🏖 05:00, Σ 50:00"
        );
        assert!(content.contains("[🍅 Quit Early] 09:30:00–09:50:00 — 20:00"));
    }

    #[tokio::test]
    async fn fixed_file_prepends_without_heading() {
        let config = LoggingConfig {
            destination: LogDestination::FixedFile,
            ..LoggingConfig::default()
        };
        let (logger, store, _clock) = logger_with(config, Arc::new(NoNotes));
        logger.log_start(Mode::Pomo, nine(), EntryContext::default()).await.unwrap();
        logger.log_finished(&pomo(nine(), 25), EntryContext::default()).await.unwrap();

        let content = store.contents("Pomodoro Log.md").unwrap();
        assert_eq!(
            content,
            "[🍅] 09:00:00–09:25:00 — 25:00\n[🍅 Start] 09:00:00\n"
        );
    }

    #[tokio::test]
    async fn daily_note_destination_uses_resolver() {
        let config = LoggingConfig {
            destination: LogDestination::ActiveDailyNote,
            ..LoggingConfig::default()
        };
        let (logger, store, _clock) = logger_with(config, Arc::new(DailyNotes));
        logger.log_start(Mode::Pomo, nine(), EntryContext::default()).await.unwrap();
        let content = store.contents("Daily/2026-03-02.md").unwrap();
        assert!(content.starts_with("## Pomodoro 2026-03-02 (Monday)"));
    }

    #[tokio::test]
    async fn daily_note_destination_without_daily_notes_fails() {
        let config = LoggingConfig {
            destination: LogDestination::ActiveDailyNote,
            ..LoggingConfig::default()
        };
        let (logger, _store, _clock) = logger_with(config, Arc::new(NoNotes));
        let result = logger.log_start(Mode::Pomo, nine(), EntryContext::default()).await;
        assert!(matches!(result, Err(CoreError::NoDestination(_))));
    }

    #[tokio::test]
    async fn unsuccessful_entries_go_to_their_own_file() {
        let config = LoggingConfig {
            unsuccessful_log_file: Some("Failed.md".into()),
            ..LoggingConfig::default()
        };
        let (logger, store, _clock) = logger_with(config, Arc::new(NoNotes));
        logger.log_unsuccessful("meeting", EntryContext::default()).await.unwrap();
        logger.log_unsuccessful("", EntryContext::default()).await.unwrap();
        assert_eq!(
            store.contents("Failed.md").unwrap(),
            "[🍅 Unsuccessful] 09:00:00 Reason: -\n[🍅 Unsuccessful] 09:00:00 Reason: meeting\n"
        );
        assert!(store.contents("Pomodoro.md").is_none());
    }

    #[tokio::test]
    async fn note_override_and_link() {
        let config = LoggingConfig {
            include_active_note_link: true,
            ..LoggingConfig::default()
        };
        let (logger, store, _clock) = logger_with(config, Arc::new(NoNotes));
        let note = NoteRef::new("projects/Thesis.md");
        let ctx = EntryContext {
            active_note: Some(&note),
            note_override: Some("Custom.md"),
        };
        logger.log_start(Mode::Pomo, nine(), ctx).await.unwrap();
        let content = store.contents("Custom.md").unwrap();
        assert!(content.contains("[🍅 Start] 09:00:00 [[Thesis]]"));
    }

    #[tokio::test]
    async fn refresh_today_repairs_a_hand_edited_heading() {
        let (logger, store, _clock) = logger_with(LoggingConfig::default(), Arc::new(NoNotes));
        logger.log_finished(&pomo(nine(), 25), EntryContext::default()).await.unwrap();
        let broken = store
            .contents("Pomodoro.md")
            .unwrap()
            .replace("🍅 25:00", "🍅 99:00");
        store.write("Pomodoro.md", &broken).await.unwrap();

        let totals = logger.refresh_today(None).await.unwrap().unwrap();
        assert_eq!(totals.work_ms, 25 * 60_000);
        assert!(store.contents("Pomodoro.md").unwrap().contains("🍅 25:00, 🏖 00:00, Σ 25:00"));
        assert_eq!(logger.today_totals(None).await.unwrap(), Some(totals));
    }

    #[tokio::test]
    async fn refresh_today_without_log_is_none() {
        let (logger, _store, _clock) = logger_with(LoggingConfig::default(), Arc::new(NoNotes));
        assert_eq!(logger.refresh_today(None).await.unwrap(), None);
    }
}
