//! Text of a single log entry.
//!
//! Entry grammar:
//!
//! ```text
//! [<symbol>[ <qualifier>]] <time or time range>[ — <duration>][ <link>]
//! ```
//!
//! The duration substring is what the daily summary parses back, so
//! [`format_duration`] and [`parse_duration`] must stay in lockstep.

use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::LazyLock;

use crate::timer::Mode;

const MS_PER_HOUR: u64 = 3_600_000;

/// Separator in front of the duration.
pub const DURATION_SEPARATOR: &str = " — ";

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2})(?::(\d{2}))?$").unwrap());

/// Render milliseconds as `mm:ss`, or `HH:mm:ss` from one hour up.
/// Sub-second remainders are truncated.
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let (h, m, s) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);
    if ms >= MS_PER_HOUR {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Inverse of [`format_duration`]. Accepts `mm:ss` and `HH:mm:ss`,
/// where the hours may run past two digits.
pub fn parse_duration(s: &str) -> Option<u64> {
    let caps = DURATION_RE.captures(s.trim())?;
    let first: u64 = caps.get(1)?.as_str().parse().ok()?;
    let second: u64 = caps.get(2)?.as_str().parse().ok()?;
    let (h, m, sec) = match caps.get(3) {
        Some(third) => (first, second, third.as_str().parse().ok()?),
        None => (0, first, second),
    };
    if m >= 60 || sec >= 60 {
        return None;
    }
    Some(((h * 60 + m) * 60 + sec) * 1000)
}

/// Qualifier part of an entry tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Start,
    Completed,
    QuitEarly,
    Overtime,
    Unsuccessful,
}

impl EntryKind {
    fn qualifier(self) -> Option<&'static str> {
        match self {
            EntryKind::Start => Some("Start"),
            EntryKind::Completed => None,
            EntryKind::QuitEarly => Some("Quit Early"),
            EntryKind::Overtime => Some("Overtime"),
            EntryKind::Unsuccessful => Some("Unsuccessful"),
        }
    }

    /// Classify a finished session by its active time, compared in
    /// whole seconds since that is the precision the log records.
    pub fn for_finished(elapsed_ms: u64, nominal_ms: u64) -> Self {
        let (elapsed, nominal) = (elapsed_ms / 1000, nominal_ms / 1000);
        match elapsed.cmp(&nominal) {
            std::cmp::Ordering::Less => EntryKind::QuitEarly,
            std::cmp::Ordering::Equal => EntryKind::Completed,
            std::cmp::Ordering::Greater => EntryKind::Overtime,
        }
    }
}

/// `[🍅 Quit Early]` and friends.
pub fn entry_tag(mode: Mode, kind: EntryKind) -> String {
    match kind.qualifier() {
        Some(q) => format!("[{} {q}]", mode.log_symbol()),
        None => format!("[{}]", mode.log_symbol()),
    }
}

pub fn time_of_day(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

pub fn time_range(start: DateTime<Local>, end: DateTime<Local>) -> String {
    format!("{}–{}", time_of_day(start), time_of_day(end))
}

/// One log line, before it is placed in a file.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub mode: Mode,
    pub kind: EntryKind,
    pub time: String,
    pub duration_ms: Option<u64>,
    pub reason: Option<String>,
    pub link: Option<String>,
}

impl LogEntry {
    pub fn render(&self) -> String {
        let mut line = format!("{} {}", entry_tag(self.mode, self.kind), self.time);
        if let Some(ms) = self.duration_ms {
            line.push_str(DURATION_SEPARATOR);
            line.push_str(&format_duration(ms));
        }
        if let Some(reason) = &self.reason {
            let reason = reason.trim();
            if reason.is_empty() {
                line.push_str(" Reason: -");
            } else {
                // Keep the entry on one line.
                line.push_str(" Reason: ");
                line.push_str(&reason.replace(['\r', '\n'], " "));
            }
        }
        if let Some(link) = &self.link {
            line.push(' ');
            line.push_str(link);
        }
        line
    }
}
