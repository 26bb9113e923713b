//! Session log: entry text, daily sections and the stores they live in.

pub mod format;
pub mod summary;

mod logger;
mod store;

pub use format::{format_duration, parse_duration, EntryKind, LogEntry};
pub use logger::{EntryContext, FinishedSession, SessionLogger, Target};
pub use store::{FsLogStore, LogStore, MemoryLogStore};
pub use summary::DailyTotals;
