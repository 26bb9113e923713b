//! # Pomolog Core Library
//!
//! This library provides the core logic for the Pomolog pomodoro timer and
//! its markdown session log. Every operation is available through the
//! standalone `pomolog` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: a pull-based state machine. Nothing ticks in the
//!   background; remaining and elapsed time are computed from absolute
//!   instants whenever the status is queried
//! - **Log**: one markdown line per event, grouped into daily sections whose
//!   heading totals are re-derived from the section text on every write
//! - **Storage**: TOML configuration and the persisted timer state
//! - **Ports**: clock, confirmation prompts, notifications, notes and the
//!   log store are traits supplied by the host
//!
//! ## Key Components
//!
//! - [`TimerCore`]: Session state machine
//! - [`SessionLogger`]: Log entries and daily totals
//! - [`Config`]: Application configuration management
//! - [`ConfirmationGateway`]: Trait for start and end-of-session prompts

pub mod clock;
pub mod error;
pub mod gateway;
pub mod log;
pub mod notes;
pub mod notify;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, LogStoreError};
pub use gateway::{AutoApprove, ConfirmationGateway, EndChoice};
pub use log::{DailyTotals, FsLogStore, LogStore, MemoryLogStore, SessionLogger};
pub use notes::{NoNotes, NoteRef, NoteResolver};
pub use notify::{NotificationSink, SilentNotifier, SystemNotification};
pub use storage::{Config, LogDestination, StateFile};
pub use timer::{Collaborators, CustomDurations, Mode, Phase, TimerCore, TimerSnapshot, TimerState};
