//! Timer state machine and the time arithmetic behind it.

mod engine;
mod mode;
mod state;

pub use engine::{Collaborators, TimerCore, TimerSnapshot, IDLE_MARKER};
pub use mode::{check_minutes, next_break, nominal_ms, CustomDurations, Mode, MAX_SESSION_MINUTES};
pub use state::{Phase, TimerState};
