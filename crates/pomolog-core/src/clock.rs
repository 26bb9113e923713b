//! Wall-clock source.
//!
//! Every duration in the timer is `end - now` or `now - start`, so the
//! clock is the only place time enters the system.

use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex};

/// Clock trait for testable time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloned handles share the same instant, so a test can keep one handle
/// and give another to the timer.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}
