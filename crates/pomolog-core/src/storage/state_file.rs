//! JSON snapshot of the timer state between CLI invocations.

use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::Result;
use crate::timer::TimerState;

pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// `<data dir>/state.json`
    pub fn open() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("state.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state. A missing or unreadable file yields an idle
    /// timer rather than an error.
    pub fn load(&self) -> TimerState {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(_) => return TimerState::default(),
        };
        match serde_json::from_str(&json) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable timer state");
                TimerState::default()
            }
        }
    }

    pub fn save(&self, state: &TimerState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
