mod config;
pub mod state_file;

pub use config::{
    Config, DurationsConfig, FlowConfig, LogDestination, LoggingConfig, NotificationsConfig,
};
pub use state_file::StateFile;

use crate::error::ConfigError;
use std::path::PathBuf;

/// Returns the pomolog data directory, creating it if needed.
///
/// Resolution order:
/// - `POMOLOG_HOME`, used verbatim
/// - `~/.config/pomolog-dev/` when `POMOLOG_ENV=dev`
/// - `~/.config/pomolog/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOLOG_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOLOG_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomolog-dev")
            } else {
                base_dir.join("pomolog")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
