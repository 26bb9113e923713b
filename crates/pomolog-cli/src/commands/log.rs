use clap::Subcommand;
use pomolog_core::log::{format_duration, DailyTotals};
use pomolog_core::{Config, FsLogStore, SessionLogger, StateFile, SystemClock};
use std::sync::Arc;

use crate::terminal::VaultNotes;

#[derive(Subcommand)]
pub enum LogAction {
    /// Print today's totals as the log currently reads
    Today {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recompute today's heading from the entries below it
    Refresh,
}

fn describe(totals: &DailyTotals) -> String {
    format!(
        "🍅 {}, 🏖 {}, Σ {}",
        format_duration(totals.work_ms),
        format_duration(totals.break_ms),
        format_duration(totals.total_ms())
    )
}

pub async fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let vault = config.vault_dir()?;
    let logger = SessionLogger::new(
        config.logging.clone(),
        Arc::new(FsLogStore::new(vault)),
        Arc::new(SystemClock),
        Arc::new(VaultNotes::new(&config.logging, None)),
    );

    // A running custom session may log to its own note.
    let state = StateFile::open()?.load();
    let note_override = state.custom().and_then(|c| c.log_note.clone());
    let note_override = note_override.as_deref();
    let path = logger.target(note_override)?.path().to_string();

    match action {
        LogAction::Today { json } => {
            let totals = logger.today_totals(note_override).await?;
            if json {
                let value = serde_json::json!({
                    "path": path,
                    "totals": totals,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                match totals {
                    Some(t) => println!("{}", describe(&t)),
                    None => println!("nothing logged today in {path}"),
                }
            }
        }
        LogAction::Refresh => match logger.refresh_today(note_override).await? {
            Some(t) => println!("{path}: {}", describe(&t)),
            None => println!("nothing logged today in {path}"),
        },
    }
    Ok(())
}
