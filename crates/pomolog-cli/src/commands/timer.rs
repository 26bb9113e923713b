use clap::Subcommand;
use pomolog_core::{
    Collaborators, Config, CustomDurations, FsLogStore, Mode, Phase, StateFile, SystemClock,
    TimerCore,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::terminal::{DesktopNotifier, TerminalGateway, VaultNotes};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session (the next one in the cycle when no mode is given)
    Start {
        /// pomo, short or long
        mode: Option<Mode>,
        /// Skip the start confirmation
        #[arg(long)]
        yes: bool,
        /// Note to link log entries to
        #[arg(long)]
        note: Option<String>,
    },
    /// Start a pomodoro with custom lengths
    Custom {
        /// Pomodoro minutes (defaults to durations.custom_pomo_minutes)
        #[arg(long)]
        pomo: Option<f64>,
        /// Break minutes (defaults to durations.custom_break_minutes)
        #[arg(long = "break")]
        break_minutes: Option<f64>,
        /// Note that receives the log entries of this run
        #[arg(long)]
        log_note: Option<String>,
        #[arg(long)]
        yes: bool,
        #[arg(long)]
        note: Option<String>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Start when idle, otherwise pause or resume
    Toggle {
        #[arg(long)]
        yes: bool,
        #[arg(long)]
        note: Option<String>,
    },
    /// Log the current session and start the next one
    Finish,
    /// Log the current session and stop the timer
    Quit,
    /// Print the timer status
    Status {
        /// Print a JSON snapshot instead of the countdown
        #[arg(long)]
        json: bool,
    },
    /// Show a live countdown until the timer stops (Ctrl-C to leave)
    Watch,
}

impl TimerAction {
    fn assume_yes(&self) -> bool {
        match self {
            TimerAction::Start { yes, .. }
            | TimerAction::Custom { yes, .. }
            | TimerAction::Toggle { yes, .. } => *yes,
            _ => false,
        }
    }

    fn note(&self) -> Option<String> {
        match self {
            TimerAction::Start { note, .. }
            | TimerAction::Custom { note, .. }
            | TimerAction::Toggle { note, .. } => note.clone(),
            _ => None,
        }
    }
}

fn build_timer(config: Config, assume_yes: bool, note: Option<String>) -> Result<TimerCore, Box<dyn std::error::Error>> {
    let vault = config.vault_dir()?;
    let notes = VaultNotes::new(&config.logging, note);
    Ok(TimerCore::new(
        config,
        Collaborators {
            clock: Arc::new(SystemClock),
            gateway: Arc::new(TerminalGateway::new(assume_yes)),
            notifier: Arc::new(DesktopNotifier),
            notes: Arc::new(notes),
            store: Arc::new(FsLogStore::new(vault)),
        },
    ))
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let state_file = StateFile::open()?;
    let mut timer = build_timer(config, action.assume_yes(), action.note())?
        .with_state(state_file.load());

    let result = dispatch(&mut timer, action).await;

    // A failed log write must not lose the transition that preceded it.
    state_file.save(timer.state())?;
    result
}

async fn dispatch(timer: &mut TimerCore, action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Start { mode, .. } => {
            if timer.start(mode).await? {
                println!("{}", timer.status_text());
            } else {
                println!("start cancelled");
            }
        }
        TimerAction::Custom {
            pomo,
            break_minutes,
            log_note,
            ..
        } => {
            let durations = &timer.config().durations;
            let custom = CustomDurations {
                pomo_minutes: pomo.unwrap_or(durations.custom_pomo_minutes),
                break_minutes: break_minutes.unwrap_or(durations.custom_break_minutes),
                log_note,
            };
            if timer.start_custom(custom).await? {
                println!("{}", timer.status_text());
            } else {
                println!("start cancelled");
            }
        }
        TimerAction::Pause => {
            if timer.pause() {
                println!("paused at {}", timer.status_text());
            } else {
                println!("nothing to pause");
            }
        }
        TimerAction::Resume => {
            if timer.resume().await {
                println!("{}", timer.status_text());
            } else {
                println!("nothing to resume");
            }
        }
        TimerAction::Toggle { .. } => {
            timer.toggle().await?;
            println!("{}", timer.status_text());
        }
        TimerAction::Finish => {
            timer.finish_and_start_next().await;
            println!("{}", timer.status_text());
        }
        TimerAction::Quit => {
            timer.quit().await;
            println!("timer stopped");
        }
        TimerAction::Status { json } => {
            let display = timer.query_status().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&timer.snapshot())?);
            } else {
                println!("{display}");
            }
        }
        TimerAction::Watch => watch(timer).await?,
    }
    Ok(())
}

/// Poll the status once a second; this is what notices the end of a
/// session while nobody else is asking.
async fn watch(timer: &mut TimerCore) -> Result<(), Box<dyn std::error::Error>> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let display = timer.query_status().await;
                write!(stdout, "\r{display}    ")?;
                stdout.flush()?;
                if timer.phase() == Phase::Idle {
                    writeln!(stdout)?;
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                writeln!(stdout)?;
                return Ok(());
            }
        }
    }
}
