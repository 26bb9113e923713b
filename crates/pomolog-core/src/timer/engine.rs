//! The session state machine.
//!
//! `TimerCore` owns the [`TimerState`] and is the only thing that mutates
//! it. There is no ticking thread: remaining and elapsed time are derived
//! from absolute instants on demand, and the end of a session is noticed
//! the next time somebody asks for the status.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> AwaitingEndDecision
//!           ^                                  |
//!           |      next / unsuccessful         |  continue
//!           +----------------------------------+--------> Overtime
//!
//! any --quit--> Idle
//! ```

use chrono::{DateTime, Duration, Local};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::mode::{next_break, nominal_ms, CustomDurations, Mode};
use super::state::{Phase, TimerState};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::gateway::{ConfirmationGateway, EndChoice};
use crate::log::{format_duration, EntryContext, FinishedSession, LogStore, SessionLogger};
use crate::notes::{NoteRef, NoteResolver};
use crate::notify::{restart_notice, start_notice, NotificationSink};
use crate::storage::Config;

/// Marker shown by [`TimerCore::query_status`] when no timer is set.
pub const IDLE_MARKER: &str = "🍅";

/// `now + ms`, or an error when that instant is out of chrono's range.
fn session_end(now: DateTime<Local>, ms: u64) -> Result<DateTime<Local>> {
    i64::try_from(ms)
        .ok()
        .and_then(|ms| now.checked_add_signed(Duration::milliseconds(ms)))
        .ok_or_else(|| {
            CoreError::InvalidDuration(format!("{} is too long for a session", format_duration(ms)))
        })
}

/// The host-provided capabilities a [`TimerCore`] runs against.
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub gateway: Arc<dyn ConfirmationGateway>,
    pub notifier: Arc<dyn NotificationSink>,
    pub notes: Arc<dyn NoteResolver>,
    pub store: Arc<dyn LogStore>,
}

/// Serializable view of the timer at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub mode: Mode,
    pub display: String,
    pub remaining_ms: u64,
    pub elapsed_ms: u64,
    pub nominal_ms: Option<u64>,
    pub pomos_since_start: u32,
    pub cycles_since_last_auto_stop: u32,
    pub ends_at: Option<DateTime<Local>>,
    pub active_note: Option<NoteRef>,
    pub custom: bool,
    pub auto_paused: bool,
}

pub struct TimerCore {
    config: Config,
    state: TimerState,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn ConfirmationGateway>,
    notifier: Arc<dyn NotificationSink>,
    notes: Arc<dyn NoteResolver>,
    logger: SessionLogger,
}

impl TimerCore {
    /// Create an idle timer.
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let Collaborators {
            clock,
            gateway,
            notifier,
            notes,
            store,
        } = collaborators;
        let logger = SessionLogger::new(
            config.logging.clone(),
            store,
            clock.clone(),
            notes.clone(),
        );
        Self {
            config,
            state: TimerState::default(),
            clock,
            gateway,
            notifier,
            notes,
            logger,
        }
    }

    /// Continue from a previously saved state.
    pub fn with_state(mut self, state: TimerState) -> Self {
        self.state = state;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    fn nominal_for(&self, mode: Mode) -> u64 {
        nominal_ms(mode, &self.config.durations, self.state.custom.as_ref())
    }

    /// Nominal length of the current session.
    ///
    /// # Panics
    ///
    /// When the timer is idle.
    pub fn nominal_ms(&self) -> u64 {
        self.nominal_for(self.state.mode)
    }

    /// The mode a cycle-derived start would pick.
    pub fn next_mode_in_cycle(&self) -> Mode {
        self.state
            .mode
            .next_in_cycle(self.state.pomos_since_start, self.config.durations.long_break_interval)
    }

    /// The mode that follows the current one once it is counted as done.
    fn next_after_completion(&self) -> Mode {
        match self.state.mode {
            Mode::Pomo => next_break(
                self.state.pomos_since_start + 1,
                self.config.durations.long_break_interval,
            ),
            _ => Mode::Pomo,
        }
    }

    pub fn elapsed_active_ms(&self) -> u64 {
        if self.state.mode == Mode::NoTimer {
            return 0;
        }
        self.state.elapsed_active_ms(self.now(), self.nominal_ms())
    }

    pub fn remaining_ms(&self) -> u64 {
        self.state.remaining_ms(self.now())
    }

    fn status_prefix(&self) -> String {
        if !self.config.notifications.use_emoji || self.state.mode == Mode::NoTimer {
            return String::new();
        }
        format!("{} ", self.state.mode.status_symbol())
    }

    /// Display string for the current state without detecting the end
    /// of the session.
    pub fn status_text(&self) -> String {
        if self.state.mode == Mode::NoTimer {
            return IDLE_MARKER.to_string();
        }
        let prefix = self.status_prefix();
        if self.state.paused {
            let sign = if self.state.in_overtime { "+ " } else { "" };
            return format!("{prefix}{sign}{}", format_duration(self.state.paused_ms));
        }
        let countdown = self.state.countdown_ms(self.now());
        if countdown > 0 {
            return format!("{prefix}{}", format_duration(countdown as u64));
        }
        if self.state.in_overtime {
            return format!("{prefix}+ {}", format_duration(countdown.unsigned_abs()));
        }
        format!("{prefix}{}", format_duration(0))
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let idle = self.state.mode == Mode::NoTimer;
        TimerSnapshot {
            phase: self.phase(),
            mode: self.state.mode,
            display: self.status_text(),
            remaining_ms: self.remaining_ms(),
            elapsed_ms: self.elapsed_active_ms(),
            nominal_ms: (!idle).then(|| self.nominal_ms()),
            pomos_since_start: self.state.pomos_since_start,
            cycles_since_last_auto_stop: self.state.cycles_since_last_auto_stop,
            ends_at: self.state.end_time,
            active_note: self.state.active_note.clone(),
            custom: self.state.custom.is_some(),
            auto_paused: self.state.auto_paused,
        }
    }

    // ── Logging helpers ──────────────────────────────────────────────

    fn entry_context(&self) -> EntryContext<'_> {
        EntryContext {
            active_note: self.state.active_note.as_ref(),
            note_override: self.state.custom.as_ref().and_then(|c| c.log_note.as_deref()),
        }
    }

    fn session_start_slot(&mut self) -> Option<&mut Option<DateTime<Local>>> {
        match self.state.mode {
            Mode::Pomo => Some(&mut self.state.pomo_session_start),
            Mode::ShortBreak | Mode::LongBreak => Some(&mut self.state.break_session_start),
            Mode::NoTimer => None,
        }
    }

    /// Write the finished-session entry for the current session and
    /// forget its logical start.
    async fn log_current(&mut self, elapsed_ms: u64, ended_at: DateTime<Local>) -> Result<()> {
        let mode = self.state.mode;
        if !self.config.logging.enabled || mode == Mode::NoTimer {
            return Ok(());
        }
        let started_at = self
            .session_start_slot()
            .and_then(|slot| slot.take())
            .or(self.state.start_time)
            .unwrap_or(ended_at);
        let session = FinishedSession {
            mode,
            started_at,
            ended_at,
            elapsed_ms,
            nominal_ms: self.nominal_for(mode),
        };
        self.logger.log_finished(&session, self.entry_context()).await
    }

    /// Report a logging failure that must not stop the transition.
    fn report(&self, what: &str, err: &CoreError) {
        warn!(error = %err, "{what}");
        self.notifier.notice(&format!("Could not write the pomodoro log: {err}"));
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// End instant of a session in `mode` opened at `now`. Fails for
    /// lengths that round to zero or overflow.
    fn checked_end(
        &self,
        mode: Mode,
        custom: Option<&CustomDurations>,
        now: DateTime<Local>,
    ) -> Result<DateTime<Local>> {
        let nominal = nominal_ms(mode, &self.config.durations, custom);
        if nominal == 0 {
            return Err(CoreError::InvalidDuration(format!("{mode} has no length")));
        }
        session_end(now, nominal)
    }

    /// Open a session in `mode` right now, without asking. Nothing
    /// changes when the session length is unusable.
    async fn open_session(&mut self, mode: Mode) -> Result<()> {
        let now = self.now();
        let nominal = self.nominal_for(mode);
        let end = self.checked_end(mode, self.state.custom.as_ref(), now)?;

        self.state.mode = mode;
        self.state.in_overtime = false;
        self.state.paused = false;
        self.state.paused_ms = 0;
        self.state.auto_paused = false;
        self.state.start_time = Some(now);
        self.state.end_time = Some(end);
        if let Some(slot) = self.session_start_slot() {
            *slot = Some(now);
        }
        self.state.active_note = self.notes.active_note();

        info!(mode = %mode, nominal_ms = nominal, "session started");
        self.notifier
            .notice(&start_notice(mode, nominal, self.state.custom.as_ref()));
        if self.config.notifications.white_noise {
            self.notifier.start_ambient();
        }

        if self.config.logging.enabled {
            self.logger.log_start(mode, now, self.entry_context()).await?;
        }
        Ok(())
    }

    /// Set up `mode` paused at its full length. Used by auto-stop.
    fn park_session(&mut self, mode: Mode) -> Result<()> {
        let now = self.now();
        let nominal = self.nominal_for(mode);
        let end = self.checked_end(mode, self.state.custom.as_ref(), now)?;

        self.state.mode = mode;
        self.state.in_overtime = false;
        self.state.start_time = Some(now);
        self.state.end_time = Some(end);
        self.state.paused = true;
        self.state.paused_ms = nominal;
        self.state.auto_paused = true;
        self.state.cycles_since_last_auto_stop = 0;
        if self.config.notifications.white_noise {
            self.notifier.stop_ambient();
        }

        info!(mode = %mode, "auto-stop: next session waits for resume");
        Ok(())
    }

    /// Open the session that follows a finished one. A session that
    /// cannot be opened stops the timer.
    async fn open_next(&mut self, next: Mode) {
        match self.open_session(next).await {
            Ok(()) => {}
            Err(e @ CoreError::InvalidDuration(_)) => self.stop_on(&e),
            Err(e) => self.report("failed to log session start", &e),
        }
    }

    fn stop_on(&mut self, err: &CoreError) {
        warn!(error = %err, "cannot open the next session; stopping");
        if self.config.notifications.white_noise {
            self.notifier.stop_ambient();
        }
        self.state = TimerState::default();
        self.notifier.notice(&format!("Timer stopped: {err}"));
    }

    /// Shared tail of the explicit start operations, after confirmation.
    async fn start_confirmed(&mut self, mode: Mode, custom: Option<CustomDurations>) -> Result<()> {
        self.checked_end(mode, custom.as_ref(), self.now())?;
        let current = self.state.mode;
        if current != Mode::NoTimer && current != mode {
            let elapsed = self.elapsed_active_ms();
            let now = self.now();
            debug!(mode = %current, elapsed_ms = elapsed, "closing out running session");
            self.log_current(elapsed, now).await?;
        }
        self.state.custom = custom;
        self.open_session(mode).await
    }

    /// Start `mode`, or the next mode in the cycle.
    ///
    /// Returns `Ok(false)` when the start confirmation was declined, in
    /// which case nothing changed.
    pub async fn start(&mut self, mode: Option<Mode>) -> Result<bool> {
        let candidate = mode.unwrap_or_else(|| self.next_mode_in_cycle());
        if candidate == Mode::NoTimer {
            return Err(CoreError::InvalidMode(candidate.to_string()));
        }
        if self.config.flow.confirm_on_session_start
            && !self.gateway.confirm_start(candidate).await
        {
            debug!(mode = %candidate, "start declined");
            return Ok(false);
        }
        self.start_confirmed(candidate, None).await?;
        Ok(true)
    }

    /// Start a pomodoro with custom lengths. The override applies to
    /// every following pomodoro and break until the timer is quit or
    /// started normally.
    pub async fn start_custom(&mut self, custom: CustomDurations) -> Result<bool> {
        custom.validate().map_err(CoreError::InvalidDuration)?;
        if self.config.flow.confirm_on_session_start
            && !self.gateway.confirm_start(Mode::Pomo).await
        {
            debug!("custom start declined");
            return Ok(false);
        }
        self.start_confirmed(Mode::Pomo, Some(custom)).await?;
        Ok(true)
    }

    /// Pause a running session. Returns `false` when there was nothing
    /// to pause.
    pub fn pause(&mut self) -> bool {
        if self.state.mode == Mode::NoTimer || self.state.paused {
            return false;
        }
        let countdown = self.state.countdown_ms(self.now());
        self.state.paused_ms = if self.state.in_overtime {
            countdown.min(0).unsigned_abs()
        } else {
            countdown.max(0) as u64
        };
        self.state.paused = true;
        if self.config.notifications.white_noise {
            self.notifier.stop_ambient();
        }
        info!(mode = %self.state.mode, paused_ms = self.state.paused_ms, "paused");
        true
    }

    /// Resume a paused session. Returns `false` when not paused.
    ///
    /// A session parked by auto-stop only really starts here, so this is
    /// where its start entry is written.
    pub async fn resume(&mut self) -> bool {
        if !self.state.paused {
            return false;
        }
        let now = self.now();
        // Overtime is open-ended; only normal time is re-anchored.
        if !self.state.in_overtime {
            match session_end(now, self.state.paused_ms) {
                Ok(end) => {
                    self.state.start_time = Some(now);
                    self.state.end_time = Some(end);
                }
                Err(e) => {
                    warn!(error = %e, "cannot resume");
                    return false;
                }
            }
        }
        self.state.paused = false;

        let parked = std::mem::take(&mut self.state.auto_paused);
        if parked {
            self.state.active_note = self.notes.active_note();
            if let Some(slot) = self.session_start_slot() {
                *slot = Some(now);
            }
        }

        self.notifier.notice(&restart_notice(self.state.mode));
        if self.config.notifications.white_noise {
            self.notifier.start_ambient();
        }
        if parked && self.config.logging.enabled {
            if let Err(e) = self.logger.log_start(self.state.mode, now, self.entry_context()).await {
                self.report("failed to log session start", &e);
            }
        }
        info!(mode = %self.state.mode, "resumed");
        true
    }

    /// Start a pomodoro when idle, otherwise flip between paused and
    /// running.
    pub async fn toggle(&mut self) -> Result<bool> {
        match self.phase() {
            Phase::Idle => self.start(Some(Mode::Pomo)).await,
            Phase::Paused => Ok(self.resume().await),
            _ => {
                let paused = self.pause();
                if paused {
                    self.notifier.notice("Timer paused.");
                }
                Ok(paused)
            }
        }
    }

    /// Current display string. Reaching the nominal end is detected
    /// here and handed to [`handle_timer_end`](Self::handle_timer_end).
    pub async fn query_status(&mut self) -> String {
        let mode = self.state.mode;
        if mode == Mode::NoTimer || self.state.paused {
            return self.status_text();
        }
        let ended = self.state.countdown_ms(self.now()) <= 0;
        if ended && !self.state.in_overtime && !self.state.awaiting_end_decision {
            self.handle_timer_end().await;
        }
        self.status_text()
    }

    /// End-of-session handling: notify, then ask, wait or advance
    /// depending on the flow settings.
    pub async fn handle_timer_end(&mut self) {
        let ending = self.state.mode;
        if ending == Mode::NoTimer || self.state.awaiting_end_decision {
            return;
        }

        if self.config.notifications.play_sound_on_end {
            self.notifier.play_sound();
        }
        if self.config.notifications.show_system_notification_on_end {
            self.notifier
                .show_system_notification(ending, self.config.notifications.use_emoji);
        }
        info!(mode = %ending, "session reached its end");

        if self.config.flow.confirm_on_session_end {
            let next = self.next_after_completion();
            self.state.awaiting_end_decision = true;
            let choice = self.gateway.confirm_end_of_session(ending, next).await;
            self.state.awaiting_end_decision = false;
            debug!(?choice, "end of session decided");
            self.apply_end_choice(choice).await;
            return;
        }

        if self.config.flow.manual_advance {
            self.state.in_overtime = true;
            return;
        }

        self.auto_advance().await;
    }

    async fn apply_end_choice(&mut self, choice: EndChoice) {
        match choice {
            EndChoice::Continue => {
                self.state.in_overtime = true;
            }
            EndChoice::Quit => self.quit().await,
            EndChoice::Unsuccessful if self.state.mode == Mode::Pomo => {
                let reason = self.gateway.prompt_unsuccessful_reason().await;
                if self.config.logging.enabled {
                    if let Err(e) = self.logger.log_unsuccessful(&reason, self.entry_context()).await {
                        self.report("failed to log unsuccessful pomodoro", &e);
                    }
                }
                self.state.pomo_session_start = None;
                let next = next_break(
                    self.state.pomos_since_start,
                    self.config.durations.long_break_interval,
                );
                self.open_next(next).await;
            }
            EndChoice::Unsuccessful => {
                warn!(mode = %self.state.mode, "unsuccessful is only offered for pomodoros; moving on");
                let elapsed = self.elapsed_active_ms();
                self.advance(elapsed, self.now()).await;
            }
            EndChoice::Next => {
                let elapsed = self.elapsed_active_ms();
                self.advance(elapsed, self.now()).await;
            }
        }
    }

    /// Count the current session as done, log it and open the next one.
    async fn advance(&mut self, elapsed_ms: u64, ended_at: DateTime<Local>) {
        self.count_completion();
        if let Err(e) = self.log_current(elapsed_ms, ended_at).await {
            self.report("failed to log finished session", &e);
        }
        let next = self.next_mode_in_cycle_after_count();
        self.open_next(next).await;
    }

    fn count_completion(&mut self) {
        if self.state.mode == Mode::Pomo {
            self.state.pomos_since_start += 1;
        } else {
            self.state.cycles_since_last_auto_stop += 1;
        }
        self.state.in_overtime = false;
    }

    /// Cycle step once the counters already include the current session.
    fn next_mode_in_cycle_after_count(&self) -> Mode {
        match self.state.mode {
            Mode::Pomo => next_break(
                self.state.pomos_since_start,
                self.config.durations.long_break_interval,
            ),
            _ => Mode::Pomo,
        }
    }

    /// Unattended end: log the nominal length and move on, unless
    /// auto-stop says the next session has to wait.
    async fn auto_advance(&mut self) {
        let nominal = self.nominal_ms();
        let ended_at = self.state.end_time.unwrap_or_else(|| self.now());
        self.count_completion();
        if let Err(e) = self.log_current(nominal, ended_at).await {
            self.report("failed to log finished session", &e);
        }

        let next = self.next_mode_in_cycle_after_count();
        let flow = &self.config.flow;
        if !flow.auto_start_next && flow.auto_stop_after_cycles <= self.state.cycles_since_last_auto_stop {
            if let Err(e) = self.park_session(next) {
                self.stop_on(&e);
            }
            return;
        }
        self.open_next(next).await;
    }

    /// Log the current session with its true elapsed time and start the
    /// next one without asking.
    pub async fn finish_and_start_next(&mut self) {
        if self.state.mode == Mode::NoTimer {
            self.notifier.notice("No active session to finish.");
            return;
        }
        let elapsed = self.elapsed_active_ms();
        self.advance(elapsed, self.now()).await;
    }

    /// Log the current session and return to idle with zeroed counters.
    pub async fn quit(&mut self) {
        if self.state.mode != Mode::NoTimer {
            let elapsed = self.elapsed_active_ms();
            let now = self.now();
            if let Err(e) = self.log_current(elapsed, now).await {
                self.report("failed to log session on quit", &e);
            }
        }
        if self.config.notifications.white_noise {
            self.notifier.stop_ambient();
        }
        self.state = TimerState::default();
        self.notifier.notice(&start_notice(Mode::NoTimer, 0, None));
        info!("timer quit");
    }
}
