//! Timer state and the time arithmetic on top of it.
//!
//! The state stores absolute instants only. Remaining and elapsed time
//! are derived from them and a caller-supplied `now`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::mode::{CustomDurations, Mode};
use crate::notes::NoteRef;

/// Which of the mutually exclusive timer phases holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    /// Running past the nominal end at the user's request.
    Overtime,
    /// An end-of-session prompt is outstanding.
    AwaitingEndDecision,
}

/// Everything the timer knows. Owned and mutated by
/// [`TimerCore`](super::TimerCore).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerState {
    pub(crate) mode: Mode,
    pub(crate) start_time: Option<DateTime<Local>>,
    pub(crate) end_time: Option<DateTime<Local>>,
    pub(crate) paused: bool,
    /// Remaining time when paused in normal time; elapsed overtime when
    /// paused in overtime.
    pub(crate) paused_ms: u64,
    pub(crate) in_overtime: bool,
    #[serde(skip)]
    pub(crate) awaiting_end_decision: bool,
    pub(crate) pomos_since_start: u32,
    pub(crate) cycles_since_last_auto_stop: u32,
    pub(crate) pomo_session_start: Option<DateTime<Local>>,
    pub(crate) break_session_start: Option<DateTime<Local>>,
    pub(crate) active_note: Option<NoteRef>,
    pub(crate) custom: Option<CustomDurations>,
    pub(crate) auto_paused: bool,
}

impl TimerState {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end_time
    }

    pub fn paused_ms(&self) -> u64 {
        self.paused_ms
    }

    pub fn in_overtime(&self) -> bool {
        self.in_overtime
    }

    pub fn awaiting_end_decision(&self) -> bool {
        self.awaiting_end_decision
    }

    pub fn pomos_since_start(&self) -> u32 {
        self.pomos_since_start
    }

    pub fn cycles_since_last_auto_stop(&self) -> u32 {
        self.cycles_since_last_auto_stop
    }

    pub fn pomo_session_start(&self) -> Option<DateTime<Local>> {
        self.pomo_session_start
    }

    pub fn active_note(&self) -> Option<&NoteRef> {
        self.active_note.as_ref()
    }

    pub fn custom(&self) -> Option<&CustomDurations> {
        self.custom.as_ref()
    }

    pub fn auto_paused(&self) -> bool {
        self.auto_paused
    }

    pub fn phase(&self) -> Phase {
        if self.mode == Mode::NoTimer {
            Phase::Idle
        } else if self.paused {
            Phase::Paused
        } else if self.awaiting_end_decision {
            Phase::AwaitingEndDecision
        } else if self.in_overtime {
            Phase::Overtime
        } else {
            Phase::Running
        }
    }

    /// Signed milliseconds from `now` to the nominal end. Negative once
    /// the end has passed.
    pub(crate) fn countdown_ms(&self, now: DateTime<Local>) -> i64 {
        self.end_time
            .map(|end| (end - now).num_milliseconds())
            .unwrap_or(0)
    }

    /// Active time spent in the current session.
    ///
    /// - paused in normal time: `nominal - remaining`
    /// - paused in overtime: `nominal + overtime`
    /// - running before the end: `nominal - (end - now)`
    /// - running past the end: `nominal + (now - end)`
    ///
    /// Every subtraction floors at zero. Idle timers report zero.
    pub fn elapsed_active_ms(&self, now: DateTime<Local>, nominal_ms: u64) -> u64 {
        if self.mode == Mode::NoTimer {
            return 0;
        }
        if self.paused {
            return if self.in_overtime {
                nominal_ms.saturating_add(self.paused_ms)
            } else {
                nominal_ms.saturating_sub(self.paused_ms)
            };
        }
        if self.end_time.is_none() {
            return 0;
        }
        let diff = self.countdown_ms(now);
        if diff >= 0 {
            nominal_ms.saturating_sub(diff as u64)
        } else {
            nominal_ms.saturating_add(diff.unsigned_abs())
        }
    }

    /// Time left before the nominal end, floored at zero.
    pub fn remaining_ms(&self, now: DateTime<Local>) -> u64 {
        match (self.mode, self.paused, self.in_overtime) {
            (Mode::NoTimer, _, _) => 0,
            (_, true, false) => self.paused_ms,
            (_, true, true) | (_, false, true) => 0,
            (_, false, false) => self.countdown_ms(now).max(0) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    const D: u64 = 25 * 60_000;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn running(now: DateTime<Local>, nominal: u64) -> TimerState {
        TimerState {
            mode: Mode::Pomo,
            start_time: Some(now),
            end_time: Some(now + Duration::milliseconds(nominal as i64)),
            ..TimerState::default()
        }
    }

    #[test]
    fn idle_state_has_idle_phase_and_no_elapsed_time() {
        let state = TimerState::default();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.elapsed_active_ms(t0(), D), 0);
        assert_eq!(state.remaining_ms(t0()), 0);
    }

    #[test]
    fn running_before_end() {
        let state = running(t0(), D);
        let now = t0() + Duration::minutes(10);
        assert_eq!(state.elapsed_active_ms(now, D), 10 * 60_000);
        assert_eq!(state.remaining_ms(now), 15 * 60_000);
    }

    #[test]
    fn running_past_end_counts_overtime() {
        let state = running(t0(), D);
        let now = t0() + Duration::minutes(27);
        assert_eq!(state.elapsed_active_ms(now, D), 27 * 60_000);
        assert_eq!(state.remaining_ms(now), 0);
    }

    #[test]
    fn paused_in_normal_time_uses_remaining() {
        let mut state = running(t0(), D);
        state.paused = true;
        state.paused_ms = 5 * 60_000;
        assert_eq!(state.elapsed_active_ms(t0() + Duration::hours(3), D), 20 * 60_000);
        assert_eq!(state.phase(), Phase::Paused);
    }

    #[test]
    fn paused_in_overtime_adds_overtime() {
        let mut state = running(t0(), D);
        state.paused = true;
        state.in_overtime = true;
        state.paused_ms = 90_000;
        assert_eq!(state.elapsed_active_ms(t0(), D), D + 90_000);
    }

    #[test]
    fn paused_remaining_larger_than_nominal_floors_at_zero() {
        let mut state = running(t0(), D);
        state.paused = true;
        state.paused_ms = D + 1;
        assert_eq!(state.elapsed_active_ms(t0(), D), 0);
    }

    #[test]
    fn phase_priorities() {
        let mut state = running(t0(), D);
        assert_eq!(state.phase(), Phase::Running);
        state.in_overtime = true;
        assert_eq!(state.phase(), Phase::Overtime);
        state.awaiting_end_decision = true;
        assert_eq!(state.phase(), Phase::AwaitingEndDecision);
        state.paused = true;
        assert_eq!(state.phase(), Phase::Paused);
    }

    #[test]
    fn awaiting_flag_is_not_persisted() {
        let mut state = running(t0(), D);
        state.awaiting_end_decision = true;
        let json = serde_json::to_string(&state).unwrap();
        let restored: TimerState = serde_json::from_str(&json).unwrap();
        assert!(!restored.awaiting_end_decision());
        assert_eq!(restored.end_time(), state.end_time());
    }

    proptest! {
        #[test]
        fn pause_conserves_nominal_duration(
            nominal_secs in 1u64..=4 * 3600,
            frac in 0.0f64..=1.0,
        ) {
            let nominal = nominal_secs * 1000;
            let at = (nominal as f64 * frac) as i64;
            let mut state = running(t0(), nominal);
            let now = t0() + Duration::milliseconds(at);

            let elapsed = state.elapsed_active_ms(now, nominal);
            state.paused_ms = state.remaining_ms(now);
            state.paused = true;

            prop_assert_eq!(elapsed + state.paused_ms, nominal);
            prop_assert_eq!(state.elapsed_active_ms(now, nominal), elapsed);
        }

        #[test]
        fn elapsed_never_exceeds_nominal_outside_overtime(
            nominal_secs in 1u64..=3600,
            offset_ms in 0i64..=3_600_000,
        ) {
            let nominal = nominal_secs * 1000;
            let state = running(t0(), nominal);
            let now = t0() + Duration::milliseconds(offset_ms.min(nominal as i64));
            prop_assert!(state.elapsed_active_ms(now, nominal) <= nominal);
        }
    }
}
