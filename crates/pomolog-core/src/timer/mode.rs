use serde::{Deserialize, Serialize};

use crate::storage::DurationsConfig;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Longest accepted session length, in minutes.
pub const MAX_SESSION_MINUTES: f64 = 24.0 * 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Pomo,
    ShortBreak,
    LongBreak,
    #[default]
    NoTimer,
}

impl Mode {
    /// Symbol used in log tags and headings.
    pub fn log_symbol(self) -> &'static str {
        match self {
            Mode::Pomo => "🍅",
            Mode::ShortBreak | Mode::LongBreak => "🏖",
            Mode::NoTimer => "",
        }
    }

    /// Symbol used in front of the status countdown.
    pub fn status_symbol(self) -> &'static str {
        match self {
            Mode::Pomo => "🍅",
            Mode::ShortBreak | Mode::LongBreak => "🏖️",
            Mode::NoTimer => "",
        }
    }

    /// "pomodoro" or "break", as used in user-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            Mode::Pomo => "pomodoro",
            Mode::ShortBreak | Mode::LongBreak => "break",
            Mode::NoTimer => "timer",
        }
    }

    /// The mode that follows `self` in the cycle.
    ///
    /// After a pomodoro the break is long when `pomos_since_start` is a
    /// multiple of `long_break_interval`; after a break (or when idle)
    /// the next session is a pomodoro.
    pub fn next_in_cycle(self, pomos_since_start: u32, long_break_interval: u32) -> Mode {
        match self {
            Mode::Pomo => next_break(pomos_since_start, long_break_interval),
            Mode::ShortBreak | Mode::LongBreak | Mode::NoTimer => Mode::Pomo,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Pomo => "pomodoro",
            Mode::ShortBreak => "short break",
            Mode::LongBreak => "long break",
            Mode::NoTimer => "no timer",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pomo" | "pomodoro" | "focus" => Ok(Mode::Pomo),
            "short" | "short_break" | "short-break" => Ok(Mode::ShortBreak),
            "long" | "long_break" | "long-break" => Ok(Mode::LongBreak),
            other => Err(format!("unknown mode '{other}' (expected pomo, short or long)")),
        }
    }
}

/// Break kind after `pomos_since_start` counted pomodoros.
///
/// An interval of 0 is treated as 1.
pub fn next_break(pomos_since_start: u32, long_break_interval: u32) -> Mode {
    if pomos_since_start % long_break_interval.max(1) == 0 {
        Mode::LongBreak
    } else {
        Mode::ShortBreak
    }
}

/// Check that a session length is positive, finite and no longer than
/// [`MAX_SESSION_MINUTES`].
pub fn check_minutes(minutes: f64) -> Result<(), String> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(format!("must be a positive number of minutes, got {minutes}"));
    }
    if minutes > MAX_SESSION_MINUTES {
        return Err(format!("must be at most {MAX_SESSION_MINUTES} minutes, got {minutes}"));
    }
    Ok(())
}

/// Duration override for a custom run. Applies to every pomodoro and
/// every break until the timer is quit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDurations {
    pub pomo_minutes: f64,
    pub break_minutes: f64,
    /// Note that receives the log entries of this run instead of the
    /// configured destination.
    #[serde(default)]
    pub log_note: Option<String>,
}

impl CustomDurations {
    pub fn validate(&self) -> Result<(), String> {
        check_minutes(self.pomo_minutes).map_err(|e| format!("pomodoro length {e}"))?;
        check_minutes(self.break_minutes).map_err(|e| format!("break length {e}"))
    }
}

/// Nominal length of `mode` in milliseconds.
///
/// # Panics
///
/// `Mode::NoTimer` has no duration. Asking for one is a caller bug.
pub fn nominal_ms(mode: Mode, durations: &DurationsConfig, custom: Option<&CustomDurations>) -> u64 {
    let minutes = match (mode, custom) {
        (Mode::NoTimer, _) => panic!("Mode NoTimer does not have an associated duration"),
        (Mode::Pomo, Some(c)) => c.pomo_minutes,
        (Mode::ShortBreak | Mode::LongBreak, Some(c)) => c.break_minutes,
        (Mode::Pomo, None) => durations.pomo_minutes,
        (Mode::ShortBreak, None) => durations.short_break_minutes,
        (Mode::LongBreak, None) => durations.long_break_minutes,
    };
    (minutes.max(0.0) * MILLIS_PER_MINUTE).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_break_every_fourth_pomo() {
        let kinds: Vec<Mode> = (1..=8).map(|n| next_break(n, 4)).collect();
        assert_eq!(
            kinds,
            vec![
                Mode::ShortBreak,
                Mode::ShortBreak,
                Mode::ShortBreak,
                Mode::LongBreak,
                Mode::ShortBreak,
                Mode::ShortBreak,
                Mode::ShortBreak,
                Mode::LongBreak,
            ]
        );
    }

    #[test]
    fn zero_interval_does_not_divide_by_zero() {
        assert_eq!(next_break(3, 0), Mode::LongBreak);
    }

    #[test]
    fn breaks_and_idle_lead_to_pomo() {
        assert_eq!(Mode::ShortBreak.next_in_cycle(2, 4), Mode::Pomo);
        assert_eq!(Mode::LongBreak.next_in_cycle(4, 4), Mode::Pomo);
        assert_eq!(Mode::NoTimer.next_in_cycle(0, 4), Mode::Pomo);
        assert_eq!(Mode::Pomo.next_in_cycle(2, 4), Mode::ShortBreak);
    }

    #[test]
    fn custom_override_applies_to_all_breaks() {
        let durations = DurationsConfig::default();
        let custom = CustomDurations {
            pomo_minutes: 40.0,
            break_minutes: 8.0,
            log_note: None,
        };
        assert_eq!(nominal_ms(Mode::Pomo, &durations, Some(&custom)), 40 * 60_000);
        assert_eq!(nominal_ms(Mode::LongBreak, &durations, Some(&custom)), 8 * 60_000);
        assert_eq!(nominal_ms(Mode::LongBreak, &durations, None), 15 * 60_000);
    }

    #[test]
    fn fractional_minutes() {
        let mut durations = DurationsConfig::default();
        durations.short_break_minutes = 0.5;
        assert_eq!(nominal_ms(Mode::ShortBreak, &durations, None), 30_000);
    }

    #[test]
    #[should_panic(expected = "NoTimer")]
    fn no_timer_has_no_duration() {
        nominal_ms(Mode::NoTimer, &DurationsConfig::default(), None);
    }

    #[test]
    fn session_lengths_are_bounded() {
        assert!(check_minutes(25.0).is_ok());
        assert!(check_minutes(MAX_SESSION_MINUTES).is_ok());
        assert!(check_minutes(MAX_SESSION_MINUTES + 1.0).is_err());
        assert!(check_minutes(0.0).is_err());
        assert!(check_minutes(-5.0).is_err());
        assert!(check_minutes(f64::NAN).is_err());

        let custom = CustomDurations {
            pomo_minutes: 1e12,
            break_minutes: 5.0,
            log_note: None,
        };
        assert!(custom.validate().unwrap_err().starts_with("pomodoro length"));
    }

    #[test]
    fn parses_cli_names() {
        assert_eq!("pomo".parse::<Mode>().unwrap(), Mode::Pomo);
        assert_eq!("Long".parse::<Mode>().unwrap(), Mode::LongBreak);
        assert!("nap".parse::<Mode>().is_err());
    }
}
