//! Audio cues, system notifications and short user-facing notices.

use crate::timer::{CustomDurations, Mode};

const MS_PER_MINUTE: u64 = 60_000;

/// Output side of the timer. Every method is fire-and-forget.
pub trait NotificationSink: Send + Sync {
    /// End-of-session sound.
    fn play_sound(&self);

    /// System notification for the end of a `mode` session.
    fn show_system_notification(&self, mode: Mode, use_emoji: bool);

    /// A short status message for the user.
    fn notice(&self, message: &str);

    /// Background audio while a session runs.
    fn start_ambient(&self) {}

    fn stop_ambient(&self) {}
}

/// Title and body of an end-of-session notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotification {
    pub title: String,
    pub body: String,
}

/// Notification for the end of a `mode` session. Idle timers get none.
pub fn end_notification(mode: Mode, use_emoji: bool) -> Option<SystemNotification> {
    let (body, emoji) = match mode {
        Mode::Pomo => ("End of the pomodoro, time to take a break", "🏖"),
        Mode::ShortBreak | Mode::LongBreak => ("End of the break, time for the next pomodoro", "🍅"),
        Mode::NoTimer => return None,
    };
    let (title, body) = if use_emoji {
        ("Pomolog 🍅".to_string(), format!("{body} {emoji}"))
    } else {
        ("Pomolog".to_string(), body.to_string())
    };
    Some(SystemNotification { title, body })
}

/// "Starting 25 minute pomodoro." and friends.
pub fn start_notice(mode: Mode, nominal_ms: u64, custom: Option<&CustomDurations>) -> String {
    if mode == Mode::NoTimer {
        return "Quitting pomodoro timer.".to_string();
    }
    let (amount, unit) = if nominal_ms >= MS_PER_MINUTE {
        (nominal_ms / MS_PER_MINUTE, "minute")
    } else {
        (nominal_ms / 1000, "second")
    };
    let custom = if custom.is_some() { "custom " } else { "" };
    format!("Starting {amount} {unit} {custom}{}.", mode.noun())
}

pub fn restart_notice(mode: Mode) -> String {
    format!("Restarting {}.", mode.noun())
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl NotificationSink for SilentNotifier {
    fn play_sound(&self) {}

    fn show_system_notification(&self, _mode: Mode, _use_emoji: bool) {}

    fn notice(&self, _message: &str) {}
}
