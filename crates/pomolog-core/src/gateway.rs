//! User confirmation prompts.
//!
//! The timer never renders anything itself. When a flow setting asks for
//! confirmation it suspends on one of these calls until the host answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Answer to the end-of-session prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndChoice {
    /// Keep running past the nominal end.
    Continue,
    /// Log and start the next session.
    Next,
    /// Log and stop the timer.
    Quit,
    /// Record the pomodoro as unsuccessful.
    Unsuccessful,
}

impl EndChoice {
    /// Choices the prompt offers when `ending` is over.
    pub fn options_for(ending: Mode) -> &'static [EndChoice] {
        if ending == Mode::Pomo {
            &[
                EndChoice::Continue,
                EndChoice::Next,
                EndChoice::Quit,
                EndChoice::Unsuccessful,
            ]
        } else {
            &[EndChoice::Continue, EndChoice::Next, EndChoice::Quit]
        }
    }
}

impl std::str::FromStr for EndChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "continue" => Ok(EndChoice::Continue),
            "n" | "next" => Ok(EndChoice::Next),
            "q" | "quit" => Ok(EndChoice::Quit),
            "u" | "unsuccessful" => Ok(EndChoice::Unsuccessful),
            other => Err(format!("unknown choice '{other}'")),
        }
    }
}

/// Each call resolves exactly once. The timer imposes no timeout.
#[async_trait]
pub trait ConfirmationGateway: Send + Sync {
    /// Ask whether `candidate` may start.
    async fn confirm_start(&self, candidate: Mode) -> bool;

    /// Ask what to do now that `ending` has reached its nominal end.
    /// `next` is the mode that would start on [`EndChoice::Next`].
    /// Only [`EndChoice::options_for`]`(ending)` may be returned.
    async fn confirm_end_of_session(&self, ending: Mode, next: Mode) -> EndChoice;

    /// Free-text reason for an unsuccessful pomodoro. May be empty.
    async fn prompt_unsuccessful_reason(&self) -> String;
}

/// Approves every start and always moves on to the next session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ConfirmationGateway for AutoApprove {
    async fn confirm_start(&self, _candidate: Mode) -> bool {
        true
    }

    async fn confirm_end_of_session(&self, _ending: Mode, _next: Mode) -> EndChoice {
        EndChoice::Next
    }

    async fn prompt_unsuccessful_reason(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsuccessful_only_offered_for_pomodoros() {
        assert!(EndChoice::options_for(Mode::Pomo).contains(&EndChoice::Unsuccessful));
        assert!(!EndChoice::options_for(Mode::ShortBreak).contains(&EndChoice::Unsuccessful));
        assert!(!EndChoice::options_for(Mode::LongBreak).contains(&EndChoice::Unsuccessful));
    }

    #[test]
    fn parses_short_and_long_answers() {
        assert_eq!("c".parse::<EndChoice>().unwrap(), EndChoice::Continue);
        assert_eq!(" Next\n".parse::<EndChoice>().unwrap(), EndChoice::Next);
        assert_eq!("unsuccessful".parse::<EndChoice>().unwrap(), EndChoice::Unsuccessful);
        assert!("maybe".parse::<EndChoice>().is_err());
    }

    #[tokio::test]
    async fn auto_approve_moves_on() {
        let gateway = AutoApprove;
        assert!(gateway.confirm_start(Mode::Pomo).await);
        assert_eq!(
            gateway.confirm_end_of_session(Mode::Pomo, Mode::ShortBreak).await,
            EndChoice::Next
        );
    }
}
