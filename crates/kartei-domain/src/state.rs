//! Card lifecycle states

use std::fmt;

/// Lifecycle of a single card within one pipeline run
///
/// ```text
/// Pending → InProgress → Succeeded
///                      → Failed { terminal: false } → InProgress (retry)
///                      → Failed { terminal: true }
/// ```
///
/// Pending cards whose image is missing never enter `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardState {
    /// Scheduled, no attempt made yet
    Pending,

    /// An attempt is running
    InProgress,

    /// A record was extracted
    Succeeded,

    /// The latest attempt failed
    Failed {
        /// Attempts made so far
        attempts: u32,
        /// No attempts left
        terminal: bool,
    },
}

/// An illegal lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateError {
    /// State the transition started from
    pub from: CardState,
    /// Name of the attempted transition
    pub transition: &'static str,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} from {:?}", self.transition, self.from)
    }
}

impl std::error::Error for StateError {}

impl CardState {
    /// Begin the first attempt
    pub fn start(self) -> Result<Self, StateError> {
        match self {
            CardState::Pending => Ok(CardState::InProgress),
            from => Err(StateError {
                from,
                transition: "start",
            }),
        }
    }

    /// Begin another attempt after a retryable failure
    pub fn retry(self) -> Result<Self, StateError> {
        match self {
            CardState::Failed {
                terminal: false, ..
            } => Ok(CardState::InProgress),
            from => Err(StateError {
                from,
                transition: "retry",
            }),
        }
    }

    /// The running attempt produced a record
    pub fn succeed(self) -> Result<Self, StateError> {
        match self {
            CardState::InProgress => Ok(CardState::Succeeded),
            from => Err(StateError {
                from,
                transition: "succeed",
            }),
        }
    }

    /// The running attempt failed; `attempts` counts the attempts made so far
    pub fn fail(self, attempts: u32, max_attempts: u32) -> Result<Self, StateError> {
        match self {
            CardState::InProgress => Ok(CardState::Failed {
                attempts,
                terminal: attempts >= max_attempts,
            }),
            from => Err(StateError {
                from,
                transition: "fail",
            }),
        }
    }

    /// Whether no further transition is possible
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            CardState::Succeeded | CardState::Failed { terminal: true, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path() {
        let state = CardState::Pending.start().unwrap().succeed().unwrap();
        assert_eq!(state, CardState::Succeeded);
        assert!(state.is_final());
    }

    #[test]
    fn test_retry_until_terminal() {
        let mut state = CardState::Pending.start().unwrap();
        for attempt in 1..=3 {
            state = state.fail(attempt, 3).unwrap();
            if attempt < 3 {
                assert!(!state.is_final());
                state = state.retry().unwrap();
            }
        }
        assert_eq!(
            state,
            CardState::Failed {
                attempts: 3,
                terminal: true
            }
        );
        assert!(state.retry().is_err());
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(CardState::Pending.succeed().is_err());
        assert!(CardState::Succeeded.start().is_err());
        assert!(CardState::Pending.retry().is_err());

        let err = CardState::Succeeded.fail(1, 3).unwrap_err();
        assert_eq!(err.transition, "fail");
        assert_eq!(err.to_string(), "cannot fail from Succeeded");
    }
}
