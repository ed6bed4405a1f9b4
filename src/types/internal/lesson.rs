use std::fmt;
use std::str::FromStr;

use poem_openapi::Enum;
use serde::{Deserialize, Serialize};

use crate::errors::InternalError;
use crate::errors::internal::LessonError;

/// Lesson lifecycle state
///
/// `Scheduled` is the only state a lesson is created in and the only state
/// it can leave. The other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
#[oai(rename_all = "lowercase")]
pub enum LessonStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
            LessonStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LessonStatus::Scheduled)
    }

    /// Validate a move to `to` and return the new state
    pub fn transition(self, to: LessonStatus) -> Result<LessonStatus, LessonError> {
        match (self, to) {
            (LessonStatus::Scheduled, LessonStatus::Completed)
            | (LessonStatus::Scheduled, LessonStatus::Cancelled)
            | (LessonStatus::Scheduled, LessonStatus::Rescheduled) => Ok(to),
            (from, to) => Err(LessonError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            }),
        }
    }

    /// A lesson can only be moved to a new time while it is still scheduled
    pub fn ensure_movable(self) -> Result<(), LessonError> {
        if self == LessonStatus::Scheduled {
            Ok(())
        } else {
            Err(LessonError::InvalidTransition {
                from: self.as_str().to_string(),
                to: LessonStatus::Scheduled.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scheduled" => Ok(LessonStatus::Scheduled),
            "completed" => Ok(LessonStatus::Completed),
            "cancelled" => Ok(LessonStatus::Cancelled),
            "rescheduled" => Ok(LessonStatus::Rescheduled),
            other => Err(InternalError::parse("lesson_status", format!("Unknown status: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LessonStatus; 4] = [
        LessonStatus::Scheduled,
        LessonStatus::Completed,
        LessonStatus::Cancelled,
        LessonStatus::Rescheduled,
    ];

    #[test]
    fn test_scheduled_can_leave_to_every_terminal_state() {
        for to in [LessonStatus::Completed, LessonStatus::Cancelled, LessonStatus::Rescheduled] {
            assert_eq!(LessonStatus::Scheduled.transition(to).unwrap(), to);
        }
    }

    #[test]
    fn test_scheduled_to_scheduled_is_rejected() {
        assert!(LessonStatus::Scheduled.transition(LessonStatus::Scheduled).is_err());
    }

    #[test]
    fn test_terminal_states_reject_every_transition() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                let result = from.transition(to);
                assert!(result.is_err(), "{} -> {} should fail", from, to);
            }
        }
    }

    #[test]
    fn test_invalid_transition_names_both_states() {
        match LessonStatus::Completed.transition(LessonStatus::Cancelled) {
            Err(LessonError::InvalidTransition { from, to }) => {
                assert_eq!(from, "completed");
                assert_eq!(to, "cancelled");
            }
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_only_scheduled_lessons_are_movable() {
        assert!(LessonStatus::Scheduled.ensure_movable().is_ok());
        assert!(LessonStatus::Cancelled.ensure_movable().is_err());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("Completed".parse::<LessonStatus>().unwrap(), LessonStatus::Completed);
        assert!("pending".parse::<LessonStatus>().is_err());
    }
}
