//! Error types for the rotation module

use std::fmt;

/// Result type for rotation operations
pub type RotationResult<T> = Result<T, RotationError>;

/// Rotation-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    /// No occurrence falls inside the notification window
    ///
    /// Occurrence maps are recomputed every cycle and the window is expected
    /// to always contain something by construction of the rotation, so this
    /// indicates a configuration or clock-skew problem worth logging loudly.
    NoUpcomingEvent {
        window_minutes: i64,
        candidates: usize,
    },

    /// Rotation table has no events
    EmptyRotation,

    /// A period was zero or negative
    NonPositivePeriod { field: &'static str },
}

impl fmt::Display for RotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUpcomingEvent {
                window_minutes,
                candidates,
            } => {
                write!(
                    f,
                    "No event found within the next {} minute(s) across {} candidate(s)",
                    window_minutes, candidates
                )
            }
            Self::EmptyRotation => {
                write!(f, "Rotation table must contain at least one event")
            }
            Self::NonPositivePeriod { field } => {
                write!(f, "Rotation period '{}' must be positive", field)
            }
        }
    }
}

impl std::error::Error for RotationError {}

impl RotationError {
    /// Create a no-upcoming-event error
    pub fn no_upcoming_event(window: chrono::Duration, candidates: usize) -> Self {
        Self::NoUpcomingEvent {
            window_minutes: window.num_minutes(),
            candidates,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoUpcomingEvent { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_upcoming_event_display() {
        let err = RotationError::no_upcoming_event(chrono::Duration::hours(1), 14);
        assert!(err.to_string().contains("60 minute"));
        assert!(err.to_string().contains("14 candidate"));
    }

    #[test]
    fn test_is_recoverable() {
        let window_err = RotationError::no_upcoming_event(chrono::Duration::hours(1), 2);
        assert!(window_err.is_recoverable());

        let config_err = RotationError::EmptyRotation;
        assert!(!config_err.is_recoverable());
    }
}
