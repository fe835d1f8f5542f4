//! Notification-window selection
//!
//! Given the per-event occurrence list, pick the single event whose
//! occurrence falls inside the upcoming notification window from `now`.

use chrono::{DateTime, Duration, Utc};

use super::clock::Occurrence;
use super::error::RotationError;

pub use super::error::RotationResult;

/// Select the first occurrence inside `[now, now + window]`
///
/// Entries are scanned in their given (insertion) order, so ties between
/// identical occurrence times break by rotation position — deterministic and
/// independent of any map iteration order. An occurrence whose instant
/// precedes `now` is rolled forward by one day before the window test, which
/// keeps the selection correct for callers that collapsed occurrences to a
/// wall-clock time of day on today's date.
///
/// # Errors
///
/// Returns [`RotationError::NoUpcomingEvent`] when no entry qualifies. The
/// caller should treat this as "no notification this cycle" and log it
/// loudly: with a sanely configured rotation the window always contains
/// something, so an empty result points at configuration or clock skew.
pub fn select_within_window(
    occurrences: &[Occurrence],
    now: DateTime<Utc>,
    window: Duration,
) -> RotationResult<Occurrence> {
    for occ in occurrences {
        let mut at = occ.at;
        if at < now {
            at += Duration::days(1);
        }
        if now <= at && at <= now + window {
            return Ok(Occurrence {
                name: occ.name.clone(),
                at,
            });
        }
    }

    Err(RotationError::no_upcoming_event(window, occurrences.len()))
}

// ============================================================================
// Tests
// ============================================================================
