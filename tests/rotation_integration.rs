//! Integration tests for the rotation calculator and window selection
//!
//! These tests verify the end-to-end occurrence pipeline:
//! - Anchor/period arithmetic across cycle boundaries
//! - Strictly-future guarantees for every rotation index
//! - Window selection and deterministic tie-breaking

use chrono::{DateTime, Duration, TimeZone, Utc};
use dndwatch::rotation::{select_within_window, RotationError, RotationTable};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

// ============================================================================
// Occurrence Computation
// ============================================================================

#[test]
fn test_two_event_rotation_end_to_end() {
    // anchor = T0, rotation = ["X","Y"], item_period = 1h, full_period = 2h,
    // now = T0 + 1h30m => next X = T0+2h, next Y = T0+3h; a 1h window picks X.
    let table = RotationTable::new(
        t0(),
        Duration::hours(1),
        Duration::hours(2),
        vec!["X".to_string(), "Y".to_string()],
    )
    .unwrap();

    let now = t0() + Duration::hours(1) + Duration::minutes(30);
    let occurrences = table.next_occurrences(now);

    assert_eq!(occurrences.len(), 2);
    assert_eq!(occurrences[0].name, "X");
    assert_eq!(occurrences[0].at, t0() + Duration::hours(2));
    assert_eq!(occurrences[1].name, "Y");
    assert_eq!(occurrences[1].at, t0() + Duration::hours(3));

    let selected = select_within_window(&occurrences, now, Duration::hours(1)).unwrap();
    assert_eq!(selected.name, "X");
    assert_eq!(selected.time_of_day(), "02:00");
}

#[test]
fn test_no_occurrence_before_now_for_any_index() {
    let table = RotationTable::wilderness_flash_events();

    let offsets = [
        Duration::zero(),
        Duration::minutes(1),
        Duration::minutes(59),
        Duration::hours(13),
        Duration::hours(14),
        Duration::days(30),
        Duration::days(365) + Duration::minutes(41) + Duration::seconds(7),
        Duration::days(900) + Duration::hours(13) + Duration::seconds(59),
    ];

    for offset in offsets {
        let now = table.anchor() + offset;
        for occ in table.next_occurrences(now) {
            assert!(
                occ.at >= now,
                "occurrence of '{}' at {} precedes now {}",
                occ.name,
                occ.at,
                now
            );
            // And never more than one full cycle ahead
            assert!(occ.at < now + Duration::hours(14) + Duration::hours(1));
        }
    }
}

#[test]
fn test_length_one_rotation_advances_one_period_at_a_time() {
    let table = RotationTable::new(
        t0(),
        Duration::hours(1),
        Duration::hours(1),
        vec!["Solo".to_string()],
    )
    .unwrap();

    // Walk `now` through three periods; the occurrence advances in lockstep
    let mut expected = t0() + Duration::hours(1);
    for step in 0..3 {
        let now = t0() + Duration::hours(step) + Duration::minutes(30);
        let occurrences = table.next_occurrences(now);
        assert_eq!(occurrences[0].at, expected);
        expected += Duration::hours(1);
    }
}

#[test]
fn test_full_wilderness_rotation_is_one_event_per_hour() {
    let table = RotationTable::wilderness_flash_events();
    let now = table.anchor() + Duration::days(100) + Duration::minutes(30);

    let occurrences = table.next_occurrences(now);

    // The 14 occurrences cover 14 consecutive hours with no gaps
    let mut instants: Vec<_> = occurrences.iter().map(|o| o.at).collect();
    instants.sort();
    for pair in instants.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::hours(1));
    }

    // Exactly one of them is inside the next hour
    let in_window = occurrences
        .iter()
        .filter(|o| o.at <= now + Duration::hours(1))
        .count();
    assert_eq!(in_window, 1);
}

// ============================================================================
// Window Selection
// ============================================================================

#[test]
fn test_window_selector_error_when_everything_is_late() {
    let table = RotationTable::new(
        t0(),
        Duration::hours(6),
        Duration::hours(12),
        vec!["A".to_string(), "B".to_string()],
    )
    .unwrap();

    // Just after A's occurrence: next A in ~12h, B in ~6h, nothing within 1h
    let now = t0() + Duration::minutes(1);
    let occurrences = table.next_occurrences(now);

    let err = select_within_window(&occurrences, now, Duration::hours(1)).unwrap_err();
    assert!(matches!(err, RotationError::NoUpcomingEvent { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_window_selector_tie_break_is_rotation_position() {
    // Two events colliding on the same instant: first in rotation order wins
    let now = t0();
    let at = now + Duration::minutes(30);
    let occurrences = vec![
        dndwatch::rotation::Occurrence {
            name: "Early".to_string(),
            at,
        },
        dndwatch::rotation::Occurrence {
            name: "Late".to_string(),
            at,
        },
    ];

    let selected = select_within_window(&occurrences, now, Duration::hours(1)).unwrap();
    assert_eq!(selected.name, "Early");
}

#[test]
fn test_selection_is_deterministic_across_calls() {
    let table = RotationTable::wilderness_flash_events();
    let now = table.anchor() + Duration::days(42) + Duration::minutes(17);

    let first = {
        let occurrences = table.next_occurrences(now);
        select_within_window(&occurrences, now, Duration::hours(1)).unwrap()
    };

    for _ in 0..5 {
        let occurrences = table.next_occurrences(now);
        let again = select_within_window(&occurrences, now, Duration::hours(1)).unwrap();
        assert_eq!(again.name, first.name);
        assert_eq!(again.at, first.at);
    }
}
