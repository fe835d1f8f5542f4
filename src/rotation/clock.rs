//! Rotation table and next-occurrence computation
//!
//! A [`RotationTable`] holds the ordered event list plus the timing constants
//! that pin the rotation to the wall clock: the anchor instant (occurrence #0
//! of the event at index 0), the item period (time between consecutive items'
//! first occurrences) and the full period (cycle length after which the whole
//! rotation repeats).

use chrono::{DateTime, Duration, Utc};

use super::error::{RotationError, RotationResult};

/// The live wilderness flash event rotation, in rotation order.
///
/// Insertion order is semantic: an event's position defines its offset from
/// the anchor.
const WILDERNESS_FLASH_EVENTS: &[&str] = &[
    "Spider Swarm",
    "Unnatural Outcrop",
    "Stryke the Wyrm",
    "Demon Stragglers",
    "Butterfly Swarm",
    "King Black Dragon Rampage",
    "Forgotten Soldiers",
    "Surprising Seedlings",
    "Hellhound Pack",
    "Infernal Star",
    "Lost Souls",
    "Ramokee Incursion",
    "Displaced Energy",
    "Evil Bloodwood Tree",
];

/// First occurrence of "Spider Swarm" after the 2023 rotation rework
/// (2023-09-04 00:00:00 UTC).
const WILDERNESS_FLASH_ANCHOR_SECS: i64 = 1_693_785_600;

/// A computed future instant at which a rotation event is expected to happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Event name, as listed in the rotation
    pub name: String,
    /// Full-precision instant of the next occurrence
    pub at: DateTime<Utc>,
}

impl Occurrence {
    /// Wall-clock time of day (UTC) for message rendering.
    ///
    /// Instants are kept at full precision internally; this is the only place
    /// occurrences collapse to `HH:MM`.
    pub fn time_of_day(&self) -> String {
        self.at.format("%H:%M").to_string()
    }
}

/// Ordered, fixed rotation of recurring events anchored to the wall clock
///
/// Immutable for the process lifetime. All occurrence computation is pure:
/// same inputs, same outputs, no side effects.
#[derive(Debug, Clone)]
pub struct RotationTable {
    anchor: DateTime<Utc>,
    item_period: Duration,
    full_period: Duration,
    events: Vec<String>,
}

impl RotationTable {
    /// Create a rotation table
    ///
    /// # Errors
    ///
    /// Returns an error if `events` is empty or either period is not positive.
    pub fn new(
        anchor: DateTime<Utc>,
        item_period: Duration,
        full_period: Duration,
        events: Vec<String>,
    ) -> RotationResult<Self> {
        if events.is_empty() {
            return Err(RotationError::EmptyRotation);
        }
        if item_period <= Duration::zero() {
            return Err(RotationError::NonPositivePeriod {
                field: "item_period",
            });
        }
        if full_period <= Duration::zero() {
            return Err(RotationError::NonPositivePeriod {
                field: "full_period",
            });
        }

        Ok(Self {
            anchor,
            item_period,
            full_period,
            events,
        })
    }

    /// The compiled-in wilderness flash event rotation: 14 events, one per
    /// hour, repeating every 14 hours.
    pub fn wilderness_flash_events() -> Self {
        let anchor = DateTime::from_timestamp(WILDERNESS_FLASH_ANCHOR_SECS, 0)
            .expect("anchor timestamp is in range");
        Self {
            anchor,
            item_period: Duration::hours(1),
            full_period: Duration::hours(14),
            events: WILDERNESS_FLASH_EVENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Event names in rotation order
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Number of events in the rotation
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the rotation is empty (never true for a constructed table)
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Anchor instant (occurrence #0 of the event at index 0)
    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// Compute the next occurrence of every event, relative to `now`
    ///
    /// For each index `i`, the event's first-ever occurrence is
    /// `anchor + i * item_period`. If that base instant is still ahead of
    /// `now`, it is the next occurrence. Otherwise the elapsed time is rolled
    /// forward by whole cycles, rounding up, so the result lands at-or-after
    /// `now` — never strictly in the past.
    ///
    /// The returned vector preserves rotation order.
    pub fn next_occurrences(&self, now: DateTime<Utc>) -> Vec<Occurrence> {
        self.events
            .iter()
            .enumerate()
            .map(|(i, name)| Occurrence {
                name: name.clone(),
                at: self.next_occurrence_at(i, now),
            })
            .collect()
    }

    fn next_occurrence_at(&self, index: usize, now: DateTime<Utc>) -> DateTime<Utc> {
        let base = self.anchor + self.item_period * index as i32;
        if now <= base {
            // Only possible for early indices near the anchor
            return base;
        }

        let elapsed_ms = (now - base).num_milliseconds();
        let full_ms = self.full_period.num_milliseconds();
        let mut cycles = elapsed_ms / full_ms;
        if elapsed_ms % full_ms != 0 {
            // Ceiling division: land at-or-after `now`
            cycles += 1;
        }
        base + Duration::milliseconds(cycles * full_ms)
    }

    /// Format the upcoming schedule as a human-readable listing
    ///
    /// Occurrences are sorted chronologically, not in rotation order.
    pub fn format_upcoming(&self, now: DateTime<Utc>) -> String {
        let mut occurrences = self.next_occurrences(now);
        occurrences.sort_by_key(|o| o.at);

        let mut output = format!("Upcoming events from {}\n", now.format("%Y-%m-%d %H:%M UTC"));
        output.push_str(&format!("{:-<48}\n", ""));
        for occ in &occurrences {
            output.push_str(&format!(
                "{} | {}\n",
                occ.at.format("%Y-%m-%d %H:%M"),
                occ.name
            ));
        }
        output
    }
}

impl Default for RotationTable {
    fn default() -> Self {
        Self::wilderness_flash_events()
    }
}

// ============================================================================
// Tests
// ============================================================================
