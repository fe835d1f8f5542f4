//! Occurrence calculator for the fixed flash-event rotation
//!
//! The wilderness flash events run in a fixed, ordered rotation: one event
//! starts at the top of every hour, and after the full rotation has played
//! through, the cycle repeats. Given a single anchor instant (the first
//! occurrence of the first event), every future occurrence of every event is
//! derivable with plain arithmetic — no network access, no persisted state.
//!
//! # Modules
//!
//! - [`clock`] - [`RotationTable`] and the next-occurrence computation
//! - [`window`] - Selection of the single event inside the notification window
//! - [`error`] - [`RotationError`] and the module result alias
//!
//! # Quick Start
//!
//! ```
//! use dndwatch::rotation::{RotationTable, select_within_window};
//! use chrono::{Duration, Utc};
//!
//! let table = RotationTable::wilderness_flash_events();
//! let now = Utc::now();
//! let occurrences = table.next_occurrences(now);
//!
//! // Every occurrence is at-or-after `now`
//! assert!(occurrences.iter().all(|o| o.at >= now));
//!
//! // Exactly one event starts within the next hour
//! let next = select_within_window(&occurrences, now, Duration::hours(1)).unwrap();
//! println!("next up: {} at {}", next.name, next.time_of_day());
//! ```

pub mod clock;
pub mod error;
pub mod window;

pub use clock::{Occurrence, RotationTable};
pub use error::{RotationError, RotationResult};
pub use window::select_within_window;
