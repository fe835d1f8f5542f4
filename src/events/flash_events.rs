//! Hourly wilderness flash event producer
//!
//! Derives the next flash event from the fixed in-process rotation table,
//! keeps only events inside the notification window, and applies the
//! favourites gate before rendering the message.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::favourites::Favourites;
use super::{Notification, Producer, ProducerError, Production};
use crate::rotation::{select_within_window, RotationTable};

/// Producer for the hourly wilderness flash event notification
#[derive(Debug, Clone)]
pub struct FlashEventProducer {
    rotation: RotationTable,
    favourites: Favourites,
    window: Duration,
}

impl FlashEventProducer {
    /// Create a producer over the given rotation with the default 1 h window
    /// and no favourites gating
    pub fn new(rotation: RotationTable) -> Self {
        Self {
            rotation,
            favourites: Favourites::disabled(),
            window: Duration::hours(1),
        }
    }

    /// Gate notifications on a favourites allow-list
    pub fn with_favourites(mut self, favourites: Favourites) -> Self {
        self.favourites = favourites;
        self
    }

    /// Override the notification window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// The rotation this producer reads from
    pub fn rotation(&self) -> &RotationTable {
        &self.rotation
    }
}

#[async_trait]
impl Producer for FlashEventProducer {
    fn name(&self) -> &str {
        "Wilderness Flash Events"
    }

    async fn produce(&self, now: DateTime<Utc>) -> Result<Production, ProducerError> {
        let occurrences = self.rotation.next_occurrences(now);
        let next = select_within_window(&occurrences, now, self.window)?;

        if !self.favourites.allows(&next.name) {
            tracing::debug!(
                event = %next.name,
                "Next flash event is not on the favourites list, skipping notification"
            );
            return Ok(Production::suppressed(format!(
                "\"{}\" is not on the favourites list",
                next.name
            )));
        }

        tracing::debug!(event = %next.name, at = %next.at, "Next flash event selected");
        Ok(Production::Ready(Notification::text(format!(
            "The next flash event is \"{}\", starting at {}",
            next.name,
            next.time_of_day()
        ))))
    }
}

// ============================================================================
// Tests
// ============================================================================
