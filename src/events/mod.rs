//! Event producers
//!
//! A producer inspects one recurring in-game event and decides, per cycle,
//! whether a notification should go out. Producers never talk to sinks; they
//! hand a [`Production`] back to the dispatch loop, which routes it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                DispatchLoop                  │
//! └───────┬──────────────────────────┬───────────┘
//!         ▼                          ▼
//! ┌───────────────────┐   ┌──────────────────────┐
//! │ FlashEventProducer│   │ RuneGoldbergProducer │
//! │ (hourly, rotation)│   │ (daily, scraped)     │
//! └───────────────────┘   └──────────────────────┘
//! ```
//!
//! Suppression ("nothing to say this cycle") is a value, not an error:
//! [`Production::Suppressed`] flows back through the same channel as
//! [`Production::Ready`], and only genuine failures use [`ProducerError`].

pub mod favourites;
pub mod flash_events;
pub mod rune_goldberg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::rotation::RotationError;

// Re-exports
pub use favourites::Favourites;
pub use flash_events::FlashEventProducer;
pub use rune_goldberg::RuneGoldbergProducer;

/// Errors that can occur while a producer builds its notification
#[derive(Error, Debug)]
pub enum ProducerError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server responded with a non-success status
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Occurrence computation or window selection failed
    #[error("{0}")]
    Rotation(#[from] RotationError),

    /// Expected data was missing from a fetched page
    #[error("Failed to extract {what} from page")]
    Extraction { what: &'static str },
}

impl ProducerError {
    /// Check if this error is recoverable (the next cycle may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::ServerError(_) => true,
            Self::Rotation(e) => e.is_recoverable(),
            Self::Extraction { .. } => false,
        }
    }
}

/// Optional delivery hints accompanying a notification
///
/// `image` plus a `filepath` asks sinks to attach the file and use the
/// message as its caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFlags {
    /// Whether an image attachment accompanies the message
    pub image: bool,
    /// Path of the attachment on local disk
    pub filepath: Option<PathBuf>,
}

/// A notification ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Human-readable message text
    pub message: String,
    /// Delivery hints, passed to sinks unchanged
    pub flags: NotificationFlags,
}

impl Notification {
    /// Create a plain-text notification with default flags
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            flags: NotificationFlags::default(),
        }
    }

    /// Whether the message carries no visible content
    ///
    /// The dispatch loop treats an empty message as suppression.
    pub fn is_empty(&self) -> bool {
        self.message.trim().is_empty()
    }
}

/// Outcome of a single producer invocation
///
/// `Suppressed` is ordinary ("event not on the favourites list"), never an
/// error; callers branch on the value instead of catching exceptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Production {
    /// A notification should be delivered
    Ready(Notification),
    /// No notification this cycle
    Suppressed {
        /// Why nothing goes out, for the logs
        reason: String,
    },
}

impl Production {
    /// Create a suppressed outcome
    pub fn suppressed(reason: impl Into<String>) -> Self {
        Self::Suppressed {
            reason: reason.into(),
        }
    }

    /// Whether this outcome carries a deliverable notification
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(n) if !n.is_empty())
    }
}

/// Trait for event producers
///
/// Implement this trait to add a new recurring event source. `now` is passed
/// in by the dispatch loop so occurrence computation stays deterministic and
/// testable.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Stable producer name; doubles as the deduplication key for sinks
    fn name(&self) -> &str;

    /// Build this cycle's notification, or decide to stay quiet
    async fn produce(&self, now: DateTime<Utc>) -> Result<Production, ProducerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text() {
        let n = Notification::text("hello");
        assert_eq!(n.message, "hello");
        assert!(!n.flags.image);
        assert!(n.flags.filepath.is_none());
    }

    #[test]
    fn test_empty_message_detection() {
        assert!(Notification::text("").is_empty());
        assert!(Notification::text("   \n\t ").is_empty());
        assert!(!Notification::text("x").is_empty());
    }

    #[test]
    fn test_production_readiness() {
        assert!(Production::Ready(Notification::text("x")).is_ready());
        assert!(!Production::Ready(Notification::text("  ")).is_ready());
        assert!(!Production::suppressed("not a favourite").is_ready());
    }

    #[test]
    fn test_producer_error_recoverability() {
        let server = ProducerError::ServerError(503);
        assert!(server.is_recoverable());

        let extraction = ProducerError::Extraction {
            what: "daily runes",
        };
        assert!(!extraction.is_recoverable());
    }
}
