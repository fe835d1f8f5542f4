//! Notification sinks
//!
//! A sink is a delivery target for rendered notifications. Each sink owns a
//! private [`DedupTable`](dedup::DedupTable) so that at most one live message
//! exists per event key at any time: a new delivery for a key first deletes
//! the key's previous messages, then sends, then records the new identifiers.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │               DispatchLoop                 │
//! │   deliver(message, flags, key) per sink    │
//! └────────────────────┬───────────────────────┘
//!                      ▼
//!              ┌──────────────┐
//!              │ TelegramSink │───▶ delete old ▶ send new ▶ record ids
//!              │  DedupTable  │
//!              └──────────────┘
//! ```

pub mod dedup;
pub mod telegram;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::events::NotificationFlags;

// Re-exports
pub use dedup::DedupTable;
pub use telegram::{TelegramConfig, TelegramSink};

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors that can occur during delivery
#[derive(Error, Debug)]
pub enum SinkError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API rejected the request
    #[error("API error (status {status}): {description}")]
    Api { status: u16, description: String },

    /// Attachment file could not be read
    #[error("Failed to read attachment: {0}")]
    Attachment(#[from] std::io::Error),

    /// Invalid sink configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SinkError {
    /// Check if this error is recoverable (a later delivery may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Api { .. } => true,
            Self::Attachment(_) => true,
            Self::InvalidConfig(_) => false,
        }
    }
}

/// Record of a successful delivery
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Sink that delivered the notification
    pub channel: String,
    /// Remote identifiers of the messages created by this delivery
    pub message_ids: Vec<i64>,
    /// When the delivery completed
    pub timestamp: DateTime<Utc>,
}

impl DeliveryReceipt {
    /// Create a receipt for the given channel and message ids
    pub fn new(channel: impl Into<String>, message_ids: Vec<i64>) -> Self {
        Self {
            channel: channel.into(),
            message_ids,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for notification sinks
///
/// Implement this trait to add a delivery target. `delete_previous_key`
/// identifies the logical event; when present, the sink supersedes the
/// previous delivery recorded under that key before sending the new one.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Get the sink name
    fn name(&self) -> &str;

    /// Deliver a notification, superseding the previous one for the key
    async fn deliver(
        &self,
        message: &str,
        flags: &NotificationFlags,
        delete_previous_key: Option<&str>,
    ) -> SinkResult<DeliveryReceipt>;
}
