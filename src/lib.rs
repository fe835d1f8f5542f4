//! dndwatch - RuneScape Distractions & Diversions watcher
//!
//! A scheduled notification system that tracks recurring in-game timed events
//! and posts human-readable alerts to Telegram, superseding the previous
//! message for an event instead of piling up duplicates.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`rotation`] - Occurrence calculator for the fixed flash-event rotation
//! - [`events`] - Event producers (hourly flash events, daily Rune Goldberg)
//! - [`sinks`] - Notification delivery targets with per-key deduplication
//! - [`dispatch`] - Cycle runner with per-producer failure isolation
//! - [`scheduler`] - Wall-clock daily/hourly triggers
//!
//! # Example
//!
//! ```no_run
//! use dndwatch::config::Config;
//! use dndwatch::dispatch::{CycleKind, Dispatcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let dispatcher = Dispatcher::from_config(&config)?;
//!     dispatcher.run_cycle(CycleKind::Hourly).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod rotation;
pub mod scheduler;
pub mod sinks;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatch::{CycleKind, CycleSummary, Dispatcher};
    pub use crate::error::{Error, Result};
    pub use crate::events::{Notification, NotificationFlags, Producer, Production};
    pub use crate::rotation::{Occurrence, RotationTable};
    pub use crate::sinks::{DeliveryReceipt, Sink};
}

pub use events::{Notification, NotificationFlags};
pub use rotation::RotationTable;
