//! Unified error handling for the dndwatch crate
//!
//! Domain-specific errors ([`RotationError`], [`ProducerError`], [`SinkError`])
//! live next to the code that raises them; this module folds them into a
//! single [`Error`] enum for use across module boundaries.

use std::io;
use thiserror::Error;

pub use crate::events::ProducerError;
pub use crate::rotation::RotationError;
pub use crate::sinks::SinkError;

/// Unified error type for the dndwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Rotation and occurrence-window errors
    #[error("Rotation error: {0}")]
    Rotation(#[from] RotationError),

    /// Event producer errors
    #[error("Producer error: {0}")]
    Producer(#[from] ProducerError),

    /// Notification sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is recoverable (the next cycle may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Rotation(_) => true,
            Self::Producer(e) => e.is_recoverable(),
            Self::Sink(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Http(_) => true,
            Self::Config(_) => false,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
