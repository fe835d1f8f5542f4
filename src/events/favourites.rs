//! Favourite-events allow-list
//!
//! Loaded once at producer construction from a JSON document with a
//! top-level `favourite_events` key. Lookup is case-insensitive. Any load
//! failure degrades the filter to "disabled" — fail-open, logged, never
//! fatal: a broken favourites file must widen notifications, not silence
//! them.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading the favourites file
///
/// Callers do not normally see these; [`Favourites::load`] logs and
/// swallows them. They exist so the failure reason reaches the log intact.
#[derive(Error, Debug)]
pub enum FavouritesError {
    /// File could not be read
    #[error("Failed to read favourites file: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not valid JSON
    #[error("Failed to parse favourites file: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON is valid but the `favourite_events` key is missing
    #[error("Favourites file has no 'favourite_events' key")]
    MissingKey,
}

#[derive(Debug, Deserialize)]
struct FavouritesFile {
    favourite_events: Option<Vec<String>>,
}

/// Case-insensitive allow-list of event names
///
/// Read-only after construction. A disabled filter allows everything.
#[derive(Debug, Clone, Default)]
pub struct Favourites {
    names: HashSet<String>,
    enabled: bool,
}

impl Favourites {
    /// A filter that never suppresses anything
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build an active filter from a list of names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
            enabled: true,
        }
    }

    /// Load the allow-list from a JSON file
    ///
    /// On any failure the filter comes back disabled and the cause lands in
    /// the log at error level.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(favourites) => {
                tracing::debug!(
                    path = %path.display(),
                    count = favourites.names.len(),
                    "Loaded favourite events"
                );
                favourites
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Error loading favourite events, disabling favourites filter"
                );
                Self::disabled()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, FavouritesError> {
        let content = std::fs::read_to_string(path)?;
        let file: FavouritesFile = serde_json::from_str(&content)?;
        let names = file.favourite_events.ok_or(FavouritesError::MissingKey)?;
        Ok(Self::from_names(names))
    }

    /// Whether the filter is actively gating notifications
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Case-insensitive membership test
    pub fn is_favourite(&self, event_name: &str) -> bool {
        self.names.contains(&event_name.to_lowercase())
    }

    /// Whether a notification for this event may go out
    ///
    /// A disabled filter means "do not suppress", not "suppress everything".
    pub fn allows(&self, event_name: &str) -> bool {
        !self.enabled || self.is_favourite(event_name)
    }
}

// ============================================================================
// Tests
// ============================================================================
