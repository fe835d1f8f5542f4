//! Per-sink deduplication table
//!
//! Maps a logical event key to the remote identifiers of its outstanding
//! messages. Process-lifetime only: the table dies with the process, and a
//! restart simply stops tracking messages sent before it.
//!
//! The table itself is a plain data structure; the delete-then-send protocol
//! around it lives in each sink's `deliver`. Keeping the state separate keeps
//! the invariant testable: at most one active identifier set per key.

use std::collections::HashMap;

/// Outstanding message identifiers per event key
#[derive(Debug, Default)]
pub struct DedupTable {
    entries: HashMap<String, Vec<i64>>,
}

impl DedupTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the outstanding identifiers for a key
    ///
    /// The caller is expected to delete the returned messages remotely. The
    /// slot is empty afterwards; it stays empty until a confirmed send
    /// records new identifiers.
    pub fn take(&mut self, key: &str) -> Vec<i64> {
        self.entries.remove(key).unwrap_or_default()
    }

    /// Record the identifiers of a confirmed send, replacing any previous set
    pub fn record(&mut self, key: impl Into<String>, message_ids: Vec<i64>) {
        self.entries.insert(key.into(), message_ids);
    }

    /// Identifiers currently outstanding for a key
    pub fn outstanding(&self, key: &str) -> &[i64] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of keys with outstanding messages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table tracks no messages at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
