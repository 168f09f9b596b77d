//! Recent transcript history
//!
//! Bounded FIFO of raw final transcripts, used for duplicate suppression
//! and the wake phrase follow-up boost.

use std::collections::VecDeque;

/// Default number of transcripts retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Bounded FIFO of recent final transcripts
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl CommandHistory {
    /// Create a history holding at most `capacity` entries
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a transcript, evicting the oldest beyond capacity
    pub fn push(&mut self, transcript: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(transcript.into());
    }

    /// Whether `transcript` equals one of the last `window` entries
    #[must_use]
    pub fn is_recent_duplicate(&self, transcript: &str, window: usize) -> bool {
        self.entries.iter().rev().take(window).any(|e| e == transcript)
    }

    /// The last `n` entries, oldest first
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Number of entries retained
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
