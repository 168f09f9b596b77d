//! Adaptive confidence scaling from dispatch outcomes
//!
//! Plain success/failure counters per action. The multiplier is bounded so
//! past successes can nudge an ambiguous match over the line but never
//! dominate the similarity score.

use std::collections::HashMap;

use serde::Serialize;

/// Bucket recording utterances that matched no command
pub const NO_MATCH_BUCKET: &str = "no_match";

/// Largest extra weight a perfect success rate can add
const MAX_BOOST: f64 = 0.2;

/// Outcome counters for one action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LearningStat {
    /// Successful dispatches
    pub success_count: u32,

    /// Failed dispatches
    pub failure_count: u32,
}

impl LearningStat {
    /// Fraction of successful outcomes, 0 when nothing was recorded
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let total = u64::from(self.success_count) + u64::from(self.failure_count);
        if total == 0 {
            return 0.0;
        }
        f64::from(self.success_count) / total as f64
    }
}

/// Outcome counters keyed by action name
#[derive(Debug, Clone, Default)]
pub struct LearningStats {
    stats: HashMap<String, LearningStat>,
}

impl LearningStats {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful dispatch
    pub fn record_success(&mut self, key: &str) {
        let stat = self.stats.entry(key.to_string()).or_default();
        stat.success_count = stat.success_count.saturating_add(1);
    }

    /// Record a failed dispatch
    pub fn record_failure(&mut self, key: &str) {
        let stat = self.stats.entry(key.to_string()).or_default();
        stat.failure_count = stat.failure_count.saturating_add(1);
    }

    /// Counters for `key`, zero when never seen
    #[must_use]
    pub fn get(&self, key: &str) -> LearningStat {
        self.stats.get(key).copied().unwrap_or_default()
    }

    /// Confidence multiplier in [1.0, 1.2]
    #[must_use]
    pub fn multiplier(&self, key: &str) -> f64 {
        MAX_BOOST.mul_add(self.get(key).success_rate(), 1.0)
    }

    /// Forget every recorded outcome
    pub fn reset(&mut self) {
        self.stats.clear();
    }

    /// Iterate over all recorded counters
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LearningStat)> {
        self.stats.iter().map(|(k, v)| (k.as_str(), v))
    }
}
