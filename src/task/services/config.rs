//! Tunables for the lifecycle and statistics services.

use serde::Deserialize;

/// Configuration for [`super::TaskLifecycleService`] and
/// [`super::StatisticsService`].
///
/// Deserializes from the host application's configuration; missing fields
/// take their defaults.
///
/// # Examples
///
/// ```
/// use foreman::task::services::LifecycleConfig;
///
/// let config = LifecycleConfig::default().with_max_commit_attempts(5);
/// assert_eq!(config.max_commit_attempts, 5);
/// assert_eq!(config.max_rejection_reason_len, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How many times a trigger is re-planned after a commit-time capacity
    /// conflict before giving up.
    pub max_commit_attempts: u32,
    /// Longest accepted rejection reason, in characters.
    pub max_rejection_reason_len: usize,
    /// Number of workers returned by each statistics ranking.
    pub statistics_top_n: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: 3,
            max_rejection_reason_len: 500,
            statistics_top_n: 5,
        }
    }
}

impl LifecycleConfig {
    /// Sets the commit retry budget. Values below one are raised to one.
    #[must_use]
    pub const fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    /// Sets the rejection reason limit.
    #[must_use]
    pub const fn with_max_rejection_reason_len(mut self, limit: usize) -> Self {
        self.max_rejection_reason_len = limit;
        self
    }

    /// Sets the ranking length used by statistics.
    #[must_use]
    pub const fn with_statistics_top_n(mut self, top_n: usize) -> Self {
        self.statistics_top_n = top_n;
        self
    }
}
