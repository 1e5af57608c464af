//! Early-stop decision for partitioned enumeration.

use serde::Serialize;

/// Default number of consecutive zero-yield partitions before giving up.
pub const DEFAULT_STAGNATION_LIMIT: u32 = 5;

/// Why enumeration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Unique count reached the server-reported total.
    Complete,
    /// Too many consecutive partitions contributed nothing new.
    Stagnated,
    /// Every partition was visited.
    Exhausted,
    /// A stop was requested.
    Cancelled,
}

/// Outcome of consulting the policy between partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Query the next partition.
    Continue,
    /// Stop enumerating.
    Stop(StopReason),
}

/// Pure stop rule over (unique so far, reported total, zero-new streak).
///
/// The stagnation limit is a tuning heuristic: the backend's query filter is
/// approximate, so a streak of empty partitions suggests, but does not prove,
/// that the catalog is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    stagnation_limit: u32,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STAGNATION_LIMIT)
    }
}

impl TerminationPolicy {
    /// Creates a policy; a limit of 0 disables the stagnation stop.
    #[must_use]
    pub fn new(stagnation_limit: u32) -> Self {
        Self { stagnation_limit }
    }

    /// Configured stagnation limit.
    #[must_use]
    pub fn stagnation_limit(&self) -> u32 {
        self.stagnation_limit
    }

    /// Decides whether another partition should be queried.
    ///
    /// `reported_total` is `None` when the server total is unknown, in which
    /// case only the stagnation rule can stop early.
    #[must_use]
    pub fn decide(&self, unique: u64, reported_total: Option<u64>, zero_new_streak: u32) -> Decision {
        if reported_total.is_some_and(|total| unique >= total) {
            return Decision::Stop(StopReason::Complete);
        }
        if self.stagnation_limit > 0 && zero_new_streak >= self.stagnation_limit {
            return Decision::Stop(StopReason::Stagnated);
        }
        Decision::Continue
    }
}
