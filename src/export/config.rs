//! Export tuning.

use std::time::Duration;

use crate::api::{MotionPreferences, PosePreferences};

/// Maximum poll cycles before a job is abandoned.
pub const DEFAULT_POLL_BUDGET: u32 = 120;

/// Fixed wait after a 429 response (30 seconds).
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(30);

/// Default pause between items (500 ms).
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(500);

/// Floor applied to the poll interval when derived from a user delay.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timing and preference settings for export jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Wait before each poll of the job monitor.
    pub poll_interval: Duration,
    /// Poll cycles allowed before the job times out.
    pub poll_budget: u32,
    /// Wait after a 429 during submission or polling.
    pub rate_limit_backoff: Duration,
    /// Pause after each item that issued network activity.
    pub item_delay: Duration,
    /// Preferences for motion exports.
    pub motion_preferences: MotionPreferences,
    /// Preferences for neutral-pose exports.
    pub pose_preferences: PosePreferences,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::from_delay(DEFAULT_ITEM_DELAY)
    }
}

impl ExportConfig {
    /// Derives the settings from a single user-facing delay: items are spaced
    /// by `delay`, polls by `delay` but never less than one second.
    #[must_use]
    pub fn from_delay(delay: Duration) -> Self {
        Self {
            poll_interval: delay.max(MIN_POLL_INTERVAL),
            poll_budget: DEFAULT_POLL_BUDGET,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            item_delay: delay,
            motion_preferences: MotionPreferences::default(),
            pose_preferences: PosePreferences::default(),
        }
    }

    /// Overrides the poll interval as given, without the one-second floor.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the poll budget.
    #[must_use]
    pub fn with_poll_budget(mut self, budget: u32) -> Self {
        self.poll_budget = budget;
        self
    }

    /// Overrides the rate-limit backoff.
    #[must_use]
    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Overrides the delay between items.
    #[must_use]
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_config_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.poll_budget, 120);
        assert_eq!(config.rate_limit_backoff, Duration::from_secs(30));
        assert_eq!(config.item_delay, Duration::from_millis(500));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.motion_preferences.fps, "24");
        assert_eq!(config.pose_preferences.mesh, "t-pose");
    }

    #[test]
    fn test_from_delay_floors_poll_interval() {
        let short = ExportConfig::from_delay(Duration::from_millis(200));
        assert_eq!(short.poll_interval, Duration::from_secs(1));
        assert_eq!(short.item_delay, Duration::from_millis(200));

        let long = ExportConfig::from_delay(Duration::from_secs(3));
        assert_eq!(long.poll_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_with_poll_interval_bypasses_floor() {
        let config = ExportConfig::default().with_poll_interval(Duration::from_millis(5));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
    }
}
