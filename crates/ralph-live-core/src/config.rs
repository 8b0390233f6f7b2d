//! Tunable constants for the live-session components.
//!
//! Not user-facing in the UI, but loadable from the `[live]` table of the
//! CLI config file. Every field has a default so partial tables work.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Session list refresh interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Reachability check interval in seconds
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,

    /// Distance from the end (display units) still counted as "at bottom"
    #[serde(default = "default_auto_scroll_threshold")]
    pub auto_scroll_threshold: f64,

    /// Action records retained in history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Action records shown by default
    #[serde(default = "default_history_display_limit")]
    pub history_display_limit: usize,

    /// Reconnect attempts before the stream gives up with an error state
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// First reconnect delay in milliseconds, doubled on each attempt
    #[serde(default = "default_reconnect_base_delay")]
    pub reconnect_base_delay_ms: u64,

    /// Upper bound for the reconnect delay in milliseconds
    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay_ms: u64,

    /// Entries fetched over REST when attaching to an orchestrator
    #[serde(default = "default_recent_log_limit")]
    pub recent_log_limit: u32,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_health_interval() -> u64 {
    30
}

fn default_auto_scroll_threshold() -> f64 {
    100.0
}

fn default_history_capacity() -> usize {
    20
}

fn default_history_display_limit() -> usize {
    10
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay() -> u64 {
    500
}

fn default_reconnect_max_delay() -> u64 {
    10_000
}

fn default_recent_log_limit() -> u32 {
    200
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            health_interval_secs: default_health_interval(),
            auto_scroll_threshold: default_auto_scroll_threshold(),
            history_capacity: default_history_capacity(),
            history_display_limit: default_history_display_limit(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay(),
            reconnect_max_delay_ms: default_reconnect_max_delay(),
            recent_log_limit: default_recent_log_limit(),
        }
    }
}

impl LiveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }

    /// Backoff before reconnect attempt `attempt` (1-based).
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self
            .reconnect_base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.reconnect_max_delay_ms);
        Duration::from_millis(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LiveConfig::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.health_interval_secs, 30);
        assert_eq!(config.auto_scroll_threshold, 100.0);
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.history_display_limit, 10);
    }

    #[test]
    fn test_reconnect_delay_doubles_and_caps() {
        let config = LiveConfig::default();
        assert_eq!(config.reconnect_delay(1), Duration::from_millis(500));
        assert_eq!(config.reconnect_delay(2), Duration::from_millis(1000));
        assert_eq!(config.reconnect_delay(3), Duration::from_millis(2000));
        assert_eq!(config.reconnect_delay(10), Duration::from_millis(10_000));
        assert_eq!(config.reconnect_delay(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn test_partial_table_uses_defaults() {
        let config: LiveConfig = toml::from_str("history_capacity = 50").unwrap();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.max_reconnect_attempts, 5);
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let config = LiveConfig {
            poll_interval_secs: 0,
            health_interval_secs: 0,
            ..LiveConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.health_interval(), Duration::from_secs(1));
    }
}
