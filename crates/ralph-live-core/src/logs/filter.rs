//! LevelFilter - a pure view over the log sequence.
//!
//! The last enabled level cannot be switched off; `toggle_level` refuses
//! and reports it, so the view is never empty because of the filter alone.

use crate::types::{LogEntry, LogLevel};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFilter {
    enabled: BTreeSet<LogLevel>,
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self {
            enabled: LogLevel::ALL.into_iter().collect(),
        }
    }
}

impl LevelFilter {
    /// All levels enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the given levels enabled. An empty set falls back to all levels.
    pub fn with_levels<I: IntoIterator<Item = LogLevel>>(levels: I) -> Self {
        let enabled: BTreeSet<LogLevel> = levels.into_iter().collect();
        if enabled.is_empty() {
            Self::default()
        } else {
            Self { enabled }
        }
    }

    /// Flip a level. Returns false (and changes nothing) when asked to
    /// disable the only enabled level.
    pub fn toggle_level(&mut self, level: LogLevel) -> bool {
        if self.enabled.contains(&level) {
            if self.enabled.len() == 1 {
                return false;
            }
            self.enabled.remove(&level);
        } else {
            self.enabled.insert(level);
        }
        true
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.enabled.contains(&level)
    }

    pub fn enabled_levels(&self) -> impl Iterator<Item = LogLevel> + '_ {
        self.enabled.iter().copied()
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.enabled.contains(&entry.level)
    }

    /// Entries whose level is enabled, in their original order.
    pub fn apply<'a>(&self, entries: &'a [LogEntry]) -> Vec<&'a LogEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}
