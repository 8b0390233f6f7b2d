//! LiveLogView - buffer, level filter and auto-scroll composed into the
//! single object a renderer reads from.

use super::{AutoScrollController, LevelFilter, LogStreamBuffer};
use crate::config::LiveConfig;
use crate::types::{LogEntry, LogLevel};

#[derive(Debug)]
pub struct LiveLogView {
    buffer: LogStreamBuffer,
    filter: LevelFilter,
    scroll: AutoScrollController,
}

impl LiveLogView {
    pub fn new(config: &LiveConfig) -> Self {
        Self::with_filter(config, LevelFilter::new())
    }

    pub fn with_filter(config: &LiveConfig, filter: LevelFilter) -> Self {
        Self {
            buffer: LogStreamBuffer::new(),
            filter,
            scroll: AutoScrollController::new(config.auto_scroll_threshold),
        }
    }

    /// Append a batch in order, then notify auto-scroll once for the
    /// entries that became visible. Returns that visible count.
    pub fn ingest_batch<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = LogEntry>,
    {
        let mut visible = 0;
        for entry in entries {
            let passes = self.filter.matches(&entry);
            if self.buffer.append(entry) && passes {
                visible += 1;
            }
        }
        self.scroll.entries_arrived(visible);
        visible
    }

    pub fn ingest(&mut self, entry: LogEntry) -> usize {
        self.ingest_batch(std::iter::once(entry))
    }

    /// Pause/resume display. Resuming releases the held-back entries,
    /// which counts as one batch for auto-scroll. Returns the released
    /// entries that pass the filter.
    pub fn set_paused(&mut self, paused: bool) -> Vec<LogEntry> {
        let released: Vec<LogEntry> = self
            .buffer
            .set_paused(paused)
            .iter()
            .filter(|e| self.filter.matches(e))
            .cloned()
            .collect();
        self.scroll.entries_arrived(released.len());
        released
    }

    pub fn is_paused(&self) -> bool {
        self.buffer.is_paused()
    }

    pub fn toggle_level(&mut self, level: LogLevel) -> bool {
        self.filter.toggle_level(level)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Visible entries that pass the level filter.
    pub fn filtered_logs(&self) -> Vec<&LogEntry> {
        self.filter.apply(self.buffer.logs())
    }

    pub fn buffer(&self) -> &LogStreamBuffer {
        &self.buffer
    }

    pub fn filter(&self) -> &LevelFilter {
        &self.filter
    }

    pub fn on_scroll(&mut self, content_extent: f64, viewport_extent: f64, scroll_offset: f64) {
        self.scroll
            .on_scroll(content_extent, viewport_extent, scroll_offset);
    }

    pub fn take_scroll_request(&mut self) -> bool {
        self.scroll.take_scroll_request()
    }

    pub fn auto_scroll(&self) -> &AutoScrollController {
        &self.scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: &str, level: LogLevel) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            timestamp: Utc::now(),
            level,
            message: format!("msg {}", id),
            metadata: None,
        }
    }

    fn view() -> LiveLogView {
        LiveLogView::new(&LiveConfig::default())
    }

    #[test]
    fn test_filter_tracks_both_inputs() {
        let mut view = view();
        view.ingest_batch(vec![
            entry("1", LogLevel::Debug),
            entry("2", LogLevel::Info),
            entry("3", LogLevel::Error),
        ]);
        assert_eq!(view.filtered_logs().len(), 3);

        view.toggle_level(LogLevel::Debug);
        assert_eq!(view.filtered_logs().len(), 2);

        view.ingest(entry("4", LogLevel::Debug));
        assert_eq!(view.filtered_logs().len(), 2);
        assert_eq!(view.buffer().master().len(), 4);

        view.toggle_level(LogLevel::Debug);
        let ids: Vec<&str> = view.filtered_logs().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_clear_empties_filtered_view() {
        let mut view = view();
        view.ingest(entry("1", LogLevel::Info));
        view.clear();
        assert!(view.filtered_logs().is_empty());
        assert!(view.buffer().is_empty());
    }

    #[test]
    fn test_batch_coalesces_into_one_scroll() {
        let mut view = view();
        let batch: Vec<_> = (0..25).map(|i| entry(&i.to_string(), LogLevel::Info)).collect();
        assert_eq!(view.ingest_batch(batch), 25);
        assert!(view.take_scroll_request());
        assert!(!view.take_scroll_request());
        assert_eq!(view.auto_scroll().requests_issued(), 1);
    }

    #[test]
    fn test_paused_arrivals_scroll_on_resume() {
        let mut view = view();
        view.set_paused(true);
        assert_eq!(view.ingest(entry("1", LogLevel::Info)), 0);
        assert!(!view.take_scroll_request());

        let released = view.set_paused(false);
        assert_eq!(released.len(), 1);
        assert!(view.take_scroll_request());
    }

    #[test]
    fn test_filtered_out_arrivals_do_not_scroll() {
        let mut view = LiveLogView::with_filter(
            &LiveConfig::default(),
            LevelFilter::with_levels([LogLevel::Error]),
        );
        assert_eq!(view.ingest(entry("1", LogLevel::Debug)), 0);
        assert!(!view.take_scroll_request());
    }
}
