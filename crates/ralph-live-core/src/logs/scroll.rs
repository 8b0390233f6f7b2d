//! AutoScrollController - follow the newest entry only while the user is
//! already at the bottom.
//!
//! Arrivals only mark a scroll as pending; the renderer drains it with
//! `take_scroll_request` once per frame, so a burst of entries becomes one
//! scroll-to-end.

#[derive(Debug, Clone)]
pub struct AutoScrollController {
    threshold: f64,
    is_at_bottom: bool,
    pending_scroll: bool,
    issued: u64,
}

impl AutoScrollController {
    /// Starts at the bottom.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            is_at_bottom: true,
            pending_scroll: false,
            issued: 0,
        }
    }

    pub fn is_at_bottom(&self) -> bool {
        self.is_at_bottom
    }

    /// Feed a scroll-position event.
    pub fn on_scroll(&mut self, content_extent: f64, viewport_extent: f64, scroll_offset: f64) {
        let distance_from_end = content_extent - viewport_extent - scroll_offset;
        self.is_at_bottom = distance_from_end < self.threshold;
        if !self.is_at_bottom {
            self.pending_scroll = false;
        }
    }

    /// Record that `count` new entries became visible.
    pub fn entries_arrived(&mut self, count: usize) {
        if count > 0 && self.is_at_bottom {
            self.pending_scroll = true;
        }
    }

    /// At most one scroll-to-end per drained batch.
    pub fn take_scroll_request(&mut self) -> bool {
        if std::mem::take(&mut self.pending_scroll) {
            self.issued += 1;
            true
        } else {
            false
        }
    }

    /// Shorthand for one complete batch: arrival followed by a drain.
    pub fn on_batch(&mut self, count: usize) -> bool {
        self.entries_arrived(count);
        self.take_scroll_request()
    }

    /// Total scroll-to-end requests issued.
    pub fn requests_issued(&self) -> u64 {
        self.issued
    }
}

impl Default for AutoScrollController {
    fn default() -> Self {
        Self::new(100.0)
    }
}
