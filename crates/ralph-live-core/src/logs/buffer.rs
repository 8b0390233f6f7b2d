//! LogStreamBuffer - append-only log store with pause/replay.
//!
//! The master sequence holds every entry in arrival order. While paused,
//! new entries queue behind the display watermark instead of becoming
//! visible; resuming moves the watermark to the end, which releases the
//! queued entries in their original order.

use crate::types::LogEntry;

#[derive(Debug, Default)]
pub struct LogStreamBuffer {
    entries: Vec<LogEntry>,
    /// entries[..displayed] is the visible sequence; the rest is the
    /// side buffer accumulated while paused.
    displayed: usize,
    paused: bool,
}

impl LogStreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the master sequence. Returns true if the entry became
    /// visible immediately.
    pub fn append(&mut self, entry: LogEntry) -> bool {
        self.entries.push(entry);
        if self.paused {
            false
        } else {
            self.displayed = self.entries.len();
            true
        }
    }

    /// Pause or resume display. Returns the newly visible entries when
    /// resuming (empty otherwise).
    pub fn set_paused(&mut self, paused: bool) -> &[LogEntry] {
        if self.paused == paused {
            return &[];
        }
        self.paused = paused;
        if paused {
            return &[];
        }
        let flushed_from = self.displayed;
        self.displayed = self.entries.len();
        &self.entries[flushed_from..]
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Visible entries in arrival order.
    pub fn logs(&self) -> &[LogEntry] {
        &self.entries[..self.displayed]
    }

    /// Every entry received, visible or not.
    pub fn master(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries held back while paused.
    pub fn pending(&self) -> &[LogEntry] {
        &self.entries[self.displayed..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty both the master sequence and the side buffer. Pause state is
    /// kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.displayed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLevel;
    use chrono::Utc;

    fn entry(id: usize) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: format!("line {}", id),
            metadata: None,
        }
    }

    fn ids(entries: &[LogEntry]) -> Vec<String> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_append_while_live_is_visible() {
        let mut buffer = LogStreamBuffer::new();
        assert!(buffer.append(entry(1)));
        assert_eq!(buffer.logs().len(), 1);
        assert!(buffer.pending().is_empty());
    }

    #[test]
    fn test_pause_holds_entries_until_resume() {
        let mut buffer = LogStreamBuffer::new();
        buffer.append(entry(1));
        assert!(buffer.set_paused(true).is_empty());

        assert!(!buffer.append(entry(2)));
        assert!(!buffer.append(entry(3)));
        assert_eq!(ids(buffer.logs()), vec!["1"]);
        assert_eq!(ids(buffer.pending()), vec!["2", "3"]);
        assert_eq!(buffer.master().len(), 3);

        let flushed = ids(buffer.set_paused(false));
        assert_eq!(flushed, vec!["2", "3"]);
        assert_eq!(ids(buffer.logs()), vec!["1", "2", "3"]);
        assert!(buffer.pending().is_empty());
    }

    #[test]
    fn test_repeated_pause_calls_are_noops() {
        let mut buffer = LogStreamBuffer::new();
        buffer.set_paused(true);
        buffer.append(entry(1));
        buffer.set_paused(true);
        assert_eq!(buffer.pending().len(), 1);
        assert_eq!(buffer.set_paused(false).len(), 1);
        assert!(buffer.set_paused(false).is_empty());
    }

    #[test]
    fn test_clear_empties_master_and_side_buffer() {
        let mut buffer = LogStreamBuffer::new();
        buffer.append(entry(1));
        buffer.set_paused(true);
        buffer.append(entry(2));

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.logs().is_empty());
        assert!(buffer.pending().is_empty());
        assert!(buffer.is_paused());

        buffer.append(entry(3));
        assert_eq!(ids(buffer.set_paused(false)), vec!["3"]);
    }

    #[test]
    fn test_interleaved_pause_resume_preserves_arrival_order() {
        // Deterministic pseudo-random interleaving of appends and toggles
        let mut buffer = LogStreamBuffer::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next_id = 0;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            match seed % 5 {
                0 => {
                    buffer.set_paused(true);
                }
                1 => {
                    buffer.set_paused(false);
                }
                _ => {
                    buffer.append(entry(next_id));
                    next_id += 1;
                }
            }
        }
        buffer.set_paused(false);

        let expected: Vec<String> = (0..next_id).map(|i| i.to_string()).collect();
        assert_eq!(ids(buffer.logs()), expected);
        assert_eq!(ids(buffer.master()), expected);
    }
}
