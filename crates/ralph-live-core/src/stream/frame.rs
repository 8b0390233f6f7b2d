//! Log frame decoding.
//!
//! Wire shape: `{id, timestamp (RFC 3339), level, message, metadata?}`.
//! A frame that fails to decode is dropped on its own; it never affects
//! the frames around it.

use crate::types::LogEntry;
use tracing::debug;

/// Decode one text frame. Returns `None` for malformed JSON, unknown
/// levels, bad timestamps or an empty id.
pub fn decode_frame(raw: &str) -> Option<LogEntry> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<LogEntry>(raw) {
        Ok(entry) => accept(entry),
        Err(e) => {
            debug!(error = %e, "Dropping malformed log frame");
            None
        }
    }
}

/// Decode an already-parsed JSON value (REST backfill).
pub fn decode_value(value: serde_json::Value) -> Option<LogEntry> {
    match serde_json::from_value::<LogEntry>(value) {
        Ok(entry) => accept(entry),
        Err(e) => {
            debug!(error = %e, "Dropping malformed log entry");
            None
        }
    }
}

fn accept(entry: LogEntry) -> Option<LogEntry> {
    if entry.id.trim().is_empty() {
        debug!("Dropping log frame without id");
        return None;
    }
    Some(entry)
}
