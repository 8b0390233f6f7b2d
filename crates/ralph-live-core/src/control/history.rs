//! ActionHistoryLog - bounded audit trail of control commands.
//!
//! Records are inserted newest-first in call order and resolved in place by
//! id, so a slow command issued early stays below a fast one issued later.

use crate::error::{Error, Result};
use crate::types::{ActionRecord, ActionStatus, ActionType};
use chrono::Utc;
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ActionHistoryLog {
    /// Front is newest.
    records: VecDeque<ActionRecord>,
    capacity: usize,
}

impl ActionHistoryLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepend a pending record and evict the oldest beyond capacity.
    /// Returns the new record's id.
    pub fn record(
        &mut self,
        action_type: ActionType,
        orchestrator_id: &str,
        orchestrator_name: &str,
    ) -> String {
        let record = ActionRecord {
            id: Uuid::new_v4().to_string(),
            action_type,
            orchestrator_id: orchestrator_id.to_string(),
            orchestrator_name: orchestrator_name.to_string(),
            timestamp: Utc::now(),
            status: ActionStatus::Pending,
            error: None,
        };
        let id = record.id.clone();
        self.records.push_front(record);
        self.records.truncate(self.capacity);
        id
    }

    /// Move a pending record to `success` or `failed`. Each record resolves
    /// at most once.
    pub fn resolve(
        &mut self,
        action_id: &str,
        status: ActionStatus,
        error: Option<String>,
    ) -> Result<&ActionRecord> {
        if status == ActionStatus::Pending {
            return Err(Error::InvalidTransition(
                "actions resolve to success or failed".into(),
            ));
        }
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == action_id)
            .ok_or_else(|| Error::ActionNotFound(action_id.to_string()))?;
        if record.status != ActionStatus::Pending {
            return Err(Error::ActionAlreadyResolved(action_id.to_string()));
        }
        record.status = status;
        record.error = error;
        Ok(record)
    }

    /// Fill in the target of a pending record once the server has named it.
    pub fn attach(
        &mut self,
        action_id: &str,
        orchestrator_id: &str,
        orchestrator_name: &str,
    ) -> Result<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == action_id)
            .ok_or_else(|| Error::ActionNotFound(action_id.to_string()))?;
        if record.status != ActionStatus::Pending {
            return Err(Error::ActionAlreadyResolved(action_id.to_string()));
        }
        record.orchestrator_id = orchestrator_id.to_string();
        record.orchestrator_name = orchestrator_name.to_string();
        Ok(())
    }

    pub fn get(&self, action_id: &str) -> Option<&ActionRecord> {
        self.records.iter().find(|r| r.id == action_id)
    }

    /// All retained records, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter()
    }

    /// Up to `limit` records for display, sorted by timestamp descending.
    /// Insertion order breaks ties.
    pub fn recent(&self, limit: usize) -> Vec<ActionRecord> {
        let mut out: Vec<ActionRecord> = self.records.iter().cloned().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        out
    }

    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == ActionStatus::Pending)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ActionHistoryLog {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_prepends_pending() {
        let mut log = ActionHistoryLog::default();
        let first = log.record(ActionType::Start, "o1", "alpha");
        let second = log.record(ActionType::Pause, "o1", "alpha");

        let ids: Vec<&str> = log.entries().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
        assert!(log.entries().all(|r| r.status == ActionStatus::Pending));
        assert_eq!(log.pending_count(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = ActionHistoryLog::new(3);
        let oldest = log.record(ActionType::Start, "o", "n");
        for _ in 0..5 {
            log.record(ActionType::Pause, "o", "n");
            assert!(log.len() <= 3);
        }
        assert_eq!(log.len(), 3);
        assert!(log.get(&oldest).is_none());
        assert!(matches!(
            log.resolve(&oldest, ActionStatus::Success, None),
            Err(Error::ActionNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_by_id_out_of_order() {
        let mut log = ActionHistoryLog::default();
        let stop = log.record(ActionType::Stop, "o1", "alpha");
        let pause = log.record(ActionType::Pause, "o2", "beta");

        log.resolve(&pause, ActionStatus::Success, None).unwrap();
        log.resolve(&stop, ActionStatus::Failed, Some("timeout".into()))
            .unwrap();

        let records: Vec<&ActionRecord> = log.entries().collect();
        assert_eq!(records[0].id, pause);
        assert_eq!(records[0].status, ActionStatus::Success);
        assert_eq!(records[1].id, stop);
        assert_eq!(records[1].error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_resolve_at_most_once() {
        let mut log = ActionHistoryLog::default();
        let id = log.record(ActionType::Resume, "o", "n");
        log.resolve(&id, ActionStatus::Success, None).unwrap();
        assert!(matches!(
            log.resolve(&id, ActionStatus::Failed, Some("late".into())),
            Err(Error::ActionAlreadyResolved(_))
        ));
        assert_eq!(log.get(&id).unwrap().status, ActionStatus::Success);
    }

    #[test]
    fn test_resolve_to_pending_is_rejected() {
        let mut log = ActionHistoryLog::default();
        let id = log.record(ActionType::Resume, "o", "n");
        assert!(log.resolve(&id, ActionStatus::Pending, None).is_err());
    }

    #[test]
    fn test_recent_is_limited_and_newest_first() {
        let mut log = ActionHistoryLog::default();
        let mut ids = Vec::new();
        for _ in 0..15 {
            ids.push(log.record(ActionType::Pause, "o", "n"));
        }
        let recent = log.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, ids[14]);
        assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }
}
