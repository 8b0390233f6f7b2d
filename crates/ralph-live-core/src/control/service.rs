//! OrchestratorControlService - start/stop/pause/resume against the active
//! orchestrator.
//!
//! Pause, resume and stop target the active orchestrator only: the first
//! one that is running or paused. Status is only ever taken from server
//! responses. A failed command leaves
//! the orchestrator untouched and records the error on its ActionRecord.
//! At most one command is in flight; anything issued meanwhile is rejected
//! with [`Error::MutationInFlight`] before a record is created.

use super::history::ActionHistoryLog;
use crate::client::OrchestratorApi;
use crate::config::LiveConfig;
use crate::error::{Error, Result};
use crate::types::{
    ActionRecord, ActionStatus, ActionType, Orchestrator, OrchestratorMetrics, OrchestratorStatus,
    StartRequest, find_active,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

#[derive(Debug)]
struct InFlight {
    action_id: String,
    action_type: ActionType,
}

#[derive(Debug)]
struct ControlState {
    orchestrators: Vec<Orchestrator>,
    selected: Option<String>,
    history: ActionHistoryLog,
    in_flight: Option<InFlight>,
}

impl ControlState {
    fn find(&self, orchestrator_id: &str) -> Result<&Orchestrator> {
        self.orchestrators
            .iter()
            .find(|o| o.id == orchestrator_id)
            .ok_or_else(|| Error::NotFound(format!("orchestrator {}", orchestrator_id)))
    }

    fn ensure_idle(&self) -> Result<()> {
        match &self.in_flight {
            Some(current) => {
                warn!(
                    action_id = %current.action_id,
                    action = %current.action_type,
                    "Command rejected while another is in flight"
                );
                Err(Error::MutationInFlight)
            }
            None => Ok(()),
        }
    }

    /// Commands only go to the first running or paused orchestrator.
    fn ensure_active_target(&self, orchestrator_id: &str) -> Result<()> {
        match find_active(&self.orchestrators) {
            Some(active) if active.id == orchestrator_id => Ok(()),
            _ => Err(Error::NotActive(orchestrator_id.to_string())),
        }
    }

    fn apply_status(&mut self, orchestrator_id: &str, status: OrchestratorStatus) {
        if let Some(orch) = self
            .orchestrators
            .iter_mut()
            .find(|o| o.id == orchestrator_id)
        {
            orch.status = status;
        }
    }
}

fn lock(state: &Mutex<ControlState>) -> MutexGuard<'_, ControlState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Proof that the user confirmed a stop. Only [`OrchestratorControlService::request_stop`]
/// creates one; dropping it cancels the stop.
#[derive(Debug)]
#[must_use = "a stop only happens when the confirmation is passed to stop()"]
pub struct StopConfirmation {
    orchestrator_id: String,
    orchestrator_name: String,
}

impl StopConfirmation {
    pub fn orchestrator_id(&self) -> &str {
        &self.orchestrator_id
    }

    pub fn orchestrator_name(&self) -> &str {
        &self.orchestrator_name
    }
}

/// Marks the single in-flight command. If the command future is dropped
/// before it completes, the record resolves as `failed("cancelled")`.
struct InFlightGuard {
    state: Arc<Mutex<ControlState>>,
    action_id: String,
    orchestrator_id: String,
    selected_at_dispatch: Option<String>,
    armed: bool,
}

impl InFlightGuard {
    fn action_id(&self) -> &str {
        &self.action_id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(&self.state);
        state.in_flight = None;
        if let Err(e) = state.history.resolve(
            &self.action_id,
            ActionStatus::Failed,
            Some("cancelled".to_string()),
        ) {
            warn!(action_id = %self.action_id, error = %e, "Could not cancel action");
        }
        info!(
            action_id = %self.action_id,
            orchestrator_id = %self.orchestrator_id,
            "Command cancelled before completion"
        );
    }
}

/// Issues control commands and keeps the action history.
pub struct OrchestratorControlService {
    api: Arc<dyn OrchestratorApi>,
    state: Arc<Mutex<ControlState>>,
    display_limit: usize,
}

impl OrchestratorControlService {
    pub fn new(api: Arc<dyn OrchestratorApi>, config: &LiveConfig) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(ControlState {
                orchestrators: Vec::new(),
                selected: None,
                history: ActionHistoryLog::new(config.history_capacity),
                in_flight: None,
            })),
            display_limit: config.history_display_limit,
        }
    }

    // ─── Snapshot ────────────────────────────────────────────────────────────

    /// Replace the known orchestrators with a fresh server listing.
    pub fn sync_sessions(&self, orchestrators: &[Orchestrator]) {
        lock(&self.state).orchestrators = orchestrators.to_vec();
    }

    pub fn orchestrators(&self) -> Vec<Orchestrator> {
        lock(&self.state).orchestrators.clone()
    }

    /// Change which orchestrator the UI is showing. Responses for commands
    /// against a previous selection no longer touch visible status.
    pub fn select(&self, orchestrator_id: Option<&str>) {
        lock(&self.state).selected = orchestrator_id.map(str::to_string);
    }

    pub fn selected(&self) -> Option<Orchestrator> {
        let state = lock(&self.state);
        let id = state.selected.as_deref()?;
        state.find(id).ok().cloned()
    }

    /// The running or paused orchestrator, if there is one.
    pub fn active(&self) -> Option<Orchestrator> {
        find_active(&lock(&self.state).orchestrators).cloned()
    }

    /// True while a command is outstanding. The UI disables commands while set.
    pub fn is_mutating(&self) -> bool {
        lock(&self.state).in_flight.is_some()
    }

    // ─── History ─────────────────────────────────────────────────────────────

    /// Records for display, newest first, truncated to the display limit.
    pub fn recent_actions(&self) -> Vec<ActionRecord> {
        lock(&self.state).history.recent(self.display_limit)
    }

    /// Every retained record, newest first.
    pub fn history(&self) -> Vec<ActionRecord> {
        lock(&self.state).history.entries().cloned().collect()
    }

    pub fn action(&self, action_id: &str) -> Option<ActionRecord> {
        lock(&self.state).history.get(action_id).cloned()
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    /// Start a new orchestrator. Rejected while another one is running or
    /// paused. On success the new orchestrator joins the snapshot and, if
    /// the selection did not change meanwhile, becomes selected.
    pub async fn start(&self, request: &StartRequest) -> Result<ActionRecord> {
        let mut guard = {
            let mut state = lock(&self.state);
            state.ensure_idle()?;
            if let Some(active) = find_active(&state.orchestrators) {
                return Err(Error::AlreadyActive(active.id.clone()));
            }
            self.begin(&mut state, ActionType::Start, "", &request.prompt_file)
        };

        let outcome = self.api.start(request).await;

        let mut state = lock(&self.state);
        let result = match outcome {
            Ok(response) => {
                let name = response.name.clone().unwrap_or_else(|| response.id.clone());
                if let Err(e) = state.history.attach(guard.action_id(), &response.id, &name) {
                    warn!(action_id = %guard.action_id, error = %e, "Could not attach target");
                }
                state.orchestrators.retain(|o| o.id != response.id);
                state.orchestrators.push(Orchestrator {
                    id: response.id.clone(),
                    name,
                    status: response.status,
                    metrics: OrchestratorMetrics::default(),
                    error: None,
                });
                if state.selected == guard.selected_at_dispatch {
                    state.selected = Some(response.id.clone());
                }
                info!(
                    action_id = %guard.action_id,
                    orchestrator_id = %response.id,
                    status = %response.status,
                    "Orchestrator started"
                );
                Ok(())
            }
            Err(e) => Err(e),
        };
        Self::finish(&mut state, &mut guard, result)
    }

    pub async fn pause(&self, orchestrator_id: &str) -> Result<ActionRecord> {
        let guard = self.begin_transition(ActionType::Pause, orchestrator_id, |status| {
            status == OrchestratorStatus::Running
        })?;
        let outcome = self.api.pause(orchestrator_id).await;
        self.complete(guard, outcome.map(|r| r.status))
    }

    pub async fn resume(&self, orchestrator_id: &str) -> Result<ActionRecord> {
        let guard = self.begin_transition(ActionType::Resume, orchestrator_id, |status| {
            status == OrchestratorStatus::Paused
        })?;
        let outcome = self.api.resume(orchestrator_id).await;
        self.complete(guard, outcome.map(|r| r.status))
    }

    /// First half of a stop: validate and hand back a confirmation token.
    /// Nothing is dispatched and no record is created.
    pub fn request_stop(&self, orchestrator_id: &str) -> Result<StopConfirmation> {
        let state = lock(&self.state);
        state.ensure_idle()?;
        let orch = state.find(orchestrator_id)?;
        if !orch.status.is_active() {
            return Err(Error::InvalidTransition(format!(
                "cannot stop a {} orchestrator",
                orch.status
            )));
        }
        state.ensure_active_target(orchestrator_id)?;
        Ok(StopConfirmation {
            orchestrator_id: orch.id.clone(),
            orchestrator_name: orch.name.clone(),
        })
    }

    /// Second half of a stop, after the user confirmed. State is validated
    /// again since it may have changed while the user was deciding.
    pub async fn stop(&self, confirmation: StopConfirmation) -> Result<ActionRecord> {
        let orchestrator_id = confirmation.orchestrator_id;
        let guard = self.begin_transition(ActionType::Stop, &orchestrator_id, |status| {
            status.is_active()
        })?;
        let outcome = self.api.stop(&orchestrator_id).await;
        self.complete(guard, outcome.map(|r| r.status))
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn begin(
        &self,
        state: &mut ControlState,
        action_type: ActionType,
        orchestrator_id: &str,
        orchestrator_name: &str,
    ) -> InFlightGuard {
        let action_id = state
            .history
            .record(action_type, orchestrator_id, orchestrator_name);
        state.in_flight = Some(InFlight {
            action_id: action_id.clone(),
            action_type,
        });
        info!(
            action_id = %action_id,
            action = %action_type,
            orchestrator_id = %orchestrator_id,
            "Dispatching command"
        );
        InFlightGuard {
            state: Arc::clone(&self.state),
            action_id,
            orchestrator_id: orchestrator_id.to_string(),
            selected_at_dispatch: state.selected.clone(),
            armed: true,
        }
    }

    fn begin_transition<F>(
        &self,
        action_type: ActionType,
        orchestrator_id: &str,
        allowed: F,
    ) -> Result<InFlightGuard>
    where
        F: FnOnce(OrchestratorStatus) -> bool,
    {
        let mut state = lock(&self.state);
        state.ensure_idle()?;
        let orch = state.find(orchestrator_id)?;
        if !allowed(orch.status) {
            return Err(Error::InvalidTransition(format!(
                "cannot {} a {} orchestrator",
                action_type, orch.status
            )));
        }
        let name = orch.name.clone();
        state.ensure_active_target(orchestrator_id)?;
        Ok(self.begin(&mut state, action_type, orchestrator_id, &name))
    }

    /// Apply a confirmed status (only if the target is still selected) and
    /// resolve the record.
    fn complete(
        &self,
        mut guard: InFlightGuard,
        outcome: Result<OrchestratorStatus>,
    ) -> Result<ActionRecord> {
        let mut state = lock(&self.state);
        let result = outcome.map(|status| {
            if state.selected.as_deref() == Some(guard.orchestrator_id.as_str()) {
                state.apply_status(&guard.orchestrator_id, status);
            } else {
                info!(
                    orchestrator_id = %guard.orchestrator_id,
                    status = %status,
                    "Selection changed; not applying status"
                );
            }
        });
        Self::finish(&mut state, &mut guard, result)
    }

    fn finish(
        state: &mut ControlState,
        guard: &mut InFlightGuard,
        result: Result<()>,
    ) -> Result<ActionRecord> {
        guard.armed = false;
        state.in_flight = None;
        let record = match result {
            Ok(()) => state
                .history
                .resolve(&guard.action_id, ActionStatus::Success, None)?,
            Err(e) => {
                warn!(
                    action_id = %guard.action_id,
                    orchestrator_id = %guard.orchestrator_id,
                    error = %e,
                    "Command failed"
                );
                state
                    .history
                    .resolve(&guard.action_id, ActionStatus::Failed, Some(e.to_string()))?
            }
        };
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommandResponse, HealthResponse, LogEntry, StartResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Answers every command with a fixed outcome. With `gate` set, commands
    /// wait for a notification before answering.
    struct FakeApi {
        reply: Mutex<Option<OrchestratorStatus>>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn replying(status: OrchestratorStatus) -> Self {
            Self {
                reply: Mutex::new(Some(status)),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Mutex::new(None),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn gated(status: OrchestratorStatus, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::replying(status)
            }
        }

        async fn answer(&self) -> Result<CommandResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match *self.reply.lock().unwrap() {
                Some(status) => Ok(CommandResponse { status }),
                None => Err(Error::api(500, "runner_unavailable")),
            }
        }
    }

    #[async_trait]
    impl OrchestratorApi for FakeApi {
        async fn health(&self) -> Result<HealthResponse> {
            unreachable!()
        }
        async fn list_sessions(&self) -> Result<Vec<Orchestrator>> {
            unreachable!()
        }
        async fn session_status(&self, _: &str) -> Result<Orchestrator> {
            unreachable!()
        }
        async fn recent_logs(&self, _: &str, _: u32) -> Result<Vec<LogEntry>> {
            unreachable!()
        }
        async fn start(&self, _: &StartRequest) -> Result<StartResponse> {
            let status = self.answer().await?.status;
            Ok(StartResponse {
                id: "new".into(),
                status,
                name: Some("fresh".into()),
            })
        }
        async fn stop(&self, _: &str) -> Result<CommandResponse> {
            self.answer().await
        }
        async fn pause(&self, _: &str) -> Result<CommandResponse> {
            self.answer().await
        }
        async fn resume(&self, _: &str) -> Result<CommandResponse> {
            self.answer().await
        }
    }

    fn orch(id: &str, status: OrchestratorStatus) -> Orchestrator {
        Orchestrator {
            id: id.into(),
            name: format!("{}-name", id),
            status,
            metrics: OrchestratorMetrics::default(),
            error: None,
        }
    }

    fn service(api: FakeApi, sessions: &[Orchestrator]) -> OrchestratorControlService {
        let svc = OrchestratorControlService::new(Arc::new(api), &LiveConfig::default());
        svc.sync_sessions(sessions);
        if let Some(first) = sessions.first() {
            svc.select(Some(&first.id));
        }
        svc
    }

    fn status_of(svc: &OrchestratorControlService, id: &str) -> OrchestratorStatus {
        svc.orchestrators()
            .into_iter()
            .find(|o| o.id == id)
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_pause_applies_confirmed_status() {
        let svc = service(
            FakeApi::replying(OrchestratorStatus::Paused),
            &[orch("o1", OrchestratorStatus::Running)],
        );
        let record = svc.pause("o1").await.unwrap();
        assert_eq!(record.status, ActionStatus::Success);
        assert_eq!(record.action_type, ActionType::Pause);
        assert_eq!(record.orchestrator_name, "o1-name");
        assert_eq!(status_of(&svc, "o1"), OrchestratorStatus::Paused);
        assert!(!svc.is_mutating());
    }

    #[tokio::test]
    async fn test_invalid_transitions_create_no_record() {
        let svc = service(
            FakeApi::replying(OrchestratorStatus::Running),
            &[orch("o1", OrchestratorStatus::Paused)],
        );
        assert!(matches!(
            svc.pause("o1").await,
            Err(Error::InvalidTransition(_))
        ));
        svc.sync_sessions(&[orch("o1", OrchestratorStatus::Running)]);
        assert!(matches!(
            svc.resume("o1").await,
            Err(Error::InvalidTransition(_))
        ));
        assert!(matches!(svc.pause("ghost").await, Err(Error::NotFound(_))));
        assert!(svc.history().is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_leaves_status_untouched() {
        let svc = service(
            FakeApi::failing(),
            &[orch("o1", OrchestratorStatus::Running)],
        );
        let record = svc.pause("o1").await.unwrap();
        assert_eq!(record.status, ActionStatus::Failed);
        assert!(record.error.unwrap().contains("runner_unavailable"));
        assert_eq!(status_of(&svc, "o1"), OrchestratorStatus::Running);
    }

    #[tokio::test]
    async fn test_status_not_applied_after_selection_changes() {
        let gate = Arc::new(Notify::new());
        let svc = Arc::new(service(
            FakeApi::gated(OrchestratorStatus::Paused, gate.clone()),
            &[
                orch("o1", OrchestratorStatus::Running),
                orch("o2", OrchestratorStatus::Completed),
            ],
        ));

        let task = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.pause("o1").await })
        };
        while !svc.is_mutating() {
            tokio::task::yield_now().await;
        }
        svc.select(Some("o2"));
        gate.notify_one();

        let record = task.await.unwrap().unwrap();
        assert_eq!(record.status, ActionStatus::Success);
        assert_eq!(status_of(&svc, "o1"), OrchestratorStatus::Running);
    }

    #[test]
    fn test_request_stop_requires_active_target() {
        let svc = service(
            FakeApi::replying(OrchestratorStatus::Completed),
            &[
                orch("done", OrchestratorStatus::Completed),
                orch("live", OrchestratorStatus::Paused),
            ],
        );
        assert!(matches!(
            svc.request_stop("done"),
            Err(Error::InvalidTransition(_))
        ));
        let confirmation = svc.request_stop("live").unwrap();
        assert_eq!(confirmation.orchestrator_id(), "live");
        assert_eq!(confirmation.orchestrator_name(), "live-name");
        drop(confirmation);
        assert!(svc.history().is_empty());
    }

    #[tokio::test]
    async fn test_commands_only_target_the_active_orchestrator() {
        let svc = service(
            FakeApi::replying(OrchestratorStatus::Paused),
            &[
                orch("first", OrchestratorStatus::Running),
                orch("second", OrchestratorStatus::Running),
            ],
        );
        svc.select(Some("second"));
        assert_eq!(svc.active().unwrap().id, "first");

        assert!(matches!(
            svc.pause("second").await,
            Err(Error::NotActive(id)) if id == "second"
        ));
        assert!(matches!(
            svc.request_stop("second"),
            Err(Error::NotActive(_))
        ));
        assert!(svc.history().is_empty());

        let record = svc.pause("first").await.unwrap();
        assert_eq!(record.status, ActionStatus::Success);
    }

    #[tokio::test]
    async fn test_start_accepts_pending_reply() {
        let svc = service(FakeApi::replying(OrchestratorStatus::Pending), &[]);
        let record = svc.start(&StartRequest::new("PROMPT.md")).await.unwrap();
        assert_eq!(record.status, ActionStatus::Success);
        let selected = svc.selected().unwrap();
        assert_eq!(selected.id, "new");
        assert_eq!(selected.status, OrchestratorStatus::Pending);
    }

    #[tokio::test]
    async fn test_start_rejected_while_active() {
        let svc = service(
            FakeApi::replying(OrchestratorStatus::Running),
            &[orch("o1", OrchestratorStatus::Paused)],
        );
        let err = svc.start(&StartRequest::new("PROMPT.md")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyActive(id) if id == "o1"));
        assert!(svc.history().is_empty());
    }

    #[tokio::test]
    async fn test_start_adds_and_selects_new_orchestrator() {
        let svc = service(
            FakeApi::replying(OrchestratorStatus::Running),
            &[orch("old", OrchestratorStatus::Completed)],
        );
        let record = svc.start(&StartRequest::new("PROMPT.md")).await.unwrap();
        assert_eq!(record.status, ActionStatus::Success);
        assert_eq!(record.orchestrator_id, "new");
        assert_eq!(record.orchestrator_name, "fresh");
        assert_eq!(svc.selected().unwrap().id, "new");
        assert_eq!(svc.active().unwrap().id, "new");
    }

    #[tokio::test]
    async fn test_dropped_command_resolves_cancelled() {
        let gate = Arc::new(Notify::new());
        let svc = service(
            FakeApi::gated(OrchestratorStatus::Paused, gate),
            &[orch("o1", OrchestratorStatus::Running)],
        );
        {
            let fut = svc.pause("o1");
            tokio::pin!(fut);
            tokio_test::assert_pending!(futures::poll!(fut.as_mut()));
            assert!(svc.is_mutating());
        }
        assert!(!svc.is_mutating());
        let history = svc.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, ActionStatus::Failed);
        assert_eq!(history[0].error.as_deref(), Some("cancelled"));
        assert_eq!(status_of(&svc, "o1"), OrchestratorStatus::Running);
    }

    #[tokio::test]
    async fn test_recent_actions_respects_display_limit() {
        let svc = service(
            FakeApi::replying(OrchestratorStatus::Running),
            &[orch("o1", OrchestratorStatus::Running)],
        );
        for _ in 0..12 {
            svc.resume("o1").await.unwrap_err();
            svc.pause("o1").await.unwrap();
        }
        assert_eq!(svc.history().len(), 12);
        assert_eq!(svc.recent_actions().len(), 10);
    }
}
