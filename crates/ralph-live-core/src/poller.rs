//! SessionPoller - keeps the orchestrator list fresh without a stream per
//! orchestrator.
//!
//! Two independent loops: the session list on `poll_interval_secs`, and a
//! reachability check on `health_interval_secs`. A failed list fetch keeps
//! the last good list and records an error the UI may dismiss. The health check
//! only ever flips `is_server_reachable`.
//!
//! The snapshot lives in a `watch` channel: observers see the latest
//! state, not every intermediate one.

use crate::client::OrchestratorApi;
use crate::config::LiveConfig;
use crate::error::Result;
use crate::types::Orchestrator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// What the session list screen renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerSnapshot {
    pub sessions: Vec<Orchestrator>,
    /// Set by a failed fetch; cleared by the next success or `dismiss_error`.
    pub last_error: Option<String>,
    pub is_server_reachable: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

pub struct SessionPoller {
    api: Arc<dyn OrchestratorApi>,
    poll_interval: Duration,
    health_interval: Duration,
    state: watch::Sender<PollerSnapshot>,
}

impl SessionPoller {
    pub fn new(api: Arc<dyn OrchestratorApi>, config: &LiveConfig) -> Self {
        Self {
            api,
            poll_interval: config.poll_interval(),
            health_interval: config.health_interval(),
            state: watch::channel(PollerSnapshot::default()).0,
        }
    }

    pub fn snapshot(&self) -> PollerSnapshot {
        self.state.borrow().clone()
    }

    pub fn sessions(&self) -> Vec<Orchestrator> {
        self.state.borrow().sessions.clone()
    }

    pub fn is_server_reachable(&self) -> bool {
        self.state.borrow().is_server_reachable
    }

    /// Marked changed after every fetch, and after a health check or dismissal
    /// that altered the snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PollerSnapshot> {
        self.state.subscribe()
    }

    /// Pull the session list now (interval tick or pull-to-refresh).
    ///
    /// On failure the previous list stays in place and the error is kept in
    /// `last_error`; the error is also returned to on-demand callers.
    pub async fn fetch_sessions(&self) -> Result<Vec<Orchestrator>> {
        let outcome = self.api.list_sessions().await;

        self.state.send_modify(|state| match &outcome {
            Ok(sessions) => {
                debug!(count = sessions.len(), "Fetched sessions");
                state.sessions = sessions.clone();
                state.last_error = None;
                state.last_fetched_at = Some(Utc::now());
            }
            Err(e) => {
                warn!(error = %e, "Session fetch failed; keeping previous list");
                state.last_error = Some(e.to_string());
            }
        });
        outcome
    }

    /// Hide the current error banner. Data is untouched.
    pub fn dismiss_error(&self) {
        self.state
            .send_if_modified(|state| state.last_error.take().is_some());
    }

    /// Check the server. Never fails; the answer is only a reachability flag.
    pub async fn check_health(&self) -> bool {
        let reachable = match self.api.health().await {
            Ok(health) => {
                debug!(status = %health.status, "Health check ok");
                true
            }
            Err(e) => {
                warn!(error = %e, "Health check failed");
                false
            }
        };

        let changed = self.state.send_if_modified(|state| {
            let changed = state.is_server_reachable != reachable;
            state.is_server_reachable = reachable;
            changed
        });
        if changed {
            info!(reachable, "Server reachability changed");
        }
        reachable
    }

    /// Run both loops on the current runtime. The first tick of each fires
    /// immediately. Loops stop when the handle is dropped.
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            health_interval_secs = self.health_interval.as_secs(),
            "Starting session poller"
        );

        let poller = Arc::clone(&self);
        let sessions = tokio::spawn(async move {
            let mut ticker = interval(poller.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failure is already recorded in the snapshot.
                let _ = poller.fetch_sessions().await;
            }
        });

        let poller = self;
        let health = tokio::spawn(async move {
            let mut ticker = interval(poller.health_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                poller.check_health().await;
            }
        });

        PollerHandle {
            sessions: sessions.abort_handle(),
            health: health.abort_handle(),
        }
    }
}

/// Owns the two polling loops.
#[derive(Debug)]
pub struct PollerHandle {
    sessions: AbortHandle,
    health: AbortHandle,
}

impl PollerHandle {
    pub fn stop(self) {}
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.sessions.abort();
        self.health.abort();
        debug!("Session poller stopped");
    }
}
