//! ConnectionManager - one resumable log stream for one orchestrator.
//!
//! ```text
//! disconnected ──connect──► connecting ──handshake──► connected
//!      ▲                        ▲                        │ drop/error
//!      │ disconnect             │ backoff                ▼
//!      └──────────────── reconnecting(n) ◄───────────────┘
//!                               │ n > max_reconnect_attempts
//!                               ▼
//!                        error(message) ──reconnect──► connecting
//! ```
//!
//! Frames are decoded on the driver task; malformed frames are skipped.
//! Entries already delivered (by id) are never delivered twice, which makes
//! resume-by-cursor replays safe.
//!
//! The retry budget is refunded only once a (re)opened stream yields a
//! frame. A server that accepts and immediately drops the stream still
//! ends in `error`.
//!
//! Observers either take every transition from
//! [`subscribe_state_changes`](ConnectionManager::subscribe_state_changes)
//! or only the latest state from [`watch_state`](ConnectionManager::watch_state).

use crate::client::LogTransport;
use crate::config::LiveConfig;
use crate::error::{Error, Result};
use crate::events::{EventEmitter, EventReceiver};
use crate::stream::frame::decode_frame;
use crate::types::{ConnectionState, LogEntry};
use futures::StreamExt;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Ids remembered for de-duplication across reconnects.
const SEEN_WINDOW: usize = 4096;

/// Bounded set of delivered entry ids, plus the resume cursor.
#[derive(Debug)]
struct SeenIds {
    order: VecDeque<String>,
    set: HashSet<String>,
    last: Option<String>,
}

impl SeenIds {
    fn new() -> Self {
        Self {
            order: VecDeque::new(),
            set: HashSet::new(),
            last: None,
        }
    }

    /// Returns false if the id was already delivered.
    fn insert(&mut self, id: &str) -> bool {
        if self.set.contains(id) {
            return false;
        }
        if self.order.len() == SEEN_WINDOW {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.set.insert(id.to_string());
        self.last = Some(id.to_string());
        true
    }

    fn clear(&mut self) {
        self.order.clear();
        self.set.clear();
        self.last = None;
    }
}

struct Inner {
    /// Bumped on every (re)spawn and disconnect; stale driver tasks compare
    /// against it and stay silent.
    generation: u64,
    seen: SeenIds,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Serializes check-then-emit so subscribers observe transitions in order.
    delivery: Mutex<()>,
    state: watch::Sender<ConnectionState>,
    state_events: EventEmitter<ConnectionState>,
    log_events: EventEmitter<LogEntry>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn set_state(&self, generation: u64, next: ConnectionState) -> bool {
        let _delivery = lock(&self.delivery);
        if lock(&self.inner).generation != generation {
            return false;
        }
        let unchanged = *self.state.borrow() == next;
        if !unchanged {
            self.state.send_replace(next.clone());
            self.state_events.emit(next);
        }
        true
    }

    fn ingest(&self, generation: u64, raw: &str) {
        let Some(entry) = decode_frame(raw) else {
            return;
        };
        let _delivery = lock(&self.delivery);
        {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                return;
            }
            if !inner.seen.insert(&entry.id) {
                debug!(entry_id = %entry.id, "Skipping already delivered entry");
                return;
            }
        }
        self.log_events.emit(entry);
    }

    fn cursor(&self) -> Option<String> {
        lock(&self.inner).seen.last.clone()
    }
}

/// Owns the live stream for exactly one orchestrator id at a time.
pub struct ConnectionManager {
    transport: Arc<dyn LogTransport>,
    config: LiveConfig,
    shared: Arc<Shared>,
    target: Option<String>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn LogTransport>, config: LiveConfig) -> Self {
        Self {
            transport,
            config,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    generation: 0,
                    seen: SeenIds::new(),
                }),
                delivery: Mutex::new(()),
                state: watch::channel(ConnectionState::Disconnected).0,
                state_events: EventEmitter::new(),
                log_events: EventEmitter::new(),
            }),
            target: None,
            task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.borrow().clone()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Subscribe to decoded, de-duplicated log entries.
    pub fn subscribe_logs(&self) -> EventReceiver<LogEntry> {
        self.shared.log_events.subscribe()
    }

    /// Subscribe to every connection state transition, in order.
    pub fn subscribe_state_changes(&self) -> EventReceiver<ConnectionState> {
        self.shared.state_events.subscribe()
    }

    /// Latest connection state. Rapid transitions may be coalesced.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Mark entries as already delivered, e.g. after a REST backfill, so a
    /// replaying stream does not hand them out again. The last id becomes
    /// the resume cursor.
    pub fn seed_delivered<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut inner = lock(&self.shared.inner);
        for id in ids {
            inner.seen.insert(id);
        }
    }

    /// Start streaming `orchestrator_id`. Must be called inside a tokio
    /// runtime.
    ///
    /// Connecting to the current target while it is live is a no-op; a
    /// different target requires [`disconnect`](Self::disconnect) first.
    pub fn connect(&mut self, orchestrator_id: &str) -> Result<()> {
        if let Some(current) = &self.target {
            if current != orchestrator_id {
                return Err(Error::AlreadyConnected(current.clone()));
            }
            if !matches!(
                self.state(),
                ConnectionState::Error { .. } | ConnectionState::Disconnected
            ) {
                return Ok(());
            }
        }

        self.target = Some(orchestrator_id.to_string());
        self.spawn_driver(orchestrator_id.to_string());
        Ok(())
    }

    /// Manually restart the stream for the current target, typically from
    /// the error state. Resets the retry budget.
    pub fn reconnect(&mut self) -> Result<()> {
        let target = self.target.clone().ok_or(Error::NoTarget)?;
        info!(orchestrator_id = %target, "Manual reconnect");
        self.spawn_driver(target);
        Ok(())
    }

    /// Tear down the stream. Idempotent; always ends in `disconnected`.
    pub fn disconnect(&mut self) {
        let generation = {
            let mut inner = lock(&self.shared.inner);
            inner.generation += 1;
            inner.seen.clear();
            inner.generation
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(target) = self.target.take() {
            info!(orchestrator_id = %target, "Disconnected");
        }
        self.shared
            .set_state(generation, ConnectionState::Disconnected);
    }

    fn spawn_driver(&mut self, orchestrator_id: String) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let generation = {
            let mut inner = lock(&self.shared.inner);
            inner.generation += 1;
            inner.generation
        };
        self.shared.set_state(generation, ConnectionState::Connecting);

        let driver = Driver {
            transport: Arc::clone(&self.transport),
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
            orchestrator_id,
            generation,
        };
        self.task = Some(tokio::spawn(driver.run()));
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Background task: open, pump frames, back off, repeat.
struct Driver {
    transport: Arc<dyn LogTransport>,
    shared: Arc<Shared>,
    config: LiveConfig,
    orchestrator_id: String,
    generation: u64,
}

impl Driver {
    async fn run(self) {
        let id = self.orchestrator_id.as_str();
        let mut attempt: u32 = 0;

        loop {
            let cursor = self.shared.cursor();
            let failure = match self.transport.open(id, cursor.as_deref()).await {
                Ok(mut frames) => {
                    if !self.shared.set_state(self.generation, ConnectionState::Connected) {
                        return;
                    }
                    info!(orchestrator_id = %id, "Log stream connected");

                    let mut failure = Error::StreamClosed;
                    while let Some(frame) = frames.next().await {
                        match frame {
                            Ok(raw) => {
                                attempt = 0;
                                self.shared.ingest(self.generation, &raw);
                            }
                            Err(e) => {
                                failure = e;
                                break;
                            }
                        }
                    }
                    warn!(orchestrator_id = %id, error = %failure, "Log stream dropped");
                    failure
                }
                Err(Error::NotFound(path)) => {
                    error!(orchestrator_id = %id, "Orchestrator has no event stream");
                    self.shared.set_state(
                        self.generation,
                        ConnectionState::Error {
                            message: Error::NotFound(path).to_string(),
                        },
                    );
                    return;
                }
                Err(e) => {
                    warn!(orchestrator_id = %id, error = %e, "Log stream handshake failed");
                    e
                }
            };

            attempt += 1;
            if attempt > self.config.max_reconnect_attempts {
                error!(
                    orchestrator_id = %id,
                    attempts = attempt - 1,
                    "Giving up on log stream"
                );
                self.shared.set_state(
                    self.generation,
                    ConnectionState::Error {
                        message: failure.to_string(),
                    },
                );
                return;
            }

            if !self
                .shared
                .set_state(self.generation, ConnectionState::Reconnecting { attempt })
            {
                return;
            }
            tokio::time::sleep(self.config.reconnect_delay(attempt)).await;
        }
    }
}
