//! ralph-live-core - Core library for Ralph Live
//!
//! Client-side live session handling for remote orchestrator loops:
//!
//! - **client**: REST API and SSE log transport
//! - **stream**: ConnectionManager and frame decoding
//! - **logs**: log buffer with pause/resume, level filter, auto-scroll
//! - **control**: start/stop/pause/resume with an action history
//! - **poller**: periodic session list and health refresh
//! - **events**: multi-subscriber event emitter

pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod logs;
pub mod poller;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::LiveConfig;
pub use control::{ActionHistoryLog, OrchestratorControlService, StopConfirmation};
pub use error::{Error, Result};
pub use events::{EventEmitter, EventReceiver};
pub use logs::{AutoScrollController, LevelFilter, LiveLogView, LogStreamBuffer};
pub use poller::{PollerHandle, PollerSnapshot, SessionPoller};
pub use stream::ConnectionManager;
