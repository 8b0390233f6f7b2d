//! Shared types for ralph-live-core.
//!
//! These types are used by the API client, the stream decoder and the
//! live-session components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Log Types
// ─────────────────────────────────────────────────────────────────────────────

/// Severity of a log entry, ordered from least to most severe.
///
/// Decoding goes through `FromStr`, so frames and CLI flags accept the same
/// spellings (any case, `warning` for `warn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// All levels in severity order.
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;
    fn try_from(s: String) -> Result<Self, <LogLevel as TryFrom<String>>::Error> {
        s.parse()
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// One structured log line emitted by an orchestrator iteration.
///
/// Decoded straight from a stream frame; never modified after decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection Types
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of one streaming session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Error { message: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting { attempt } => write!(f, "reconnecting ({})", attempt),
            ConnectionState::Error { message } => write!(f, "error: {}", message),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator Types
// ─────────────────────────────────────────────────────────────────────────────

/// Server-reported lifecycle status of an orchestrator.
///
/// The server also answers commands with `starting`, `resumed` and
/// `stopped`; these are folded into `pending`, `running` and `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorStatus {
    #[serde(alias = "starting")]
    Pending,
    #[serde(alias = "resumed")]
    Running,
    Paused,
    #[serde(alias = "stopped")]
    Completed,
    Failed,
}

impl OrchestratorStatus {
    /// Running or paused orchestrators are candidates for the active slot.
    pub fn is_active(&self) -> bool {
        matches!(self, OrchestratorStatus::Running | OrchestratorStatus::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestratorStatus::Completed | OrchestratorStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorStatus::Pending => "pending",
            OrchestratorStatus::Running => "running",
            OrchestratorStatus::Paused => "paused",
            OrchestratorStatus::Completed => "completed",
            OrchestratorStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrchestratorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrchestratorStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "starting" => Ok(OrchestratorStatus::Pending),
            "running" | "resumed" => Ok(OrchestratorStatus::Running),
            "paused" => Ok(OrchestratorStatus::Paused),
            "completed" | "stopped" => Ok(OrchestratorStatus::Completed),
            "failed" => Ok(OrchestratorStatus::Failed),
            _ => Err(format!("Invalid orchestrator status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorMetrics {
    #[serde(default)]
    pub iterations_completed: u32,
    #[serde(default)]
    pub iterations_total: Option<u32>,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub tokens_used: u64,
}

/// A remote agent loop as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orchestrator {
    pub id: String,
    pub name: String,
    pub status: OrchestratorStatus,
    #[serde(default)]
    pub metrics: OrchestratorMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The first running or paused orchestrator, if any.
pub fn find_active(orchestrators: &[Orchestrator]) -> Option<&Orchestrator> {
    orchestrators.iter().find(|o| o.status.is_active())
}

// ─────────────────────────────────────────────────────────────────────────────
// Action Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Start,
    Stop,
    Pause,
    Resume,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Start => write!(f, "start"),
            ActionType::Stop => write!(f, "stop"),
            ActionType::Pause => write!(f, "pause"),
            ActionType::Resume => write!(f, "resume"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Success,
    Failed,
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::Success => write!(f, "success"),
            ActionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Audit record of one control command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub orchestrator_id: String,
    pub orchestrator_name: String,
    pub timestamp: DateTime<Utc>,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a start command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    pub prompt_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_runtime_seconds: Option<u64>,
}

impl StartRequest {
    pub fn new(prompt_file: impl Into<String>) -> Self {
        Self {
            prompt_file: prompt_file.into(),
            ..Default::default()
        }
    }
}

/// Response to a start command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub id: String,
    pub status: OrchestratorStatus,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response to stop/pause/resume, carrying the confirmed status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: OrchestratorStatus,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
