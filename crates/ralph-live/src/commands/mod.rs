//! Command implementations for ralph-live.
//!
//! Each submodule implements the logic for one command group. Shared
//! formatting lives here.

pub mod control;
pub mod health;
pub mod sessions;
pub mod watch;

use anyhow::{Context, Result};
use chrono::Local;
use colored::{ColoredString, Colorize};
use ralph_live_core::ApiClient;
use ralph_live_core::types::{
    ActionRecord, ActionStatus, ConnectionState, LogEntry, LogLevel, Orchestrator,
    OrchestratorStatus,
};
use std::sync::Arc;

use crate::config::Config;

pub(crate) fn client(config: &Config) -> Result<Arc<ApiClient>> {
    let client = ApiClient::new(&config.api.url, config.api.api_key.clone())
        .with_context(|| format!("Invalid server URL {}", config.api.url))?;
    Ok(Arc::new(client))
}

/// First eight characters of an id.
pub(crate) fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

pub(crate) fn status_label(status: OrchestratorStatus) -> ColoredString {
    match status {
        OrchestratorStatus::Pending => status.as_str().dimmed(),
        OrchestratorStatus::Running => status.as_str().green(),
        OrchestratorStatus::Paused => status.as_str().yellow(),
        OrchestratorStatus::Completed => status.as_str().blue(),
        OrchestratorStatus::Failed => status.as_str().red(),
    }
}

pub(crate) fn level_label(level: LogLevel) -> ColoredString {
    let padded = format!("{:<5}", level.as_str().to_uppercase());
    match level {
        LogLevel::Debug => padded.dimmed(),
        LogLevel::Info => padded.cyan(),
        LogLevel::Warn => padded.yellow(),
        LogLevel::Error => padded.red().bold(),
    }
}

pub(crate) fn print_orchestrator(orch: &Orchestrator) {
    let metrics = &orch.metrics;
    let iterations = match metrics.iterations_total {
        Some(total) => format!("{}/{}", metrics.iterations_completed, total),
        None => metrics.iterations_completed.to_string(),
    };
    println!(
        "  {} {:<24} {:<10} iter {:<8} {:>6}s {:>9} tok",
        short_id(&orch.id).dimmed(),
        orch.name,
        status_label(orch.status),
        iterations,
        metrics.duration_seconds,
        metrics.tokens_used
    );
    if let Some(error) = &orch.error {
        println!("           {}", error.red());
    }
}

pub(crate) fn print_entry(entry: &LogEntry) {
    println!(
        "{} {} {}",
        entry
            .timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
            .dimmed(),
        level_label(entry.level),
        entry.message
    );
}

pub(crate) fn print_action(record: &ActionRecord) {
    let target = if record.orchestrator_name.is_empty() {
        record.orchestrator_id.clone()
    } else {
        format!("{} ({})", record.orchestrator_name, short_id(&record.orchestrator_id))
    };
    match record.status {
        ActionStatus::Success => {
            println!("{} {} {}", "✓".green(), record.action_type, target.cyan())
        }
        ActionStatus::Failed => println!(
            "{} {} {}: {}",
            "✗".red(),
            record.action_type,
            target.cyan(),
            record.error.as_deref().unwrap_or("unknown error").red()
        ),
        ActionStatus::Pending => {
            println!("{} {} {} pending", "…".yellow(), record.action_type, target)
        }
    }
}

pub(crate) fn print_connection_state(state: &ConnectionState) {
    let line = format!("── {} ──", state);
    match state {
        ConnectionState::Connected => println!("{}", line.green()),
        ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => {
            println!("{}", line.yellow())
        }
        ConnectionState::Disconnected => println!("{}", line.dimmed()),
        ConnectionState::Error { .. } => println!("{}", line.red()),
    }
}
