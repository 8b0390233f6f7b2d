//! Session list, one-shot or continuously refreshed.

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use ralph_live_core::client::OrchestratorApi;
use ralph_live_core::types::find_active;
use ralph_live_core::{PollerSnapshot, SessionPoller};
use std::sync::Arc;

use super::{client, print_orchestrator};
use crate::config::Config;

pub async fn execute(watch: bool, config: &Config) -> Result<()> {
    if watch {
        watch_sessions(config).await
    } else {
        list_once(config).await
    }
}

async fn list_once(config: &Config) -> Result<()> {
    let client = client(config)?;
    match client.list_sessions().await {
        Ok(sessions) => print_sessions(&sessions),
        Err(e) => println!("{}", format!("✗ Failed to list sessions: {}", e).red()),
    }
    Ok(())
}

fn print_sessions(sessions: &[ralph_live_core::types::Orchestrator]) {
    if sessions.is_empty() {
        println!("{}", "No orchestrator sessions".dimmed());
        return;
    }
    println!("{}", format!("Sessions ({})", sessions.len()).bold());
    for orch in sessions {
        print_orchestrator(orch);
    }
    if let Some(active) = find_active(sessions) {
        println!();
        println!("  Active: {}", active.name.cyan());
    }
}

async fn watch_sessions(config: &Config) -> Result<()> {
    let poller = Arc::new(SessionPoller::new(client(config)?, &config.live));

    let mut updates = poller.subscribe();
    let _handle = poller.clone().spawn();

    println!(
        "{}",
        format!(
            "Refreshing every {}s (Ctrl+C to stop)",
            config.live.poll_interval_secs
        )
        .yellow()
    );

    let mut last: Option<PollerSnapshot> = None;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if last.as_ref() == Some(&snapshot) {
                    continue;
                }
                render(&snapshot);
                last = Some(snapshot);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn render(snapshot: &PollerSnapshot) {
    println!();
    let reachability = if snapshot.is_server_reachable {
        "● online".green()
    } else {
        "● offline".red()
    };
    let fetched = snapshot
        .last_fetched_at
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!("{} {}", reachability, format!("updated {}", fetched).dimmed());

    if let Some(error) = &snapshot.last_error {
        println!(
            "{}",
            format!("⚠ Refresh failed, showing last known list: {}", error).yellow()
        );
    }
    print_sessions(&snapshot.sessions);
}
