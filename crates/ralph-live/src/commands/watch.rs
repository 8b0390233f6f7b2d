//! Live log tail for one orchestrator.
//!
//! Log entries and connection state arrive on receivers owned by this
//! task; every view mutation happens here. Keys (one per line on stdin):
//! `p` pause/resume, `c` clear, `d` `i` `w` `e` toggle a level,
//! `r` reconnect, `q` quit.

use anyhow::Result;
use colored::Colorize;
use ralph_live_core::client::OrchestratorApi;
use ralph_live_core::types::{ConnectionState, LogEntry, LogLevel};
use ralph_live_core::{ConnectionManager, LevelFilter, LiveLogView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use super::{client, print_connection_state, print_entry};
use crate::cli::WatchCommand;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    TogglePause,
    Clear,
    ToggleLevel(LogLevel),
    Reconnect,
    Quit,
}

fn parse_key(line: &str) -> Option<Key> {
    match line.trim() {
        "p" => Some(Key::TogglePause),
        "c" => Some(Key::Clear),
        "d" => Some(Key::ToggleLevel(LogLevel::Debug)),
        "i" => Some(Key::ToggleLevel(LogLevel::Info)),
        "w" => Some(Key::ToggleLevel(LogLevel::Warn)),
        "e" => Some(Key::ToggleLevel(LogLevel::Error)),
        "r" => Some(Key::Reconnect),
        "q" => Some(Key::Quit),
        _ => None,
    }
}

pub async fn execute(cmd: WatchCommand, config: &Config) -> Result<()> {
    let client = client(config)?;
    let id = cmd.orchestrator_id;

    let mut view = LiveLogView::with_filter(&config.live, LevelFilter::with_levels(cmd.levels));
    let mut manager = ConnectionManager::new(client.clone(), config.live.clone());

    if !cmd.no_backfill {
        match client.recent_logs(&id, config.live.recent_log_limit).await {
            Ok(entries) => {
                manager.seed_delivered(entries.iter().map(|e| e.id.as_str()));
                view.ingest_batch(entries);
                for entry in view.filtered_logs() {
                    print_entry(entry);
                }
            }
            Err(e) => warn!(orchestrator_id = %id, error = %e, "Backfill failed"),
        }
    }

    let mut logs = manager.subscribe_logs();
    let mut states = manager.watch_state();

    manager.connect(&id)?;
    print_levels(&view);
    println!("{}", "Keys: p pause · c clear · d/i/w/e levels · r reconnect · q quit".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(entry) = logs.recv() => {
                let mut batch = vec![entry];
                // Coalesce whatever else already arrived into one batch
                while let Some(entry) = logs.try_recv() {
                    batch.push(entry);
                }
                show_batch(&mut view, batch);
            }
            Ok(()) = states.changed() => {
                let state = states.borrow_and_update().clone();
                show_state(&state);
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match parse_key(&line) {
                        Some(Key::Quit) => break,
                        Some(key) => apply_key(key, &mut view, &mut manager),
                        None => {}
                    },
                    Ok(None) | Err(_) => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.disconnect();
    Ok(())
}

fn show_state(state: &ConnectionState) {
    print_connection_state(state);
    if matches!(state, ConnectionState::Error { .. }) {
        println!("{}", "  type r to reconnect".dimmed());
    }
}

/// Ingest a batch and print the entries that became visible.
fn show_batch(view: &mut LiveLogView, batch: Vec<LogEntry>) {
    if batch.is_empty() {
        return;
    }
    let shown = view.ingest_batch(batch);
    let visible = view.filtered_logs();
    for entry in &visible[visible.len() - shown..] {
        print_entry(entry);
    }
}

fn apply_key(key: Key, view: &mut LiveLogView, manager: &mut ConnectionManager) {
    match key {
        Key::TogglePause => {
            if view.is_paused() {
                let released = view.set_paused(false);
                println!(
                    "{}",
                    format!("▶ resumed ({} held entries)", released.len()).green()
                );
                for entry in &released {
                    print_entry(entry);
                }
            } else {
                view.set_paused(true);
                println!("{}", "⏸ paused; new entries are held".yellow());
            }
        }
        Key::Clear => {
            view.clear();
            println!("{}", "── cleared ──".dimmed());
        }
        Key::ToggleLevel(level) => {
            if view.toggle_level(level) {
                print_levels(view);
            } else {
                println!("{}", "⚠ At least one level must stay enabled".yellow());
            }
        }
        Key::Reconnect => {
            if let Err(e) = manager.reconnect() {
                println!("{}", format!("✗ {}", e).red());
            }
        }
        Key::Quit => {}
    }
}

fn print_levels(view: &LiveLogView) {
    let levels: Vec<&str> = view.filter().enabled_levels().map(|l| l.as_str()).collect();
    println!("{}", format!("Showing: {}", levels.join(", ")).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ralph_live_core::LiveConfig;

    fn entry(id: &str, level: LogLevel) -> LogEntry {
        LogEntry {
            id: id.into(),
            timestamp: Utc::now(),
            level,
            message: id.into(),
            metadata: None,
        }
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key(" p \n"), Some(Key::TogglePause));
        assert_eq!(parse_key("w"), Some(Key::ToggleLevel(LogLevel::Warn)));
        assert_eq!(parse_key("q"), Some(Key::Quit));
        assert_eq!(parse_key("x"), None);
    }

    #[test]
    fn test_show_batch_handles_filtered_and_paused_entries() {
        let mut view = LiveLogView::with_filter(
            &LiveConfig::default(),
            LevelFilter::with_levels([LogLevel::Error]),
        );
        show_batch(
            &mut view,
            vec![entry("1", LogLevel::Info), entry("2", LogLevel::Error)],
        );
        view.set_paused(true);
        show_batch(&mut view, vec![entry("3", LogLevel::Error)]);
        assert_eq!(view.filtered_logs().len(), 1);
        assert_eq!(view.buffer().master().len(), 3);
    }
}
