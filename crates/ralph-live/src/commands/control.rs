//! Orchestrator control commands: start, pause, resume, stop.
//!
//! Each command refreshes the session list first so transitions are
//! validated against the server's current view, then prints the resolved
//! action record.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use ralph_live_core::OrchestratorControlService;
use ralph_live_core::client::OrchestratorApi;
use ralph_live_core::types::StartRequest;

use super::{client, print_action, print_orchestrator};
use crate::cli::StartCommand;
use crate::config::Config;

async fn service(config: &Config, select: Option<&str>) -> Result<OrchestratorControlService> {
    let client = client(config)?;
    let sessions = client
        .list_sessions()
        .await
        .context("Failed to fetch sessions")?;
    let service = OrchestratorControlService::new(client, &config.live);
    service.sync_sessions(&sessions);
    service.select(select);
    Ok(service)
}

pub async fn start(cmd: StartCommand, config: &Config) -> Result<()> {
    let service = service(config, None).await?;
    let request = StartRequest {
        prompt_file: cmd.prompt_file,
        config_file: cmd.config_file,
        max_iterations: cmd.max_iterations,
        max_runtime_seconds: cmd.max_runtime_secs,
    };

    match service.start(&request).await {
        Ok(record) => {
            print_action(&record);
            if let Some(orch) = service.selected() {
                print_orchestrator(&orch);
            }
        }
        Err(e) => println!("{}", format!("✗ Cannot start: {}", e).red()),
    }
    Ok(())
}

pub async fn pause(orchestrator_id: &str, config: &Config) -> Result<()> {
    let service = service(config, Some(orchestrator_id)).await?;
    report(&service, service.pause(orchestrator_id).await);
    Ok(())
}

pub async fn resume(orchestrator_id: &str, config: &Config) -> Result<()> {
    let service = service(config, Some(orchestrator_id)).await?;
    report(&service, service.resume(orchestrator_id).await);
    Ok(())
}

pub async fn stop(orchestrator_id: &str, force: bool, config: &Config) -> Result<()> {
    let service = service(config, Some(orchestrator_id)).await?;

    let confirmation = match service.request_stop(orchestrator_id) {
        Ok(c) => c,
        Err(e) => {
            println!("{}", format!("✗ Cannot stop: {}", e).red());
            return Ok(());
        }
    };

    // Confirm unless --force
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Stop {} ({})? The loop cannot be resumed afterwards",
                confirmation.orchestrator_name().bold(),
                confirmation.orchestrator_id()
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("{}", "Cancelled.".yellow());
            return Ok(());
        }
    }

    report(&service, service.stop(confirmation).await);
    Ok(())
}

fn report(
    service: &OrchestratorControlService,
    outcome: ralph_live_core::Result<ralph_live_core::types::ActionRecord>,
) {
    match outcome {
        Ok(record) => {
            print_action(&record);
            if let Some(orch) = service.selected() {
                print_orchestrator(&orch);
            }
        }
        Err(e) => println!("{}", format!("✗ {}", e).red()),
    }
}
