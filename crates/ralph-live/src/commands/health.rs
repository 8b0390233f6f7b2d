//! Server reachability check.

use anyhow::Result;
use colored::Colorize;
use ralph_live_core::client::OrchestratorApi;

use super::client;
use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    let client = client(config)?;
    match client.health().await {
        Ok(health) => {
            println!(
                "{} {} reachable ({}{})",
                "✓".green(),
                config.api.url.cyan(),
                health.status,
                health
                    .version
                    .map(|v| format!(", v{}", v))
                    .unwrap_or_default()
            );
        }
        Err(e) => {
            println!("{} {} unreachable: {}", "✗".red(), config.api.url.cyan(), e);
        }
    }
    Ok(())
}
