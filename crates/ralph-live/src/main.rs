//! ralph-live - Live log tail and control for Ralph orchestrators
//!
//! Lists orchestrator sessions, follows one orchestrator's log stream, and
//! issues start/stop/pause/resume commands against the Ralph server.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with tailed output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("ralph_live=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load()?;
    if let Some(url) = cli.api_url {
        config.api.url = url;
    }

    match cli.command {
        Commands::Sessions { watch } => commands::sessions::execute(watch, &config).await,
        Commands::Health => commands::health::execute(&config).await,
        Commands::Watch(cmd) => commands::watch::execute(cmd, &config).await,
        Commands::Start(cmd) => commands::control::start(cmd, &config).await,
        Commands::Pause { orchestrator_id } => {
            commands::control::pause(&orchestrator_id, &config).await
        }
        Commands::Resume { orchestrator_id } => {
            commands::control::resume(&orchestrator_id, &config).await
        }
        Commands::Stop {
            orchestrator_id,
            force,
        } => commands::control::stop(&orchestrator_id, force, &config).await,
        Commands::Version => {
            println!("ralph-live {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
