//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};
use ralph_live_core::types::LogLevel;

/// Ralph Live - follow and control remote orchestrator loops
#[derive(Parser, Debug)]
#[command(name = "ralph-live")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Override the server URL from config
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List orchestrator sessions
    Sessions {
        /// Keep refreshing until Ctrl+C
        #[arg(short, long)]
        watch: bool,
    },

    /// Check whether the server is reachable
    Health,

    /// Follow one orchestrator's live log
    Watch(WatchCommand),

    /// Start a new orchestrator
    Start(StartCommand),

    /// Pause a running orchestrator
    Pause {
        /// Orchestrator ID
        orchestrator_id: String,
    },

    /// Resume a paused orchestrator
    Resume {
        /// Orchestrator ID
        orchestrator_id: String,
    },

    /// Stop an orchestrator (asks for confirmation)
    Stop {
        /// Orchestrator ID
        orchestrator_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Orchestrator ID
    pub orchestrator_id: String,

    /// Levels to show (comma-separated: debug,info,warn,error)
    #[arg(short, long, value_delimiter = ',')]
    pub levels: Vec<LogLevel>,

    /// Skip loading recent history before streaming
    #[arg(long)]
    pub no_backfill: bool,
}

#[derive(Args, Debug)]
pub struct StartCommand {
    /// Prompt file on the server
    #[arg(short, long)]
    pub prompt_file: String,

    /// Orchestrator config file on the server
    #[arg(short, long)]
    pub config_file: Option<String>,

    /// Maximum iterations before the loop stops
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Maximum runtime in seconds
    #[arg(long)]
    pub max_runtime_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watch_parses_level_list() {
        let cli = Cli::parse_from(["ralph-live", "watch", "abc", "--levels", "warn,error"]);
        match cli.command {
            Commands::Watch(cmd) => {
                assert_eq!(cmd.orchestrator_id, "abc");
                assert_eq!(cmd.levels, vec![LogLevel::Warn, LogLevel::Error]);
                assert!(!cmd.no_backfill);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_stop_force_flag() {
        let cli = Cli::parse_from(["ralph-live", "stop", "abc", "--force"]);
        assert!(matches!(cli.command, Commands::Stop { force: true, .. }));
    }
}
