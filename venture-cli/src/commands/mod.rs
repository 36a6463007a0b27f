//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod run;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a startup idea for analysis
    Submit {
        /// Free-text description of the idea
        idea: String,

        /// Wait for the run to finish and print progress
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the current state of a run
    Status {
        /// Run ID
        id: String,
    },
    /// List recent runs
    List {
        /// Maximum number of runs to show
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Poll a run until it reaches a terminal status
    Watch {
        /// Run ID
        id: String,

        /// Poll interval in seconds
        #[arg(short, long, default_value_t = 2)]
        interval: u64,
    },
    /// Download the markdown report for a completed run
    Report {
        /// Run ID
        id: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Submit { idea, watch } => run::submit(config, &idea, watch).await,
        Commands::Status { id } => run::status(config, &id).await,
        Commands::List { limit } => run::list(config, limit).await,
        Commands::Watch { id, interval } => run::watch(config, &id, interval).await,
        Commands::Report { id, output } => run::report(config, &id, output).await,
    }
}
