// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DevTrack - a developer-activity tracking daemon.
//!
//! Watches Git repositories for commits, fires interval prompts, records
//! everything in a local event store, and coordinates with an external
//! intelligence process over a Unix-socket message bus.

use clap::{Parser, Subcommand};

use devtrack_core::ProfileDir;

mod control;
mod serve;
mod status;

/// DevTrack - a developer-activity tracking daemon.
#[derive(Parser, Debug)]
#[command(name = "devtrack", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the daemon (runs in the foreground; background via your init system)
    Start,
    /// Stop a running daemon
    Stop,
    /// Restart the daemon
    Restart,
    /// Show daemon status (exit code 0 even when stopped)
    Status {
        /// Structured JSON output for scripting
        #[arg(long)]
        json: bool,
        /// Disable colors
        #[arg(long)]
        plain: bool,
    },
    /// Pause the scheduler (the daemon keeps running)
    Pause,
    /// Resume a paused scheduler
    Resume,
    /// Print the last lines of the daemon log
    Logs {
        /// Number of lines to show
        #[arg(default_value_t = 50)]
        lines: usize,
    },
    /// Print event-store statistics
    DbStats,
    /// Fire a prompt immediately, bypassing pause and work hours
    ForceTrigger,
    /// Skip the next scheduled prompt
    SkipNext,
    /// Ask the intelligence peer to send the summary report
    SendSummary,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let profile = match ProfileDir::resolve() {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("✗ {e}");
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Start => serve::run_start(&profile).await,
        Commands::Stop => control::run_stop(&profile).await,
        Commands::Restart => {
            let stop_code = control::run_stop(&profile).await;
            if stop_code == 0 {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
            serve::run_start(&profile).await
        }
        Commands::Status { json, plain } => status::run_status(&profile, json, plain).await,
        Commands::Pause => {
            control::send_command(&profile, "pause", "Scheduler paused").await
        }
        Commands::Resume => {
            control::send_command(&profile, "resume", "Scheduler resumed").await
        }
        Commands::Logs { lines } => control::run_logs(&profile, lines),
        Commands::DbStats => control::run_db_stats(&profile).await,
        Commands::ForceTrigger => {
            control::send_command(&profile, "force_trigger", "Trigger fired").await
        }
        Commands::SkipNext => {
            control::send_command(&profile, "skip_next", "Next trigger skipped").await
        }
        Commands::SendSummary => {
            control::send_command(&profile, "send_summary", "Summary requested").await
        }
        Commands::Version => {
            println!("devtrack {}", env!("CARGO_PKG_VERSION"));
            0
        }
    };

    std::process::exit(code);
}
