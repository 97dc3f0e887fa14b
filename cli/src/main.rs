// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Dispatch CLI
//!
//! The `dispatch` binary runs the auto-assignment service and administers
//! it over its HTTP API.
//!
//! ## Commands
//!
//! - `dispatch serve` - run the HTTP API plus the interval scheduler
//! - `dispatch policy show|init|set` - assignment policy management
//! - `dispatch agent list|show|set` - per-agent override management
//! - `dispatch run` - trigger one assignment cycle now
//! - `dispatch history` - recent assignment records, newest first

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod client;
mod commands;

use commands::{AgentCommand, PolicyCommand};

/// AEGIS Dispatch - automatic assignment of support work items
#[derive(Parser)]
#[command(name = "dispatch")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "DISPATCH_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port of a running service (client commands)
    #[arg(long, global = true, env = "DISPATCH_PORT", default_value = "8460")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DISPATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatch service (HTTP API + cycle scheduler)
    Serve,

    /// Assignment policy management
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },

    /// Agent override management
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Trigger one assignment cycle now
    Run,

    /// Show recent assignment records, newest first
    History {
        /// Number of records to show
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Records to skip (pagination)
        #[arg(long, default_value = "0")]
        offset: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    match cli.command {
        Commands::Serve => commands::serve::run(cli.config).await,
        Commands::Policy { command } => commands::policy::handle_command(command, cli.port).await,
        Commands::Agent { command } => commands::agent::handle_command(command, cli.port).await,
        Commands::Run => commands::run::run(cli.port).await,
        Commands::History { limit, offset } => commands::history::run(cli.port, limit, offset).await,
    }
}
