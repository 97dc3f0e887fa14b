// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent directory commands
//!
//! Commands: list, show, set

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::{json, Value};

use crate::client::{AgentRow, DispatchClient};

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List agents with their current load and override settings
    List,

    /// Show one agent's per-agent overrides
    Show {
        /// Agent id (UUID)
        id: String,
    },

    /// Update one agent's per-agent overrides
    Set {
        /// Agent id (UUID)
        id: String,

        /// Opt the agent in or out of auto-assignment
        #[arg(long)]
        enabled: Option<bool>,

        /// Personal cap, overriding the policy-wide max
        #[arg(long)]
        max: Option<i32>,

        /// Clear the personal cap, falling back to the policy-wide max
        #[arg(long, conflicts_with = "max")]
        clear_max: bool,

        /// Personal channel restriction, e.g. --channel email --channel chat
        #[arg(long = "channel")]
        channels: Vec<String>,

        /// Clear the channel restriction, falling back to the policy set
        #[arg(long, conflicts_with = "channels")]
        clear_channels: bool,
    },
}

pub async fn handle_command(command: AgentCommand, port: u16) -> Result<()> {
    let client = DispatchClient::new(port)?;
    match command {
        AgentCommand::List => {
            let agents = client.list_agents().await?;
            if agents.is_empty() {
                println!("{}", "No agents in the directory.".yellow());
                return Ok(());
            }
            println!("{}", "Agents:".bold());
            for agent in &agents {
                print_agent_row(agent);
            }
        }
        AgentCommand::Show { id } => {
            let overrides = client.get_overrides(&id).await?;
            println!("{} {}", "Overrides for agent".bold(), id);
            println!("{}", serde_json::to_string_pretty(&overrides)?);
        }
        AgentCommand::Set {
            id,
            enabled,
            max,
            clear_max,
            channels,
            clear_channels,
        } => {
            let mut patch = serde_json::Map::new();
            if let Some(enabled) = enabled {
                patch.insert("auto_assign_enabled".into(), json!(enabled));
            }
            if clear_max {
                patch.insert("auto_assign_max".into(), Value::Null);
            } else if let Some(max) = max {
                patch.insert("auto_assign_max".into(), json!(max));
            }
            if clear_channels {
                patch.insert("auto_assign_channels".into(), Value::Null);
            } else if !channels.is_empty() {
                patch.insert("auto_assign_channels".into(), json!(channels));
            }
            if patch.is_empty() {
                println!("{}", "Nothing to update.".yellow());
                return Ok(());
            }
            let overrides = client.patch_overrides(&id, Value::Object(patch)).await?;
            println!("{}", "Agent overrides updated.".green());
            println!("{}", serde_json::to_string_pretty(&overrides)?);
        }
    }
    Ok(())
}

fn print_agent_row(agent: &AgentRow) {
    let availability = match agent.availability.as_str() {
        "online" => agent.availability.green().to_string(),
        "away" => agent.availability.yellow().to_string(),
        _ => agent.availability.red().to_string(),
    };
    let opted = if agent.auto_assign_enabled {
        "in".green().to_string()
    } else {
        "out".red().to_string()
    };
    let max = agent
        .auto_assign_max
        .map(|m| m.to_string())
        .unwrap_or_else(|| "policy".to_string());
    let channels = agent
        .auto_assign_channels
        .as_ref()
        .map(|c| c.join(","))
        .unwrap_or_else(|| "policy".to_string());
    println!(
        "  {} {} [{}] load={} opt={} max={} channels={}",
        agent.id.dimmed(),
        agent.name.bold(),
        availability,
        agent.current_load,
        opted,
        max,
        channels
    );
}
