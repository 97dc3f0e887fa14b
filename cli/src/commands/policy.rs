// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Assignment policy commands
//!
//! Commands: show, init, set

use std::collections::BTreeSet;

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;

use dispatch_core::domain::policy::{AssignmentPolicy, PolicyPatch, PriorityOrder};
use dispatch_core::domain::work_item::Channel;

use crate::client::DispatchClient;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderArg {
    PriorityFirst,
    OldestFirst,
    NewestFirst,
}

impl From<OrderArg> for PriorityOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::PriorityFirst => PriorityOrder::PriorityFirst,
            OrderArg::OldestFirst => PriorityOrder::OldestFirst,
            OrderArg::NewestFirst => PriorityOrder::NewestFirst,
        }
    }
}

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// Show the current assignment policy
    Show,

    /// Create (or replace) the assignment policy
    Init {
        /// Eligible channels, e.g. --channel email --channel chat
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,

        /// Policy-wide cap on open/in-progress items per agent
        #[arg(long)]
        max: Option<i32>,

        /// Load level below which agents are preferentially topped up
        #[arg(long)]
        refill: Option<i32>,

        /// Queue ordering
        #[arg(long, value_enum)]
        order: Option<OrderArg>,

        /// Only assign during business hours
        #[arg(long)]
        business_hours_only: bool,
    },

    /// Update individual policy fields
    Set {
        #[arg(long)]
        enabled: Option<bool>,

        #[arg(long)]
        max: Option<i32>,

        #[arg(long)]
        refill: Option<i32>,

        #[arg(long, value_enum)]
        order: Option<OrderArg>,

        /// Replace the eligible channel set
        #[arg(long = "channel")]
        channels: Vec<String>,

        #[arg(long)]
        business_hours_only: Option<bool>,
    },
}

pub async fn handle_command(command: PolicyCommand, port: u16) -> Result<()> {
    let client = DispatchClient::new(port)?;
    match command {
        PolicyCommand::Show => {
            let policy = client.get_policy().await?;
            print_policy(&policy);
        }
        PolicyCommand::Init {
            channels,
            max,
            refill,
            order,
            business_hours_only,
        } => {
            let body = json!({
                "channels": channels,
                "max_assigned_tickets": max,
                "refill_threshold": refill,
                "priority_order": order.map(|o| order_name(o.into())),
                "business_hours_only": business_hours_only,
            });
            let policy = client.create_policy(body).await?;
            println!("{}", "Assignment policy created.".green());
            print_policy(&policy);
        }
        PolicyCommand::Set {
            enabled,
            max,
            refill,
            order,
            channels,
            business_hours_only,
        } => {
            let channel_set: Option<BTreeSet<Channel>> = if channels.is_empty() {
                None
            } else {
                Some(channels.into_iter().map(Channel::new).collect())
            };
            let patch = PolicyPatch {
                enabled,
                max_assigned_tickets: max,
                refill_threshold: refill,
                priority_order: order.map(Into::into),
                channels: channel_set,
                business_hours_only,
            };
            let policy = client.patch_policy(patch).await?;
            println!("{}", "Assignment policy updated.".green());
            print_policy(&policy);
        }
    }
    Ok(())
}

fn order_name(order: PriorityOrder) -> &'static str {
    match order {
        PriorityOrder::PriorityFirst => "priority_first",
        PriorityOrder::OldestFirst => "oldest_first",
        PriorityOrder::NewestFirst => "newest_first",
    }
}

fn print_policy(policy: &AssignmentPolicy) {
    println!("{}", "Assignment policy:".bold());
    println!(
        "  Enabled: {}",
        if policy.enabled {
            "yes".green().to_string()
        } else {
            "no".red().to_string()
        }
    );
    println!("  Max assigned tickets: {}", policy.max_assigned_tickets);
    println!("  Refill threshold: {}", policy.refill_threshold);
    println!("  Priority order: {}", order_name(policy.priority_order));
    let channels: Vec<&str> = policy.channels.iter().map(|c| c.as_str()).collect();
    println!("  Channels: {}", channels.join(", "));
    println!(
        "  Business hours only: {}",
        if policy.business_hours_only { "yes" } else { "no" }
    );
    println!("  Version: {}", policy.version);
}
