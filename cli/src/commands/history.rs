// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Browse the append-only assignment history.

use anyhow::Result;
use colored::Colorize;

use dispatch_core::domain::assignment::AssignmentReason;

use crate::client::DispatchClient;

pub async fn run(port: u16, limit: usize, offset: usize) -> Result<()> {
    let client = DispatchClient::new(port)?;
    let records = client.history(limit, offset).await?;

    if records.is_empty() {
        println!("{}", "No assignment records.".yellow());
        return Ok(());
    }

    println!("{}", "Assignment history (newest first):".bold());
    for record in &records {
        let reason = match record.reason {
            AssignmentReason::InitialAssignment => "initial".cyan(),
            AssignmentReason::AutoRefill => "refill".magenta(),
        };
        println!(
            "  {} #{:<6} -> {} [{}] load_after={}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            record.work_item_number,
            record.agent_id,
            reason,
            record.agent_load_after_assignment
        );
    }
    Ok(())
}
