// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Trigger an assignment cycle on the running service.

use anyhow::Result;
use colored::Colorize;

use crate::client::DispatchClient;

pub async fn run(port: u16) -> Result<()> {
    let client = DispatchClient::new(port)?;
    let outcome = client.run_cycle().await?;

    if outcome.assigned == 0 {
        println!("{}", "Cycle complete: nothing to assign.".yellow());
    } else {
        println!(
            "{}",
            format!("Cycle complete: {} item(s) assigned.", outcome.assigned).green()
        );
        for result in &outcome.results {
            println!(
                "  #{} -> agent {} ({:?})",
                result.work_item_number, result.agent_id, result.reason
            );
        }
    }
    if outcome.skipped > 0 {
        println!("  {} item(s) skipped (no capacity).", outcome.skipped);
    }
    Ok(())
}
