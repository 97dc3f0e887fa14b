// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Work queue selection and ordering.
//!
//! Selects unassigned, open items on the policy's channels and orders
//! them per `PriorityOrder`. The page is capped so a huge backlog bounds
//! per-cycle latency; the remainder is picked up on later cycles.

use crate::domain::policy::{AssignmentPolicy, PriorityOrder};
use crate::domain::work_item::WorkItem;

/// Items considered per cycle. Backpressure bound, not a fairness knob.
pub const QUEUE_PAGE_SIZE: usize = 50;

/// Order the candidate items for one cycle, re-applying the selection
/// filter, and truncate to [`QUEUE_PAGE_SIZE`].
pub fn order_queue(policy: &AssignmentPolicy, items: Vec<WorkItem>) -> Vec<WorkItem> {
    let mut queue: Vec<WorkItem> = items
        .into_iter()
        .filter(|item| item.is_unassigned() && policy.channels.contains(&item.channel))
        .collect();

    match policy.priority_order {
        PriorityOrder::PriorityFirst => queue.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        }),
        PriorityOrder::OldestFirst => {
            queue.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
        }
        PriorityOrder::NewestFirst => {
            queue.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)))
        }
    }

    queue.truncate(QUEUE_PAGE_SIZE);
    queue
}
