// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! The core matching algorithm.
//!
//! Walks the ordered queue sequentially and, per item, narrows the
//! candidate pool to agents handling the item's channel, then prefers
//! agents below the refill threshold over agents merely under their cap.
//! Loads are bumped on an in-memory working copy so later items in the
//! same cycle see earlier assignments. Deterministic by construction:
//! identical snapshots produce identical decisions.
//!
//! The net effect approximates weighted round-robin — agents furthest
//! below their cap receive new work first, strictly bounded by per-agent
//! and policy-wide caps.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::application::eligibility::{sort_by_load, Candidate};
use crate::domain::assignment::{AssignmentRecord, AssignmentRecordId, AssignmentReason};
use crate::domain::policy::AssignmentPolicy;
use crate::domain::work_item::{WorkItem, WorkItemId};

/// One committed-to-be decision: the mutated item and its audit record.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub item: WorkItem,
    pub record: AssignmentRecord,
}

#[derive(Debug, Default)]
pub struct AssignerOutput {
    pub assignments: Vec<Assignment>,
    /// Items with no eligible agent this cycle. Not an error; they stay
    /// unassigned and are retried on later cycles.
    pub skipped: Vec<WorkItemId>,
}

/// Match `queue` against `candidates` in order. `candidates` must arrive
/// in ascending-load order (see [`crate::application::eligibility`]);
/// the working-copy loads are mutated as items are placed.
pub fn assign(
    policy: &AssignmentPolicy,
    candidates: &mut Vec<Candidate>,
    queue: Vec<WorkItem>,
    now: DateTime<Utc>,
) -> AssignerOutput {
    let mut output = AssignerOutput::default();

    for mut item in queue {
        // Ascending load with id tiebreak, re-established after every
        // in-cycle bump so "head of group" stays well-defined.
        sort_by_load(candidates);

        let pick = candidates
            .iter()
            .position(|cand| {
                cand.agent.handles_channel(&item.channel, &policy.channels)
                    && cand.below_refill_threshold(policy)
                    && cand.has_capacity(policy)
            })
            .map(|idx| (idx, AssignmentReason::AutoRefill))
            .or_else(|| {
                candidates
                    .iter()
                    .position(|cand| {
                        cand.agent.handles_channel(&item.channel, &policy.channels)
                            && cand.has_capacity(policy)
                    })
                    .map(|idx| (idx, AssignmentReason::InitialAssignment))
            });

        let Some((idx, reason)) = pick else {
            debug!(work_item = %item.id, channel = %item.channel, "skipped: no eligible agent");
            output.skipped.push(item.id);
            continue;
        };

        let candidate = &mut candidates[idx];
        candidate.load += 1;
        item.assign_to(candidate.agent.id, now);

        output.assignments.push(Assignment {
            record: AssignmentRecord {
                id: AssignmentRecordId::new(),
                work_item_id: item.id,
                work_item_number: item.number,
                agent_id: candidate.agent.id,
                reason,
                agent_load_after_assignment: candidate.load,
                timestamp: now,
            },
            item,
        });
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::eligibility::eligible_agents;
    use crate::domain::agent::{Agent, Availability};
    use crate::domain::work_item::{Channel, Priority};
    use std::collections::{BTreeSet, HashMap};

    fn policy() -> AssignmentPolicy {
        AssignmentPolicy::new(BTreeSet::from([Channel::from("email")]))
    }

    fn candidates(agents: Vec<Agent>, loads: &HashMap<crate::domain::agent::AgentId, i32>) -> Vec<Candidate> {
        eligible_agents(&policy(), agents, loads)
    }

    #[test]
    fn refill_branch_is_preferred_and_tagged() {
        let below = Agent::new("below", Availability::Online);
        let above = Agent::new("above", Availability::Online);
        let loads = HashMap::from([(below.id, 0), (above.id, 3)]);
        let mut pool = candidates(vec![below.clone(), above], &loads);

        let item = WorkItem::new(100, Channel::from("email"), Priority::Normal);
        let out = assign(&policy(), &mut pool, vec![item], Utc::now());

        assert_eq!(out.assignments.len(), 1);
        let record = &out.assignments[0].record;
        assert_eq!(record.agent_id, below.id);
        assert_eq!(record.reason, AssignmentReason::AutoRefill);
        assert_eq!(record.agent_load_after_assignment, 1);
    }

    #[test]
    fn falls_back_to_capacity_branch_above_threshold() {
        // refill_threshold is 2; agent at load 3 still has capacity (max 5).
        let agent = Agent::new("busy", Availability::Online);
        let loads = HashMap::from([(agent.id, 3)]);
        let mut pool = candidates(vec![agent.clone()], &loads);

        let item = WorkItem::new(101, Channel::from("email"), Priority::Normal);
        let out = assign(&policy(), &mut pool, vec![item], Utc::now());

        let record = &out.assignments[0].record;
        assert_eq!(record.reason, AssignmentReason::InitialAssignment);
        assert_eq!(record.agent_load_after_assignment, 4);
    }

    #[test]
    fn skips_item_when_no_agent_handles_its_channel() {
        let mut email_only = Agent::new("email-only", Availability::Online);
        email_only.auto_assign_channels = Some(BTreeSet::from([Channel::from("email")]));
        let mut pool = candidates(vec![email_only], &HashMap::new());

        let mut chat_item = WorkItem::new(102, Channel::from("chat"), Priority::Normal);
        chat_item.channel = Channel::from("chat");
        let out = assign(&policy(), &mut pool, vec![chat_item.clone()], Utc::now());

        assert!(out.assignments.is_empty());
        assert_eq!(out.skipped, vec![chat_item.id]);
    }

    #[test]
    fn refill_branch_respects_an_override_cap_below_the_threshold() {
        // refill_threshold is 2; the override cap of 1 binds first, so the
        // second item must not land on the refill branch.
        let mut capped = Agent::new("capped", Availability::Online);
        capped.auto_assign_max = Some(1);
        let mut pool = candidates(vec![capped], &HashMap::new());

        let queue = (0..2)
            .map(|n| WorkItem::new(n, Channel::from("email"), Priority::Normal))
            .collect();
        let out = assign(&policy(), &mut pool, queue, Utc::now());

        assert_eq!(out.assignments.len(), 1);
        assert_eq!(out.assignments[0].record.reason, AssignmentReason::AutoRefill);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(pool[0].load, 1);
    }

    #[test]
    fn later_items_see_earlier_in_cycle_loads() {
        // One agent with override max 2: third item must be skipped.
        let mut capped = Agent::new("capped", Availability::Online);
        capped.auto_assign_max = Some(2);
        let mut pool = candidates(vec![capped], &HashMap::new());

        let queue = (0..3)
            .map(|n| WorkItem::new(n, Channel::from("email"), Priority::Normal))
            .collect();
        let out = assign(&policy(), &mut pool, queue, Utc::now());

        assert_eq!(out.assignments.len(), 2);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(pool[0].load, 2);
    }
}
