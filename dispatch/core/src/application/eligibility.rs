// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Eligibility filter: which agents may receive work this cycle, and in
//! what order.
//!
//! An agent is eligible when online, opted in to auto-assignment, and
//! below its effective cap (per-agent override, else the policy max).
//! The result is ordered by current load ascending — a fairness ordering
//! that approximates round-robin across cycles — with agent id as the
//! deterministic tiebreak.

use std::collections::HashMap;

use crate::domain::agent::{Agent, AgentId, Availability};
use crate::domain::policy::AssignmentPolicy;

/// An eligible agent together with the cycle's working copy of its load.
/// The load is mutated in memory as the cycle assigns items so later
/// decisions see earlier ones; stores are not re-queried mid-cycle.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub agent: Agent,
    pub load: i32,
}

impl Candidate {
    pub fn effective_max(&self, policy: &AssignmentPolicy) -> i32 {
        self.agent.effective_max(policy.max_assigned_tickets)
    }

    pub fn has_capacity(&self, policy: &AssignmentPolicy) -> bool {
        self.load < self.effective_max(policy)
    }

    pub fn below_refill_threshold(&self, policy: &AssignmentPolicy) -> bool {
        self.load < policy.refill_threshold
    }
}

/// Filter and order the candidate pool for one cycle. `loads` is the live
/// open/in-progress count per agent; agents absent from the map carry
/// zero load.
pub fn eligible_agents(
    policy: &AssignmentPolicy,
    agents: Vec<Agent>,
    loads: &HashMap<AgentId, i32>,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = agents
        .into_iter()
        .filter(|agent| agent.availability == Availability::Online && agent.auto_assign_enabled)
        .map(|agent| {
            let load = loads.get(&agent.id).copied().unwrap_or(0);
            Candidate { agent, load }
        })
        .filter(|candidate| candidate.has_capacity(policy))
        .collect();

    sort_by_load(&mut candidates);
    candidates
}

/// Ascending load, agent id as the secondary key. Re-applied by the
/// assigner after each in-cycle load bump.
pub fn sort_by_load(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| a.load.cmp(&b.load).then(a.agent.id.cmp(&b.agent.id)));
}
