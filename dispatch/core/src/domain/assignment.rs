// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Assignment audit records.
//!
//! One record exists iff a work item transitioned from unassigned to
//! assigned in a cycle — the record and the mutation are committed
//! together. Records are append-only; nothing in this engine mutates or
//! deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::work_item::WorkItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentRecordId(pub Uuid);

impl AssignmentRecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssignmentRecordId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which branch of the matching algorithm produced the assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentReason {
    /// Agent had capacity but was at or above the refill threshold.
    InitialAssignment,
    /// Agent was below the refill threshold and got topped up first.
    AutoRefill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: AssignmentRecordId,
    pub work_item_id: WorkItemId,
    pub work_item_number: i64,
    pub agent_id: AgentId,
    pub reason: AssignmentReason,
    /// The agent's open/in-progress count immediately after this
    /// assignment, as seen by the cycle's working copy.
    pub agent_load_after_assignment: i32,
    pub timestamp: DateTime<Utc>,
}
