// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Work item (ticket) aggregate.
//!
//! Work items are created externally with no assignee. This engine is the
//! only actor that transitions `assigned_agent_id` from `None` to
//! `Some(agent)` through the auto-assignment flow; manual reassignment is
//! an external path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkItemId(pub Uuid);

impl WorkItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for WorkItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Intake channel a work item arrived through ("email", "chat", ...).
/// A typed newtype rather than raw strings so channel sets stay explicit
/// end to end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Urgency ranking. `rank()` gives the comparison key used by
/// priority-first queue ordering: lower rank is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::Urgent => 1,
            Priority::High => 2,
            Priority::Normal => 3,
            Priority::Low => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl WorkItemStatus {
    /// Statuses that count toward an agent's current load.
    pub fn counts_toward_load(self) -> bool {
        matches!(self, WorkItemStatus::Open | WorkItemStatus::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    /// Human-facing ticket number, assigned by the intake system.
    pub number: i64,
    pub channel: Channel,
    pub priority: Priority,
    pub status: WorkItemStatus,
    pub assigned_agent_id: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(number: i64, channel: Channel, priority: Priority) -> Self {
        let now = Utc::now();
        Self {
            id: WorkItemId::new(),
            number,
            channel,
            priority,
            status: WorkItemStatus::Open,
            assigned_agent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_agent_id.is_none() && self.status == WorkItemStatus::Open
    }

    /// The one mutation this engine performs: null → agent, open →
    /// in-progress. Channel, priority, and creation time are untouched.
    pub fn assign_to(&mut self, agent_id: AgentId, at: DateTime<Utc>) {
        self.assigned_agent_id = Some(agent_id);
        self.status = WorkItemStatus::InProgress;
        self.updated_at = at;
    }
}
