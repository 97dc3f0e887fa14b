// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate, following the DDD Repository
//! pattern: one repository per aggregate, interface defined in the domain
//! layer, implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `PolicyRepository` | `AssignmentPolicy` | `InMemoryPolicyRepository`, `PostgresPolicyRepository` |
//! | `AgentDirectory` | `Agent` | `InMemoryAgentDirectory`, `PostgresAgentDirectory` |
//! | `WorkItemRepository` | `WorkItem` | `InMemoryWorkItemStore`, `PostgresWorkItemRepository` |
//! | `AssignmentLogRepository` | `AssignmentRecord` | `InMemoryWorkItemStore`, `PostgresAssignmentLogRepository` |
//! | `BusinessHoursRepository` | `WeeklySchedule` | `InMemoryBusinessHoursRepository`, `PostgresBusinessHoursRepository` |
//!
//! In-memory implementations serve development and testing; PostgreSQL
//! implementations production. The backend is selected at startup from
//! `dispatch-config.yaml`.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::domain::agent::{Agent, AgentId, AgentOverridePatch};
use crate::domain::assignment::AssignmentRecord;
use crate::domain::policy::AssignmentPolicy;
use crate::domain::schedule::WeeklySchedule;
use crate::domain::work_item::{Channel, WorkItem, WorkItemId};

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Repository for the singleton assignment policy.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Fetch the policy, `None` when never configured.
    async fn find(&self) -> Result<Option<AssignmentPolicy>, RepositoryError>;

    /// Persist the policy (create or replace).
    async fn save(&self, policy: &AssignmentPolicy) -> Result<(), RepositoryError>;
}

/// Read/override access to the staff directory. Agent creation and
/// retirement happen outside this engine.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError>;

    async fn find_agent(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError>;

    /// Apply a per-agent override patch, returning the updated agent.
    async fn update_overrides(
        &self,
        id: AgentId,
        patch: AgentOverridePatch,
    ) -> Result<Agent, RepositoryError>;
}

/// Work item store: selection of unassigned items, derived load counts,
/// and the one mutation this engine performs.
#[async_trait]
pub trait WorkItemRepository: Send + Sync {
    /// All unassigned, open items whose channel is in `channels`, in
    /// creation order. The per-cycle page cap is applied by the caller
    /// after policy ordering, so a high-priority item deep in the backlog
    /// is never cut off by a creation-order page.
    async fn find_unassigned(
        &self,
        channels: &BTreeSet<Channel>,
    ) -> Result<Vec<WorkItem>, RepositoryError>;

    /// Live count of open/in-progress items per agent — the source of
    /// truth for `current_load`, recomputed every cycle.
    async fn count_open_by_agent(&self) -> Result<HashMap<AgentId, i32>, RepositoryError>;

    async fn find_by_id(&self, id: WorkItemId) -> Result<Option<WorkItem>, RepositoryError>;

    /// Persist (create or update) a work item. Used by intake paths and
    /// test seeding, not by the assignment loop.
    async fn save(&self, item: &WorkItem) -> Result<(), RepositoryError>;

    /// Atomically persist an assignment: the mutated work item and its
    /// audit record commit together or not at all, keeping the record ↔
    /// transition relationship 1:1 even across a crash.
    async fn commit_assignment(
        &self,
        item: &WorkItem,
        record: &AssignmentRecord,
    ) -> Result<(), RepositoryError>;
}

/// Read side of the append-only assignment audit trail. Writes happen only
/// through `WorkItemRepository::commit_assignment`.
#[async_trait]
pub trait AssignmentLogRepository: Send + Sync {
    /// Records newest first, paginated.
    async fn find_recent(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AssignmentRecord>, RepositoryError>;
}

/// Supplier of the weekly business-hours schedule.
#[async_trait]
pub trait BusinessHoursRepository: Send + Sync {
    async fn weekly_schedule(&self) -> Result<WeeklySchedule, RepositoryError>;
}
