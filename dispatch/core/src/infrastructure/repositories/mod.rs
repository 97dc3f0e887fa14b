// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-memory repository implementations (development and testing), plus
//! the PostgreSQL production implementations in the submodules.
//!
//! A single [`InMemoryWorkItemStore`] backs both the work item store and
//! the assignment log so `commit_assignment` is atomic under one lock —
//! the same guarantee the PostgreSQL implementation gets from a
//! transaction.

pub mod postgres_policy;
pub mod postgres_agent;
pub mod postgres_work_item;
pub mod postgres_assignment;

pub use postgres_policy::{PostgresBusinessHoursRepository, PostgresPolicyRepository};
pub use postgres_agent::PostgresAgentDirectory;
pub use postgres_work_item::PostgresWorkItemRepository;
pub use postgres_assignment::PostgresAssignmentLogRepository;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::agent::{Agent, AgentId, AgentOverridePatch};
use crate::domain::assignment::AssignmentRecord;
use crate::domain::policy::AssignmentPolicy;
use crate::domain::repository::{
    AgentDirectory, AssignmentLogRepository, BusinessHoursRepository, PolicyRepository,
    RepositoryError, WorkItemRepository,
};
use crate::domain::schedule::WeeklySchedule;
use crate::domain::work_item::{Channel, WorkItem, WorkItemId};

fn poisoned() -> RepositoryError {
    RepositoryError::Unknown("Mutex poisoned".to_string())
}

#[derive(Clone, Default)]
pub struct InMemoryPolicyRepository {
    policy: Arc<Mutex<Option<AssignmentPolicy>>>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AssignmentPolicy) -> Self {
        Self {
            policy: Arc::new(Mutex::new(Some(policy))),
        }
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn find(&self) -> Result<Option<AssignmentPolicy>, RepositoryError> {
        let policy = self.policy.lock().map_err(|_| poisoned())?;
        Ok(policy.clone())
    }

    async fn save(&self, next: &AssignmentPolicy) -> Result<(), RepositoryError> {
        let mut policy = self.policy.lock().map_err(|_| poisoned())?;
        *policy = Some(next.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAgentDirectory {
    agents: Arc<Mutex<HashMap<AgentId, Agent>>>,
}

impl InMemoryAgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an agent (intake path external to the engine).
    pub fn insert(&self, agent: Agent) {
        let mut agents = self.agents.lock().expect("agent directory lock");
        agents.insert(agent.id, agent);
    }
}

#[async_trait]
impl AgentDirectory for InMemoryAgentDirectory {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        let agents = self.agents.lock().map_err(|_| poisoned())?;
        let mut all: Vec<Agent> = agents.values().cloned().collect();
        all.sort_by_key(|agent| agent.id);
        Ok(all)
    }

    async fn find_agent(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        let agents = self.agents.lock().map_err(|_| poisoned())?;
        Ok(agents.get(&id).cloned())
    }

    async fn update_overrides(
        &self,
        id: AgentId,
        patch: AgentOverridePatch,
    ) -> Result<Agent, RepositoryError> {
        let mut agents = self.agents.lock().map_err(|_| poisoned())?;
        let agent = agents
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Agent {id}")))?;
        agent.apply_overrides(patch);
        Ok(agent.clone())
    }
}

#[derive(Default)]
struct WorkItemState {
    items: HashMap<WorkItemId, WorkItem>,
    log: Vec<AssignmentRecord>,
}

/// Work items and the assignment log share one lock (see module docs).
#[derive(Clone, Default)]
pub struct InMemoryWorkItemStore {
    state: Arc<Mutex<WorkItemState>>,
}

impl InMemoryWorkItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkItemRepository for InMemoryWorkItemStore {
    async fn find_unassigned(
        &self,
        channels: &BTreeSet<Channel>,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        let mut items: Vec<WorkItem> = state
            .items
            .values()
            .filter(|item| item.is_unassigned() && channels.contains(&item.channel))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn count_open_by_agent(&self) -> Result<HashMap<AgentId, i32>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        let mut counts: HashMap<AgentId, i32> = HashMap::new();
        for item in state.items.values() {
            if let Some(agent_id) = item.assigned_agent_id {
                if item.status.counts_toward_load() {
                    *counts.entry(agent_id).or_insert(0) += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn find_by_id(&self, id: WorkItemId) -> Result<Option<WorkItem>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        Ok(state.items.get(&id).cloned())
    }

    async fn save(&self, item: &WorkItem) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn commit_assignment(
        &self,
        item: &WorkItem,
        record: &AssignmentRecord,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        if !state.items.contains_key(&item.id) {
            return Err(RepositoryError::NotFound(format!("WorkItem {}", item.id)));
        }
        state.items.insert(item.id, item.clone());
        state.log.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl AssignmentLogRepository for InMemoryWorkItemStore {
    async fn find_recent(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AssignmentRecord>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        Ok(state
            .log
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBusinessHoursRepository {
    schedule: Arc<Mutex<WeeklySchedule>>,
}

impl InMemoryBusinessHoursRepository {
    pub fn new(schedule: WeeklySchedule) -> Self {
        Self {
            schedule: Arc::new(Mutex::new(schedule)),
        }
    }
}

#[async_trait]
impl BusinessHoursRepository for InMemoryBusinessHoursRepository {
    async fn weekly_schedule(&self) -> Result<WeeklySchedule, RepositoryError> {
        let schedule = self.schedule.lock().map_err(|_| poisoned())?;
        Ok(schedule.clone())
    }
}
