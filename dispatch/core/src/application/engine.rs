// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Assignment Engine (Application Service)
//!
//! Ties policy, eligibility, queueing, and matching into one `run_cycle`
//! entry point. Both the interval scheduler and the manual admin trigger
//! call this same method; a run lock serializes overlapping triggers so
//! at most one cycle executes at a time.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrate one assignment cycle (read → compute → write)
//! - **Dependencies:** Domain (policy, agents, work items), repositories
//!
//! # Cycle
//!
//! ```text
//! load policy            -- fresh every cycle, never cached
//! gate: enabled? business hours?
//! load agents + live load counts
//! eligibility filter     -- online, opted in, under cap; load asc
//! load queue page        -- unassigned, on-channel, ordered, capped
//! assigner               -- sequential matching, working-copy loads
//! per item: commit work-item mutation + audit record atomically
//! ```

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::{assigner, eligibility, queue};
use crate::domain::agent::AgentId;
use crate::domain::assignment::AssignmentReason;
use crate::domain::clock::Clock;
use crate::domain::policy::PolicyError;
use crate::domain::repository::{
    AgentDirectory, AssignmentLogRepository, BusinessHoursRepository, PolicyRepository,
    RepositoryError, WorkItemRepository,
};
use crate::domain::work_item::WorkItemId;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No policy configured. Cycles treat this as "disabled"; the API
    /// surfaces it as not-found.
    #[error("assignment policy is not configured")]
    ConfigurationMissing,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PolicyError> for EngineError {
    fn from(err: PolicyError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// One line of a cycle result, as returned to the trigger caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub work_item_id: WorkItemId,
    pub work_item_number: i64,
    pub agent_id: AgentId,
    pub reason: AssignmentReason,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub assigned: usize,
    pub results: Vec<AssignmentResult>,
    /// Items examined but left unassigned (no eligible agent).
    pub skipped: usize,
}

pub struct AssignmentEngine {
    policy_repo: Arc<dyn PolicyRepository>,
    directory: Arc<dyn AgentDirectory>,
    work_items: Arc<dyn WorkItemRepository>,
    audit_log: Arc<dyn AssignmentLogRepository>,
    business_hours: Arc<dyn BusinessHoursRepository>,
    clock: Arc<dyn Clock>,
    /// Single-flight guard: a timer firing mid-manual-run waits its turn.
    run_lock: tokio::sync::Mutex<()>,
}

impl AssignmentEngine {
    pub fn new(
        policy_repo: Arc<dyn PolicyRepository>,
        directory: Arc<dyn AgentDirectory>,
        work_items: Arc<dyn WorkItemRepository>,
        audit_log: Arc<dyn AssignmentLogRepository>,
        business_hours: Arc<dyn BusinessHoursRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy_repo,
            directory,
            work_items,
            audit_log,
            business_hours,
            clock,
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn policy_repo(&self) -> Arc<dyn PolicyRepository> {
        self.policy_repo.clone()
    }

    pub fn directory(&self) -> Arc<dyn AgentDirectory> {
        self.directory.clone()
    }

    pub fn work_items(&self) -> Arc<dyn WorkItemRepository> {
        self.work_items.clone()
    }

    pub fn audit_log(&self) -> Arc<dyn AssignmentLogRepository> {
        self.audit_log.clone()
    }

    /// Execute one assignment cycle. Returns the decisions made; an empty
    /// outcome when the engine is disabled, outside business hours, or
    /// has nothing to do.
    ///
    /// A `Store` error aborts the cycle: items already committed remain
    /// valid, the rest are retried on the next scheduled invocation.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, EngineError> {
        let _guard = self.run_lock.lock().await;
        counter!("dispatch_cycles_total").increment(1);

        let Some(policy) = self.policy_repo.find().await? else {
            debug!("no assignment policy configured; cycle is a no-op");
            return Ok(CycleOutcome::default());
        };
        if !policy.enabled {
            debug!(policy_version = policy.version, "auto-assignment disabled");
            return Ok(CycleOutcome::default());
        }

        let now = self.clock.now();
        if policy.business_hours_only {
            let schedule = self.business_hours.weekly_schedule().await?;
            if !schedule.is_open_at(now) {
                debug!(%now, "outside business hours; cycle is a no-op");
                return Ok(CycleOutcome::default());
            }
        }

        let agents = self.directory.list_agents().await?;
        // Loads come from a live count of open/in-progress items, never a
        // cached counter, so closures outside this engine cannot drift it.
        let loads = self.work_items.count_open_by_agent().await?;
        let mut candidates = eligibility::eligible_agents(&policy, agents, &loads);
        if candidates.is_empty() {
            debug!(policy_version = policy.version, "no eligible agents");
            return Ok(CycleOutcome::default());
        }

        let selected = self.work_items.find_unassigned(&policy.channels).await?;
        let ordered = queue::order_queue(&policy, selected);
        if ordered.is_empty() {
            debug!(policy_version = policy.version, "work queue empty");
            return Ok(CycleOutcome::default());
        }

        let output = assigner::assign(&policy, &mut candidates, ordered, now);

        let mut results = Vec::with_capacity(output.assignments.len());
        for assignment in &output.assignments {
            // Mutation and audit record commit together; a failure here
            // aborts the cycle with earlier items already durable.
            self.work_items
                .commit_assignment(&assignment.item, &assignment.record)
                .await?;
            results.push(AssignmentResult {
                work_item_id: assignment.record.work_item_id,
                work_item_number: assignment.record.work_item_number,
                agent_id: assignment.record.agent_id,
                reason: assignment.record.reason,
            });
        }

        counter!("dispatch_assignments_total").increment(results.len() as u64);
        counter!("dispatch_items_skipped_total").increment(output.skipped.len() as u64);
        info!(
            assigned = results.len(),
            skipped = output.skipped.len(),
            policy_version = policy.version,
            cycle_at = %now,
            "assignment cycle complete"
        );

        Ok(CycleOutcome {
            assigned: results.len(),
            skipped: output.skipped.len(),
            results,
        })
    }

    /// Periodic driver: runs `run_cycle` every `period`, forever. Errors
    /// are logged and the loop keeps going — the next tick is the retry.
    pub async fn run_scheduler(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "assignment scheduler started");
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_cycle().await {
                warn!(error = %err, "scheduled assignment cycle failed");
            }
        }
    }
}
