// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Work Item Repository
//!
//! Production `WorkItemRepository` backed by the `work_items` table.
//! `commit_assignment` writes the work-item mutation and its audit record
//! in one transaction, so the record ↔ transition relationship stays
//! 1:1 even across a crash mid-cycle.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::agent::AgentId;
use crate::domain::assignment::AssignmentRecord;
use crate::domain::repository::{RepositoryError, WorkItemRepository};
use crate::domain::work_item::{Channel, Priority, WorkItem, WorkItemId, WorkItemStatus};

pub struct PostgresWorkItemRepository {
    pool: PgPool,
}

impl PostgresWorkItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn priority_str(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "critical",
        Priority::Urgent => "urgent",
        Priority::High => "high",
        Priority::Normal => "normal",
        Priority::Low => "low",
    }
}

fn priority_from_str(s: &str) -> Priority {
    match s {
        "critical" => Priority::Critical,
        "urgent" => Priority::Urgent,
        "high" => Priority::High,
        "low" => Priority::Low,
        _ => Priority::Normal,
    }
}

pub(crate) fn status_str(status: WorkItemStatus) -> &'static str {
    match status {
        WorkItemStatus::Open => "open",
        WorkItemStatus::InProgress => "in_progress",
        WorkItemStatus::Resolved => "resolved",
        WorkItemStatus::Closed => "closed",
    }
}

fn status_from_str(s: &str) -> WorkItemStatus {
    match s {
        "in_progress" => WorkItemStatus::InProgress,
        "resolved" => WorkItemStatus::Resolved,
        "closed" => WorkItemStatus::Closed,
        _ => WorkItemStatus::Open,
    }
}

pub(crate) fn reason_str(reason: crate::domain::assignment::AssignmentReason) -> &'static str {
    match reason {
        crate::domain::assignment::AssignmentReason::InitialAssignment => "initial_assignment",
        crate::domain::assignment::AssignmentReason::AutoRefill => "auto_refill",
    }
}

fn item_from_row(row: &sqlx::postgres::PgRow) -> WorkItem {
    let id: uuid::Uuid = row.get("id");
    let channel: String = row.get("channel");
    let priority: String = row.get("priority");
    let status: String = row.get("status");
    let assigned: Option<uuid::Uuid> = row.get("assigned_agent_id");

    WorkItem {
        id: WorkItemId(id),
        number: row.get("number"),
        channel: Channel::new(channel),
        priority: priority_from_str(&priority),
        status: status_from_str(&status),
        assigned_agent_id: assigned.map(AgentId),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl WorkItemRepository for PostgresWorkItemRepository {
    async fn find_unassigned(
        &self,
        channels: &BTreeSet<Channel>,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let channel_names: Vec<String> =
            channels.iter().map(|c| c.as_str().to_string()).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, number, channel, priority, status, assigned_agent_id,
                   created_at, updated_at
            FROM work_items
            WHERE assigned_agent_id IS NULL
              AND status = 'open'
              AND channel = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&channel_names)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn count_open_by_agent(&self) -> Result<HashMap<AgentId, i32>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT assigned_agent_id, COUNT(*) AS open_count
            FROM work_items
            WHERE assigned_agent_id IS NOT NULL
              AND status IN ('open', 'in_progress')
            GROUP BY assigned_agent_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut counts = HashMap::new();
        for row in rows {
            let agent_id: uuid::Uuid = row.get("assigned_agent_id");
            let count: i64 = row.get("open_count");
            counts.insert(AgentId(agent_id), count as i32);
        }
        Ok(counts)
    }

    async fn find_by_id(&self, id: WorkItemId) -> Result<Option<WorkItem>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, number, channel, priority, status, assigned_agent_id,
                   created_at, updated_at
            FROM work_items
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(row.as_ref().map(item_from_row))
    }

    async fn save(&self, item: &WorkItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO work_items (
                id, number, channel, priority, status, assigned_agent_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                channel = EXCLUDED.channel,
                priority = EXCLUDED.priority,
                status = EXCLUDED.status,
                assigned_agent_id = EXCLUDED.assigned_agent_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(item.id.0)
        .bind(item.number)
        .bind(item.channel.as_str())
        .bind(priority_str(item.priority))
        .bind(status_str(item.status))
        .bind(item.assigned_agent_id.map(|a| a.0))
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save work item: {}", e)))?;

        Ok(())
    }

    async fn commit_assignment(
        &self,
        item: &WorkItem,
        record: &AssignmentRecord,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let updated = sqlx::query(
            r#"
            UPDATE work_items SET
                assigned_agent_id = $2,
                status = $3,
                updated_at = $4
            WHERE id = $1 AND assigned_agent_id IS NULL
            "#,
        )
        .bind(item.id.0)
        .bind(item.assigned_agent_id.map(|a| a.0))
        .bind(status_str(item.status))
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to assign work item: {}", e)))?;

        if updated.rows_affected() == 0 {
            // Item vanished or was assigned out from under us.
            tx.rollback()
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
            return Err(RepositoryError::NotFound(format!(
                "Unassigned work item {}",
                item.id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO assignment_log (
                id, work_item_id, work_item_number, agent_id, reason,
                agent_load_after_assignment, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.0)
        .bind(record.work_item_id.0)
        .bind(record.work_item_number)
        .bind(record.agent_id.0)
        .bind(reason_str(record.reason))
        .bind(record.agent_load_after_assignment)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to append audit record: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }
}
