// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Assignment Log Repository
//!
//! Read side of the append-only `assignment_log` table. Writes go through
//! `PostgresWorkItemRepository::commit_assignment` only; nothing here (or
//! anywhere else in the engine) updates or deletes rows.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::agent::AgentId;
use crate::domain::assignment::{AssignmentReason, AssignmentRecord, AssignmentRecordId};
use crate::domain::repository::{AssignmentLogRepository, RepositoryError};
use crate::domain::work_item::WorkItemId;

pub struct PostgresAssignmentLogRepository {
    pool: PgPool,
}

impl PostgresAssignmentLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn reason_from_str(s: &str) -> AssignmentReason {
    match s {
        "auto_refill" => AssignmentReason::AutoRefill,
        _ => AssignmentReason::InitialAssignment,
    }
}

#[async_trait]
impl AssignmentLogRepository for PostgresAssignmentLogRepository {
    async fn find_recent(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AssignmentRecord>, RepositoryError> {
        // `seq` keeps newest-first stable even when a whole cycle shares
        // one timestamp.
        let rows = sqlx::query(
            r#"
            SELECT id, work_item_id, work_item_number, agent_id, reason,
                   agent_load_after_assignment, created_at
            FROM assignment_log
            ORDER BY seq DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: uuid::Uuid = row.get("id");
            let work_item_id: uuid::Uuid = row.get("work_item_id");
            let agent_id: uuid::Uuid = row.get("agent_id");
            let reason: String = row.get("reason");

            records.push(AssignmentRecord {
                id: AssignmentRecordId(id),
                work_item_id: WorkItemId(work_item_id),
                work_item_number: row.get("work_item_number"),
                agent_id: AgentId(agent_id),
                reason: reason_from_str(&reason),
                agent_load_after_assignment: row.get("agent_load_after_assignment"),
                timestamp: row.get("created_at"),
            });
        }
        Ok(records)
    }
}
