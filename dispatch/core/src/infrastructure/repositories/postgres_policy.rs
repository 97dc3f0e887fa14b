// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Policy Repository
//!
//! Production `PolicyRepository` backed by the single-row
//! `assignment_policy` table, plus the `BusinessHoursRepository` reading
//! the `business_hours` table. Translates between the
//! `AssignmentPolicy` domain value and the relational schema.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::policy::{AssignmentPolicy, PriorityOrder};
use crate::domain::repository::{BusinessHoursRepository, PolicyRepository, RepositoryError};
use crate::domain::schedule::{OpenWindow, WeeklySchedule};

pub struct PostgresPolicyRepository {
    pool: PgPool,
}

impl PostgresPolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn priority_order_str(order: PriorityOrder) -> &'static str {
    match order {
        PriorityOrder::PriorityFirst => "priority_first",
        PriorityOrder::OldestFirst => "oldest_first",
        PriorityOrder::NewestFirst => "newest_first",
    }
}

fn priority_order_from_str(s: &str) -> PriorityOrder {
    match s {
        "oldest_first" => PriorityOrder::OldestFirst,
        "newest_first" => PriorityOrder::NewestFirst,
        _ => PriorityOrder::PriorityFirst,
    }
}

#[async_trait]
impl PolicyRepository for PostgresPolicyRepository {
    async fn find(&self) -> Result<Option<AssignmentPolicy>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT
                enabled, max_assigned_tickets, refill_threshold,
                priority_order, channels, business_hours_only,
                version, updated_at
            FROM assignment_policy
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let priority_order: String = row.get("priority_order");
        let channels_val: serde_json::Value = row.get("channels");
        let channels = serde_json::from_value(channels_val)
            .map_err(|e| RepositoryError::Serialization(format!("Failed to deserialize channels: {}", e)))?;

        Ok(Some(AssignmentPolicy {
            enabled: row.get("enabled"),
            max_assigned_tickets: row.get("max_assigned_tickets"),
            refill_threshold: row.get("refill_threshold"),
            priority_order: priority_order_from_str(&priority_order),
            channels,
            business_hours_only: row.get("business_hours_only"),
            version: row.get("version"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn save(&self, policy: &AssignmentPolicy) -> Result<(), RepositoryError> {
        let channels = serde_json::to_value(&policy.channels)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO assignment_policy (
                id, enabled, max_assigned_tickets, refill_threshold,
                priority_order, channels, business_hours_only,
                version, updated_at
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                enabled = EXCLUDED.enabled,
                max_assigned_tickets = EXCLUDED.max_assigned_tickets,
                refill_threshold = EXCLUDED.refill_threshold,
                priority_order = EXCLUDED.priority_order,
                channels = EXCLUDED.channels,
                business_hours_only = EXCLUDED.business_hours_only,
                version = EXCLUDED.version,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(policy.enabled)
        .bind(policy.max_assigned_tickets)
        .bind(policy.refill_threshold)
        .bind(priority_order_str(policy.priority_order))
        .bind(channels)
        .bind(policy.business_hours_only)
        .bind(policy.version)
        .bind(policy.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save policy: {}", e)))?;

        Ok(())
    }
}

/// Weekday numbering in `business_hours`: 0 = Monday .. 6 = Sunday.
pub struct PostgresBusinessHoursRepository {
    pool: PgPool,
}

impl PostgresBusinessHoursRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BusinessHoursRepository for PostgresBusinessHoursRepository {
    async fn weekly_schedule(&self) -> Result<WeeklySchedule, RepositoryError> {
        let rows = sqlx::query("SELECT weekday, open_time, close_time FROM business_hours")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut schedule = WeeklySchedule::default();
        for row in rows {
            let weekday: i16 = row.get("weekday");
            let window = OpenWindow {
                open: row.get("open_time"),
                close: row.get("close_time"),
            };
            match weekday {
                0 => schedule.monday = Some(window),
                1 => schedule.tuesday = Some(window),
                2 => schedule.wednesday = Some(window),
                3 => schedule.thursday = Some(window),
                4 => schedule.friday = Some(window),
                5 => schedule.saturday = Some(window),
                6 => schedule.sunday = Some(window),
                _ => {}
            }
        }
        Ok(schedule)
    }
}
