// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Agent Directory
//!
//! Production `AgentDirectory` backed by the `agents` table. Agent rows
//! are created and retired by the staff-management system; this engine
//! reads them and updates only the three auto-assign override columns.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::agent::{Agent, AgentId, AgentOverridePatch, Availability};
use crate::domain::repository::{AgentDirectory, RepositoryError};

pub struct PostgresAgentDirectory {
    pool: PgPool,
}

impl PostgresAgentDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn availability_from_str(s: &str) -> Availability {
    match s {
        "online" => Availability::Online,
        "away" => Availability::Away,
        _ => Availability::Offline,
    }
}

fn agent_from_row(row: &sqlx::postgres::PgRow) -> Result<Agent, RepositoryError> {
    let id: uuid::Uuid = row.get("id");
    let availability: String = row.get("availability");
    let channels_val: Option<serde_json::Value> = row.get("auto_assign_channels");
    let auto_assign_channels = channels_val
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| {
            RepositoryError::Serialization(format!("Failed to deserialize agent channels: {}", e))
        })?;

    Ok(Agent {
        id: AgentId(id),
        name: row.get("name"),
        availability: availability_from_str(&availability),
        auto_assign_enabled: row.get("auto_assign_enabled"),
        auto_assign_max: row.get("auto_assign_max"),
        auto_assign_channels,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl AgentDirectory for PostgresAgentDirectory {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                id, name, availability, auto_assign_enabled,
                auto_assign_max, auto_assign_channels,
                created_at, updated_at
            FROM agents
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(agent_from_row).collect()
    }

    async fn find_agent(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT
                id, name, availability, auto_assign_enabled,
                auto_assign_max, auto_assign_channels,
                created_at, updated_at
            FROM agents
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn update_overrides(
        &self,
        id: AgentId,
        patch: AgentOverridePatch,
    ) -> Result<Agent, RepositoryError> {
        let mut agent = self
            .find_agent(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Agent {id}")))?;
        agent.apply_overrides(patch);

        let channels = agent
            .auto_assign_channels
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE agents SET
                auto_assign_enabled = $2,
                auto_assign_max = $3,
                auto_assign_channels = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(agent.id.0)
        .bind(agent.auto_assign_enabled)
        .bind(agent.auto_assign_max)
        .bind(channels)
        .bind(agent.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to update agent overrides: {}", e)))?;

        Ok(agent)
    }
}
