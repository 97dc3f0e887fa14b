// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Connection Pool
//!
//! Wraps `sqlx::postgres::PgPool` in a thin `Database` newtype that is
//! injected into all PostgreSQL repository implementations. In-memory
//! repositories are used for development and testing; this module is
//! needed only when `dispatch-config.yaml` selects the `postgres`
//! storage backend.

use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    /// Apply pending schema migrations (embedded from `./migrations`).
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}
