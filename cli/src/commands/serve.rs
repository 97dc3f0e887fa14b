// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Run the dispatch service: HTTP API plus the interval scheduler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use dispatch_core::application::AssignmentEngine;
use dispatch_core::config::{ServiceConfig, StorageConfig};
use dispatch_core::domain::clock::SystemClock;
use dispatch_core::domain::repository::{
    AgentDirectory, AssignmentLogRepository, BusinessHoursRepository, PolicyRepository,
    WorkItemRepository,
};
use dispatch_core::infrastructure::db::Database;
use dispatch_core::infrastructure::repositories::{
    InMemoryAgentDirectory, InMemoryBusinessHoursRepository, InMemoryPolicyRepository,
    InMemoryWorkItemStore, PostgresAgentDirectory, PostgresAssignmentLogRepository,
    PostgresBusinessHoursRepository, PostgresPolicyRepository, PostgresWorkItemRepository,
};
use dispatch_core::presentation;

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = ServiceConfig::load_or_default(config_path)?;

    let engine = Arc::new(build_engine(&config).await?);

    if config.scheduler.cycle_interval_seconds > 0 {
        let period = Duration::from_secs(config.scheduler.cycle_interval_seconds);
        tokio::spawn(engine.clone().run_scheduler(period));
    } else {
        info!("scheduler disabled; cycles run on manual trigger only");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    println!("{} {}", "Dispatch service listening on".green(), addr.bold());
    info!(%addr, "dispatch service started");

    axum::serve(listener, presentation::app(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("dispatch service stopped");
    Ok(())
}

async fn build_engine(config: &ServiceConfig) -> Result<AssignmentEngine> {
    let clock = Arc::new(SystemClock);

    match &config.storage {
        StorageConfig::InMemory => {
            info!("using in-memory storage backend");
            // One store backs both the work items and the audit log so an
            // assignment and its record commit under the same lock.
            let store = Arc::new(InMemoryWorkItemStore::new());
            let policy_repo: Arc<dyn PolicyRepository> = Arc::new(InMemoryPolicyRepository::new());
            let directory: Arc<dyn AgentDirectory> = Arc::new(InMemoryAgentDirectory::new());
            let work_items: Arc<dyn WorkItemRepository> = store.clone();
            let audit_log: Arc<dyn AssignmentLogRepository> = store;
            let business_hours: Arc<dyn BusinessHoursRepository> = Arc::new(
                InMemoryBusinessHoursRepository::new(config.business_hours.clone()),
            );
            Ok(AssignmentEngine::new(
                policy_repo,
                directory,
                work_items,
                audit_log,
                business_hours,
                clock,
            ))
        }
        StorageConfig::Postgres { url } => {
            info!("using postgres storage backend");
            let db = Database::new(url).await?;
            db.migrate().await?;
            let pool = db.get_pool().clone();
            Ok(AssignmentEngine::new(
                Arc::new(PostgresPolicyRepository::new(pool.clone())),
                Arc::new(PostgresAgentDirectory::new(pool.clone())),
                Arc::new(PostgresWorkItemRepository::new(pool.clone())),
                Arc::new(PostgresAssignmentLogRepository::new(pool.clone())),
                Arc::new(PostgresBusinessHoursRepository::new(pool)),
                clock,
            ))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
