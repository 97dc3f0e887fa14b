// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service configuration (`dispatch-config.yaml`).
//!
//! Discovery order: explicit `--config` path, then `DISPATCH_CONFIG_PATH`,
//! then `./dispatch-config.yaml`, else built-in defaults. The business
//! hours section seeds the in-memory schedule; with the postgres backend
//! the `business_hours` table is authoritative.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::schedule::WeeklySchedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
    pub business_hours: WeeklySchedule,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::InMemory,
            scheduler: SchedulerConfig::default(),
            business_hours: WeeklySchedule::weekdays_nine_to_five(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8460,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    InMemory,
    Postgres { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval between automatic assignment cycles. Zero disables the
    /// scheduler; cycles then run only on manual trigger.
    pub cycle_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_seconds: 60,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Discover and load the configuration, falling back to defaults when
    /// no file is found.
    pub fn load_or_default(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(&path);
        }
        if let Ok(path) = std::env::var("DISPATCH_CONFIG_PATH") {
            return Self::load(Path::new(&path));
        }
        let local = Path::new("./dispatch-config.yaml");
        if local.exists() {
            return Self::load(local);
        }
        Ok(Self::default())
    }
}
