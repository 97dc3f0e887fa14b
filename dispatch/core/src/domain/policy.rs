// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Assignment policy: the singleton configuration governing the engine.
//!
//! The policy is stored externally and read fresh at the start of every
//! cycle — it is an explicit, versioned value passed through every call,
//! never a cached singleton.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::work_item::Channel;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("max_assigned_tickets must be at least 1, got {0}")]
    InvalidMax(i32),

    #[error("refill_threshold must be between 0 and max_assigned_tickets ({max}), got {threshold}")]
    InvalidThreshold { threshold: i32, max: i32 },

    #[error("channels must not be empty")]
    EmptyChannels,
}

/// How the work queue is ordered within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrder {
    PriorityFirst,
    OldestFirst,
    NewestFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPolicy {
    pub enabled: bool,
    pub max_assigned_tickets: i32,
    /// Load level below which an agent is preferentially topped up ahead
    /// of agents merely under their cap.
    pub refill_threshold: i32,
    pub priority_order: PriorityOrder,
    pub channels: BTreeSet<Channel>,
    pub business_hours_only: bool,
    /// Bumped on every update; cycles log the version they ran against.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentPolicy {
    pub fn new(channels: BTreeSet<Channel>) -> Self {
        Self {
            enabled: true,
            max_assigned_tickets: 5,
            refill_threshold: 2,
            priority_order: PriorityOrder::PriorityFirst,
            channels,
            business_hours_only: false,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// Bounds validation, enforced at the API boundary. The numeric fields
    /// carry no meaning outside these ranges.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_assigned_tickets < 1 {
            return Err(PolicyError::InvalidMax(self.max_assigned_tickets));
        }
        if self.refill_threshold < 0 || self.refill_threshold > self.max_assigned_tickets {
            return Err(PolicyError::InvalidThreshold {
                threshold: self.refill_threshold,
                max: self.max_assigned_tickets,
            });
        }
        if self.channels.is_empty() {
            return Err(PolicyError::EmptyChannels);
        }
        Ok(())
    }

    /// Apply a partial update, touching only the fields present in the
    /// patch. The result is validated as a whole before being returned.
    pub fn apply_patch(&self, patch: PolicyPatch) -> Result<AssignmentPolicy, PolicyError> {
        let mut next = self.clone();
        if let Some(enabled) = patch.enabled {
            next.enabled = enabled;
        }
        if let Some(max) = patch.max_assigned_tickets {
            next.max_assigned_tickets = max;
        }
        if let Some(threshold) = patch.refill_threshold {
            next.refill_threshold = threshold;
        }
        if let Some(order) = patch.priority_order {
            next.priority_order = order;
        }
        if let Some(channels) = patch.channels {
            next.channels = channels;
        }
        if let Some(gated) = patch.business_hours_only {
            next.business_hours_only = gated;
        }
        next.validate()?;
        next.version = self.version + 1;
        next.updated_at = Utc::now();
        Ok(next)
    }
}

/// Partial policy update: only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_assigned_tickets: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refill_threshold: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_order: Option<PriorityOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<BTreeSet<Channel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hours_only: Option<bool>,
}
