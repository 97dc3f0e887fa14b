// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent aggregate.
//!
//! Agents are created and retired outside this engine; the engine reads
//! them, filters them by availability and per-agent auto-assign overrides,
//! and only ever increases their load indirectly by assigning work items.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::work_item::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Presence state as reported by the staff directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Online,
    Away,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub availability: Availability,

    /// Opt-out switch for auto-assignment. Absent means opted in.
    #[serde(default = "default_true")]
    pub auto_assign_enabled: bool,

    /// Per-agent cap overriding `AssignmentPolicy::max_assigned_tickets`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_assign_max: Option<i32>,

    /// Per-agent channel set overriding the policy default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_assign_channels: Option<BTreeSet<Channel>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Agent {
    pub fn new(name: impl Into<String>, availability: Availability) -> Self {
        let now = Utc::now();
        Self {
            id: AgentId::new(),
            name: name.into(),
            availability,
            auto_assign_enabled: true,
            auto_assign_max: None,
            auto_assign_channels: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Cap that actually applies to this agent. The per-agent override can
    /// only tighten the policy-wide maximum, never raise it.
    pub fn effective_max(&self, policy_max: i32) -> i32 {
        self.auto_assign_max
            .map_or(policy_max, |max| max.min(policy_max))
    }

    /// Whether this agent handles `channel`, honoring the per-agent
    /// override when present.
    pub fn handles_channel(&self, channel: &Channel, policy_channels: &BTreeSet<Channel>) -> bool {
        match &self.auto_assign_channels {
            Some(channels) => channels.contains(channel),
            None => policy_channels.contains(channel),
        }
    }

    pub fn apply_overrides(&mut self, patch: AgentOverridePatch) {
        if let Some(enabled) = patch.auto_assign_enabled {
            self.auto_assign_enabled = enabled;
        }
        if let Some(max) = patch.auto_assign_max {
            self.auto_assign_max = max;
        }
        if let Some(channels) = patch.auto_assign_channels {
            self.auto_assign_channels = channels;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update for the three per-agent override fields.
/// Outer `Option` = field absent from the request; inner `Option`/value is
/// the new state, `None` clearing an override back to the policy default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOverridePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_assign_enabled: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_assign_max: Option<Option<i32>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_assign_channels: Option<Option<BTreeSet<Channel>>>,
}

/// Distinguishes an absent field (no change) from an explicit `null`
/// (clear the override).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
