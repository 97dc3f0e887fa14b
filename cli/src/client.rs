// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for communicating with a running dispatch service.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use dispatch_core::application::CycleOutcome;
use dispatch_core::domain::assignment::AssignmentRecord;
use dispatch_core::domain::policy::{AssignmentPolicy, PolicyPatch};

#[derive(Debug, Clone)]
pub struct DispatchClient {
    client: Client,
    base_url: String,
}

impl DispatchClient {
    pub fn new(port: u16) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("http://localhost:{}", port),
        })
    }

    pub async fn get_policy(&self) -> Result<AssignmentPolicy> {
        let response = self
            .client
            .get(format!("{}/api/policy", self.base_url))
            .send()
            .await
            .context("Failed to fetch policy")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("No assignment policy configured yet (run `dispatch policy init`)");
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch policy: {}", error_text);
        }

        response.json().await.context("Failed to parse policy response")
    }

    pub async fn create_policy(&self, body: serde_json::Value) -> Result<AssignmentPolicy> {
        let response = self
            .client
            .post(format!("{}/api/policy", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Failed to create policy")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to create policy: {}", error_text);
        }

        response.json().await.context("Failed to parse policy response")
    }

    pub async fn patch_policy(&self, patch: PolicyPatch) -> Result<AssignmentPolicy> {
        let response = self
            .client
            .patch(format!("{}/api/policy", self.base_url))
            .json(&patch)
            .send()
            .await
            .context("Failed to update policy")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to update policy: {}", error_text);
        }

        response.json().await.context("Failed to parse policy response")
    }

    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let response = self
            .client
            .post(format!("{}/api/cycles/run", self.base_url))
            .send()
            .await
            .context("Failed to trigger assignment cycle")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to trigger assignment cycle: {}", error_text);
        }

        response.json().await.context("Failed to parse cycle response")
    }

    pub async fn history(&self, limit: usize, offset: usize) -> Result<Vec<AssignmentRecord>> {
        #[derive(Deserialize)]
        struct HistoryResponse {
            records: Vec<AssignmentRecord>,
        }

        let response = self
            .client
            .get(format!(
                "{}/api/assignments?limit={}&offset={}",
                self.base_url, limit, offset
            ))
            .send()
            .await
            .context("Failed to fetch assignment history")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch assignment history: {}", error_text);
        }

        let history: HistoryResponse = response
            .json()
            .await
            .context("Failed to parse history response")?;
        Ok(history.records)
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentRow>> {
        let response = self
            .client
            .get(format!("{}/api/agents", self.base_url))
            .send()
            .await
            .context("Failed to list agents")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to list agents: {}", error_text);
        }

        response.json().await.context("Failed to parse agents response")
    }

    pub async fn get_overrides(&self, agent_id: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/api/agents/{}/overrides", self.base_url, agent_id))
            .send()
            .await
            .context("Failed to fetch agent overrides")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch agent overrides: {}", error_text);
        }

        response.json().await.context("Failed to parse overrides response")
    }

    pub async fn patch_overrides(
        &self,
        agent_id: &str,
        patch: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self
            .client
            .patch(format!("{}/api/agents/{}/overrides", self.base_url, agent_id))
            .json(&patch)
            .send()
            .await
            .context("Failed to update agent overrides")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to update agent overrides: {}", error_text);
        }

        response.json().await.context("Failed to parse overrides response")
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub availability: String,
    pub auto_assign_enabled: bool,
    pub auto_assign_max: Option<i32>,
    pub auto_assign_channels: Option<Vec<String>>,
    pub current_load: i32,
}
