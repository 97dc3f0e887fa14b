// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API surface.
//!
//! Thin axum handlers over the engine and repositories. Responses
//! distinguish not-found, validation, store, and internal failures via
//! status codes; bodies are `{"error": ...}` JSON on failure.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::application::{AssignmentEngine, EngineError};
use crate::domain::agent::{Agent, AgentId, AgentOverridePatch};
use crate::domain::policy::{AssignmentPolicy, PolicyPatch, PriorityOrder};
use crate::domain::repository::RepositoryError;
use crate::domain::work_item::Channel;

pub struct AppState {
    pub engine: Arc<AssignmentEngine>,
}

pub fn app(engine: Arc<AssignmentEngine>) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        .route("/health", get(health))
        .route("/api/policy", get(get_policy).post(create_policy).patch(patch_policy))
        .route("/api/cycles/run", post(run_cycle))
        .route("/api/assignments", get(assignment_history))
        .route("/api/agents", get(list_agents))
        .route(
            "/api/agents/{id}/overrides",
            get(get_overrides).patch(patch_overrides),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self(EngineError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::ConfigurationMissing => StatusCode::NOT_FOUND,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Store(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            EngineError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_policy(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AssignmentPolicy>, ApiError> {
    let policy = state
        .engine
        .policy_repo()
        .find()
        .await?
        .ok_or(EngineError::ConfigurationMissing)?;
    Ok(Json(policy))
}

#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    pub channels: BTreeSet<Channel>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub max_assigned_tickets: Option<i32>,
    #[serde(default)]
    pub refill_threshold: Option<i32>,
    #[serde(default)]
    pub priority_order: Option<PriorityOrder>,
    #[serde(default)]
    pub business_hours_only: Option<bool>,
}

/// Bootstrap (or replace) the singleton policy. Unspecified fields take
/// the built-in defaults.
async fn create_policy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<AssignmentPolicy>), ApiError> {
    let repo = state.engine.policy_repo();

    let base = AssignmentPolicy::new(req.channels);
    let mut policy = base
        .apply_patch(PolicyPatch {
            enabled: req.enabled,
            max_assigned_tickets: req.max_assigned_tickets,
            refill_threshold: req.refill_threshold,
            priority_order: req.priority_order,
            channels: None,
            business_hours_only: req.business_hours_only,
        })
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    policy.version = match repo.find().await? {
        Some(existing) => existing.version + 1,
        None => 1,
    };
    repo.save(&policy).await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

async fn patch_policy(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<PolicyPatch>,
) -> Result<Json<AssignmentPolicy>, ApiError> {
    let repo = state.engine.policy_repo();
    let current = repo.find().await?.ok_or(EngineError::ConfigurationMissing)?;
    let next = current
        .apply_patch(patch)
        .map_err(|e| EngineError::Validation(e.to_string()))?;
    repo.save(&next).await?;
    Ok(Json(next))
}

async fn run_cycle(
    State(state): State<Arc<AppState>>,
) -> Result<Json<crate::application::CycleOutcome>, ApiError> {
    let outcome = state.engine.run_cycle().await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

const HISTORY_MAX_PAGE: usize = 200;

async fn assignment_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query.limit.unwrap_or(50).min(HISTORY_MAX_PAGE);
    let offset = query.offset.unwrap_or(0);
    let records = state.engine.audit_log().find_recent(limit, offset).await?;
    Ok(Json(json!({ "records": records, "limit": limit, "offset": offset })))
}

#[derive(Debug, Serialize)]
struct AgentView {
    #[serde(flatten)]
    agent: Agent,
    current_load: i32,
}

async fn list_agents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AgentView>>, ApiError> {
    let agents = state.engine.directory().list_agents().await?;
    let loads = state.engine.work_items().count_open_by_agent().await?;
    let views = agents
        .into_iter()
        .map(|agent| {
            let current_load = loads.get(&agent.id).copied().unwrap_or(0);
            AgentView { agent, current_load }
        })
        .collect();
    Ok(Json(views))
}

#[derive(Debug, Serialize)]
struct OverridesView {
    auto_assign_enabled: bool,
    auto_assign_max: Option<i32>,
    auto_assign_channels: Option<BTreeSet<Channel>>,
}

impl From<&Agent> for OverridesView {
    fn from(agent: &Agent) -> Self {
        Self {
            auto_assign_enabled: agent.auto_assign_enabled,
            auto_assign_max: agent.auto_assign_max,
            auto_assign_channels: agent.auto_assign_channels.clone(),
        }
    }
}

async fn get_overrides(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OverridesView>, ApiError> {
    let agent_id = parse_agent_id(&id)?;
    let agent = state
        .engine
        .directory()
        .find_agent(agent_id)
        .await?
        .ok_or_else(|| EngineError::Store(RepositoryError::NotFound(format!("Agent {id}"))))?;
    Ok(Json(OverridesView::from(&agent)))
}

async fn patch_overrides(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<AgentOverridePatch>,
) -> Result<Json<OverridesView>, ApiError> {
    let agent_id = parse_agent_id(&id)?;
    if let Some(Some(max)) = patch.auto_assign_max {
        if max < 1 {
            return Err(EngineError::Validation(format!(
                "auto_assign_max must be at least 1, got {max}"
            ))
            .into());
        }
    }
    let agent = state
        .engine
        .directory()
        .update_overrides(agent_id, patch)
        .await?;
    Ok(Json(OverridesView::from(&agent)))
}

fn parse_agent_id(raw: &str) -> Result<AgentId, ApiError> {
    AgentId::from_string(raw)
        .map_err(|_| EngineError::Validation(format!("Invalid agent id: {raw}")).into())
}
