use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::journal::JournalEntry;
use crate::metrics::counters::CountersSnapshot;
use crate::state::OBSERVER_LOG_LINES;
use crate::state::types::{ControlOutcome, Snapshot};

const MAX_JOURNAL_ROWS: usize = 500;

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// `success`, `already_running` or `already_stopped`.
    pub status: &'static str,
    pub message: &'static str,
    pub agents_running: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub agents_running: bool,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ContractsConfigured {
    pub price_oracle: bool,
    pub attestation: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub contracts_configured: ContractsConfigured,
    pub rpc_url: String,
    pub counters: CountersSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    pub limit: Option<usize>,
}

pub async fn data(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.store.snapshot(Some(OBSERVER_LOG_LINES)))
}

pub async fn start_agents(State(state): State<Arc<AppState>>) -> Json<ControlResponse> {
    let outcome = state.store.start();
    Json(control_response(outcome, state.store.is_running()))
}

pub async fn stop_agents(State(state): State<Arc<AppState>>) -> Json<ControlResponse> {
    let outcome = state.store.stop();
    Json(control_response(outcome, state.store.is_running()))
}

pub async fn agents_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let running = state.store.is_running();
    Json(StatusResponse {
        agents_running: running,
        status: if running { "running" } else { "stopped" },
    })
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        contracts_configured: ContractsConfigured {
            price_oracle: state.health.price_oracle_configured,
            attestation: state.health.attestation_configured,
        },
        rpc_url: state.health.rpc_url.clone(),
        counters: state.counters.snapshot(),
    })
}

pub async fn journal(
    State(state): State<Arc<AppState>>,
    Query(q): Query<JournalQuery>,
) -> Result<Json<Vec<JournalEntry>>, (StatusCode, String)> {
    let limit = q.limit.unwrap_or(OBSERVER_LOG_LINES).min(MAX_JOURNAL_ROWS);

    state
        .journal
        .recent_decisions(limit)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(component = "api", error = ?e, "journal read failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

fn control_response(outcome: ControlOutcome, agents_running: bool) -> ControlResponse {
    let (status, message) = match outcome {
        ControlOutcome::Started => ("success", "Agents started"),
        ControlOutcome::AlreadyRunning => ("already_running", "Agents are already running"),
        ControlOutcome::Stopped => ("success", "Agents stopped"),
        ControlOutcome::AlreadyStopped => ("already_stopped", "Agents are already stopped"),
    };
    ControlResponse {
        status,
        message,
        agents_running,
    }
}
