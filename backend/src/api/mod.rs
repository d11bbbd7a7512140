//! Observer HTTP API for the dashboard and the operator CLI.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::journal::DecisionJournal;
use crate::metrics::counters::Counters;
use crate::state::StateStore;

/// Static facts reported by `/api/health`.
#[derive(Clone, Debug)]
pub struct HealthInfo {
    pub rpc_url: String,
    pub price_oracle_configured: bool,
    pub attestation_configured: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub store: StateStore,
    pub counters: Counters,
    pub journal: Arc<dyn DecisionJournal>,
    pub health: HealthInfo,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", get(handlers::data))
        .route("/api/agents/start", post(handlers::start_agents))
        .route("/api/agents/stop", post(handlers::stop_agents))
        .route("/api/agents/status", get(handlers::agents_status))
        .route("/api/health", get(handlers::health))
        .route("/api/journal", get(handlers::journal))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
