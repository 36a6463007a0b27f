//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod run;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::storage::DossierStore;
use crate::workflow::Orchestrator;
use crate::workflow::notifier::ProgressNotifier;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DossierStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub notifier: Arc<ProgressNotifier>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Run endpoints
        .route("/runs", post(run::create_run))
        .route("/runs", get(run::list_runs))
        .route("/runs/{id}", get(run::get_run))
        .route("/runs/{id}/events", get(run::run_events))
        .route("/runs/{id}/artifacts/{name}", get(run::get_artifact))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
