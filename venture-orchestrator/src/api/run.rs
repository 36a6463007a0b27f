//! Run API Handlers
//!
//! HTTP endpoints for the analysis run lifecycle: submission, inspection,
//! progress streaming, and artifact download.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use serde::Deserialize;
use uuid::Uuid;
use venture_core::domain::dossier::Dossier;
use venture_core::dto::{CreateRun, CreateRunResponse, RunList};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

// =============================================================================
// Run Lifecycle Endpoints
// =============================================================================

/// POST /runs
/// Create a run and start the analysis workflow in the background
pub async fn create_run(
    State(state): State<AppState>,
    Json(req): Json<CreateRun>,
) -> ApiResult<(StatusCode, Json<CreateRunResponse>)> {
    let idea = req.idea.trim().to_string();
    if idea.is_empty() {
        return Err(ApiError::BadRequest("idea cannot be empty".to_string()));
    }

    let run_id = state.store.generate_run_id();
    tracing::info!("Creating run {} for new idea", run_id);

    let dossier = Dossier::new(run_id, idea.clone());
    state.store.save_dossier(&dossier).await?;

    state.orchestrator.spawn_run(run_id, idea).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateRunResponse {
            run_id,
            status: dossier.status,
        }),
    ))
}

/// GET /runs/{id}
/// Get the full dossier for a run
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Dossier>> {
    tracing::debug!("Getting run: {}", id);

    let dossier = state
        .store
        .get_dossier(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Run {} not found", id)))?;

    Ok(Json(dossier))
}

/// GET /runs
/// List recent runs, most recent first
pub async fn list_runs(
    State(state): State<AppState>,
    Query(params): Query<ListRunsQuery>,
) -> ApiResult<Json<RunList>> {
    let limit = clamp_limit(params.limit);
    tracing::debug!("Listing runs (limit {})", limit);

    let runs = state.store.list_runs(limit).await?;
    Ok(Json(RunList { runs }))
}

#[derive(Debug, Deserialize)]
pub struct ListRunsQuery {
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

// =============================================================================
// Progress Stream
// =============================================================================

/// GET /runs/{id}/events
/// Server-sent event stream of run progress
///
/// Emits `update` events as persisted state changes, then exactly one
/// `complete` (or `error`) event before the stream closes. A missing run
/// yields a single `error` event rather than a 404 so EventSource clients
/// see a payload.
pub async fn run_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("Opening event stream for run: {}", id);

    let mut rx = state.notifier.subscribe(id);
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let last = event.is_terminal();
            yield Ok(Event::default().event(event.name()).data(event.payload()));
            if last {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// =============================================================================
// Artifact Endpoints
// =============================================================================

/// GET /runs/{id}/artifacts/{name}
/// Download a derived artifact (e.g. report.md)
pub async fn get_artifact(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
) -> ApiResult<impl IntoResponse> {
    tracing::debug!("Fetching artifact {} for run: {}", name, id);

    let bytes = state.store.get_artifact(id, &name).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&name).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        bytes,
    ))
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".md") {
        "text/markdown; charset=utf-8"
    } else if name.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(clamp_limit(Some(5)), 5);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_LIST_LIMIT);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("report.md"), "text/markdown; charset=utf-8");
        assert_eq!(content_type_for("dossier.json"), "application/json");
        assert_eq!(content_type_for("raw.bin"), "application/octet-stream");
    }
}
