use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_journal::JournalEntry;
use outpost_process::LiveProcess;
use outpost_scheduler::{SettlementSnapshot, WorkerStatus};
use outpost_settlement::{BuildingSummary, QueueSummary};

use crate::state::AppState;

const DEFAULT_EVENT_LIMIT: usize = 100;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/snapshot", get(get_snapshot))
        .route("/api/v1/queues", get(list_queues))
        .route("/api/v1/processes", get(list_processes))
        .route("/api/v1/buildings", get(list_buildings))
        .route("/api/v1/workers", get(list_workers))
        .route("/api/v1/workers/{worker_id}", get(get_worker))
        .route("/api/v1/events", get(list_events))
        .route("/api/v1/events/{subject_id}", get(subject_events))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    pulse: u64,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        pulse: state.snapshot.borrow().pulse,
    })
}

async fn get_snapshot(State(state): State<AppState>) -> Json<SettlementSnapshot> {
    Json(state.current())
}

async fn list_queues(State(state): State<AppState>) -> Json<Vec<QueueSummary>> {
    Json(state.snapshot.borrow().queues.clone())
}

async fn list_processes(State(state): State<AppState>) -> Json<Vec<LiveProcess>> {
    Json(state.snapshot.borrow().processes.clone())
}

async fn list_buildings(State(state): State<AppState>) -> Json<Vec<BuildingSummary>> {
    Json(state.snapshot.borrow().buildings.clone())
}

async fn list_workers(State(state): State<AppState>) -> Json<Vec<WorkerStatus>> {
    Json(state.snapshot.borrow().workers.clone())
}

async fn get_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<Uuid>,
) -> Result<Json<WorkerStatus>, StatusCode> {
    state
        .snapshot
        .borrow()
        .workers
        .iter()
        .find(|w| w.id == worker_id)
        .map(|w| Json(w.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct EventQuery {
    kind: Option<String>,
    limit: Option<usize>,
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Vec<JournalEntry>>, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    let entries = match query.kind {
        Some(kind) => {
            let mut entries = state.journal.query_by_kind(&kind).await;
            if let Ok(entries) = entries.as_mut() {
                let skip = entries.len().saturating_sub(limit);
                entries.drain(..skip);
            }
            entries
        }
        None => state.journal.recent(limit).await,
    }
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(entries))
}

async fn subject_events(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<Vec<JournalEntry>>, (StatusCode, String)> {
    let entries = state
        .journal
        .query_by_subject(subject_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if entries.is_empty() {
        return Err((StatusCode::NOT_FOUND, format!("no events for {subject_id}")));
    }
    Ok(Json(entries))
}
