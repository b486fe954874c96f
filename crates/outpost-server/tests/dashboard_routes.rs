use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use outpost_journal::{InMemoryJournal, Journal, JournalEntry};
use outpost_scheduler::{OutpostConfig, SettlementSnapshot};
use outpost_server::{AppState, demo::demo_simulation, router};
use outpost_types::EventBus;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

fn running_outpost() -> (AppState, watch::Sender<SettlementSnapshot>, Arc<InMemoryJournal>) {
    let config = OutpostConfig {
        accident_seed: Some(3),
        ..Default::default()
    };
    let mut sim = demo_simulation(&config, &EventBus::default());
    for _ in 0..3 {
        sim.pulse(config.pulse_millisols).unwrap();
    }
    let (tx, rx) = watch::channel(sim.snapshot());
    let journal = Arc::new(InMemoryJournal::new());
    (AppState::new(rx, journal.clone()), tx, journal)
}

#[tokio::test]
async fn test_health_reports_pulse() {
    let (state, _tx, _) = running_outpost();
    let (status, body) = get(router(state), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pulse"], 3);
}

#[tokio::test]
async fn test_snapshot_views() {
    let (state, _tx, _) = running_outpost();

    let (status, queues) = get(router(state.clone()), "/api/v1/queues").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queues.as_array().unwrap().len(), 2);

    let (status, processes) = get(router(state.clone()), "/api/v1/processes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!processes.as_array().unwrap().is_empty());

    let (_, buildings) = get(router(state.clone()), "/api/v1/buildings").await;
    assert_eq!(buildings.as_array().unwrap().len(), 4);

    let (status, workers) = get(router(state.clone()), "/api/v1/workers").await;
    assert_eq!(status, StatusCode::OK);
    let workers = workers.as_array().unwrap();
    assert_eq!(workers.len(), 6);

    let id = workers[0]["id"].as_str().unwrap();
    let (status, worker) = get(router(state), &format!("/api/v1/workers/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(worker["id"], id);
}

#[tokio::test]
async fn test_dashboard_follows_new_snapshots() {
    let (state, tx, _) = running_outpost();
    let mut next = state.current();
    next.pulse = 42;
    tx.send(next).unwrap();
    let (_, body) = get(router(state), "/api/v1/snapshot").await;
    assert_eq!(body["pulse"], 42);
}

#[tokio::test]
async fn test_unknown_worker_is_not_found() {
    let (state, _tx, _) = running_outpost();
    let uri = format!("/api/v1/workers/{}", uuid::Uuid::new_v4());
    let (status, _) = get(router(state), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_routes() {
    let (state, _tx, journal) = running_outpost();
    let subject = uuid::Uuid::new_v4();
    for kind in ["process_started", "process_ended", "task_ended"] {
        journal
            .append(JournalEntry::new(kind, subject, None, serde_json::json!({})))
            .await
            .unwrap();
    }
    journal
        .append(JournalEntry::new(
            "process_started",
            uuid::Uuid::new_v4(),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let (status, all) = get(router(state.clone()), "/api/v1/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 4);

    let (_, limited) = get(router(state.clone()), "/api/v1/events?limit=2").await;
    assert_eq!(limited.as_array().unwrap().len(), 2);

    let (_, started) = get(router(state.clone()), "/api/v1/events?kind=process_started").await;
    assert_eq!(started.as_array().unwrap().len(), 2);

    let (status, about) = get(router(state.clone()), &format!("/api/v1/events/{subject}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(about.as_array().unwrap().len(), 3);
    assert_eq!(about[0]["kind"], "process_started");

    let missing = format!("/api/v1/events/{}", uuid::Uuid::new_v4());
    let (status, _) = get(router(state), &missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
