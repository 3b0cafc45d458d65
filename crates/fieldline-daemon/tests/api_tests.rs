//! Handler-level tests against an in-memory store.

use axum::extract::{Path, State};
use axum::Json;
use fieldline_core::api::AppendEventRequest;
use fieldline_core::model::{Actor, EventKind, StageKey, TimelineEvent};
use fieldline_daemon::api::{append_event, get_timeline, AppState};
use fieldline_daemon::config::DaemonConfig;
use fieldline_daemon::store::MemoryStore;
use std::sync::Arc;

fn test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        DaemonConfig {
            listen: "127.0.0.1:0".into(),
            mock: false,
        },
    )
}

fn stage_event(stage: StageKey) -> TimelineEvent {
    TimelineEvent::new(
        EventKind::Stage { stage },
        Some(stage.label().to_string()),
        1_000,
        Actor::Agent,
    )
}

#[tokio::test]
async fn empty_timeline_reads_as_no_events() {
    let state = test_state();
    let Json(resp) = get_timeline(State(state), Path("R-404".to_string()))
        .await
        .unwrap();
    assert!(resp.events.is_empty());
    assert!(resp.server_now_ms > 0);
}

#[tokio::test]
async fn append_then_read_round_trips() {
    let state = test_state();
    let event = stage_event(StageKey::Accept);

    let Json(resp) = append_event(
        State(state.clone()),
        Path("R1".to_string()),
        Json(AppendEventRequest {
            event: event.clone(),
        }),
    )
    .await
    .unwrap();
    assert!(resp.ok);
    assert!(!resp.duplicate);

    let Json(timeline) = get_timeline(State(state), Path("R1".to_string()))
        .await
        .unwrap();
    assert_eq!(timeline.events.len(), 1);
    assert_eq!(timeline.events[0].id, event.id);
}

#[tokio::test]
async fn retried_append_reports_duplicate() {
    let state = test_state();
    let event = stage_event(StageKey::Accept);

    let req = AppendEventRequest { event };
    let Json(first) = append_event(
        State(state.clone()),
        Path("R1".to_string()),
        Json(req.clone()),
    )
    .await
    .unwrap();
    assert!(!first.duplicate);

    let Json(second) = append_event(State(state.clone()), Path("R1".to_string()), Json(req))
        .await
        .unwrap();
    assert!(second.ok);
    assert!(second.duplicate);

    let Json(timeline) = get_timeline(State(state), Path("R1".to_string()))
        .await
        .unwrap();
    assert_eq!(timeline.events.len(), 1);
}
