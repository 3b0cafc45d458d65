use crate::config::DaemonConfig;
use crate::store::{AppendOutcome, TimelineStore};
use axum::extract::{Path, State};
use axum::Json;
use fieldline_core::api::{AppendEventRequest, AppendEventResponse, TimelineResponse};
use fieldline_core::now_ms;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TimelineStore>,
    pub config: DaemonConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn TimelineStore>, config: DaemonConfig) -> Self {
        Self { store, config }
    }
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<Json<TimelineResponse>, axum::http::StatusCode> {
    let events = state.store.events(&request_id).map_err(|e| {
        warn!("timeline read for {request_id} failed: {e:?}");
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(TimelineResponse {
        events,
        server_now_ms: now_ms(),
    }))
}

pub async fn append_event(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(req): Json<AppendEventRequest>,
) -> Result<Json<AppendEventResponse>, axum::http::StatusCode> {
    let event_id = req.event.id.clone();
    let outcome = state.store.append(&request_id, req.event).map_err(|e| {
        warn!("timeline append for {request_id} failed: {e:?}");
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let duplicate = outcome == AppendOutcome::Duplicate;
    if duplicate {
        info!("duplicate append for {request_id} event {event_id}");
    }

    Ok(Json(AppendEventResponse {
        ok: true,
        duplicate,
        server_now_ms: now_ms(),
    }))
}
