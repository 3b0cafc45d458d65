use crate::model::TimelineEvent;
use crate::time::EpochMs;
use serde::{Deserialize, Serialize};

/// Timeline read response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineResponse {
    pub events: Vec<TimelineEvent>,
    /// Server time for client-side skew detection.
    pub server_now_ms: EpochMs,
}

/// Timeline append request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendEventRequest {
    pub event: TimelineEvent,
}

/// Timeline append response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendEventResponse {
    pub ok: bool,
    /// True if the event id was already recorded; retried appends land here.
    #[serde(default)]
    pub duplicate: bool,
    pub server_now_ms: EpochMs,
}
