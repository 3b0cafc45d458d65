use fieldline_core::model::{RequestId, TimelineEvent};
use std::collections::HashMap;
use std::sync::Mutex;

/// Whether an append landed or was already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Same event id seen before. Client retries are expected to hit this.
    Duplicate,
}

/// Per-request event logs. A timeline exists implicitly from its first
/// append; there is no creation or deletion.
pub trait TimelineStore: Send + Sync {
    fn events(&self, request_id: &str) -> anyhow::Result<Vec<TimelineEvent>>;
    fn append(&self, request_id: &str, event: TimelineEvent) -> anyhow::Result<AppendOutcome>;
}

/// In-memory store. Not durable; good enough for the daemon's single-process
/// lifetime and for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<RequestId, Vec<TimelineEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimelineStore for MemoryStore {
    fn events(&self, request_id: &str) -> anyhow::Result<Vec<TimelineEvent>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.get(request_id).cloned().unwrap_or_default())
    }

    fn append(&self, request_id: &str, mut event: TimelineEvent) -> anyhow::Result<AppendOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let log = inner.entry(request_id.to_string()).or_default();
        if log.iter().any(|e| e.id == event.id) {
            return Ok(AppendOutcome::Duplicate);
        }
        // Keep timestamps non-decreasing in append order; the log's order is
        // authoritative, clock skew between writers is not.
        if let Some(last) = log.last() {
            event.at_ms = event.at_ms.max(last.at_ms);
        }
        log.push(event);
        Ok(AppendOutcome::Appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldline_core::model::{Actor, EventKind, StageKey};

    fn stage_event(stage: StageKey, at_ms: i64) -> TimelineEvent {
        TimelineEvent::new(EventKind::Stage { stage }, None, at_ms, Actor::Agent)
    }

    #[test]
    fn missing_request_reads_as_empty() {
        let store = MemoryStore::new();
        assert!(store.events("R-404").unwrap().is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let store = MemoryStore::new();
        store.append("R1", stage_event(StageKey::Accept, 1)).unwrap();
        store.append("R1", stage_event(StageKey::Diagnosis, 2)).unwrap();
        store.append("R1", stage_event(StageKey::Repair, 3)).unwrap();

        let events = store.events("R1").unwrap();
        let stages: Vec<_> = events.iter().filter_map(|e| e.stage()).collect();
        assert_eq!(stages, vec![StageKey::Accept, StageKey::Diagnosis, StageKey::Repair]);
    }

    #[test]
    fn duplicate_event_id_is_dropped() {
        let store = MemoryStore::new();
        let ev = stage_event(StageKey::Accept, 1);
        assert_eq!(store.append("R1", ev.clone()).unwrap(), AppendOutcome::Appended);
        assert_eq!(store.append("R1", ev).unwrap(), AppendOutcome::Duplicate);
        assert_eq!(store.events("R1").unwrap().len(), 1);
    }

    #[test]
    fn timestamps_are_clamped_non_decreasing() {
        let store = MemoryStore::new();
        store.append("R1", stage_event(StageKey::Accept, 5_000)).unwrap();
        // Writer with a lagging clock.
        store.append("R1", stage_event(StageKey::Diagnosis, 3_000)).unwrap();

        let events = store.events("R1").unwrap();
        assert_eq!(events[1].at_ms, 5_000);
    }

    #[test]
    fn requests_are_isolated() {
        let store = MemoryStore::new();
        store.append("R1", stage_event(StageKey::Accept, 1)).unwrap();
        store.append("R2", stage_event(StageKey::Accept, 1)).unwrap();
        assert_eq!(store.events("R1").unwrap().len(), 1);
        assert_eq!(store.events("R2").unwrap().len(), 1);
    }
}
