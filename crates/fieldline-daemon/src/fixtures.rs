use crate::store::TimelineStore;
use anyhow::Result;
use fieldline_core::eta::eta_event;
use fieldline_core::model::{Actor, EventKind, StageKey, TimelineEvent};
use fieldline_core::now_ms;
use tracing::info;

/// Seed canned timelines for mock mode, one per service type. Request ids
/// follow the shapes the mobile apps used for their fixtures.
pub fn seed(store: &dyn TimelineStore) -> Result<()> {
    let base = now_ms() - 30 * 60_000;

    // In-house visit mid-flight: accepted, ETA declared, visit under way.
    let r1 = "REQ-1001";
    append_stage(store, r1, StageKey::Accept, base)?;
    store.append(r1, eta_event(25, Actor::Agent, base + 60_000))?;
    append_stage(store, r1, StageKey::StartVisit, base + 10 * 60_000)?;

    // In-shop repair just accepted.
    let r2 = "REQ-1002";
    store.append(
        r2,
        TimelineEvent::new(
            EventKind::Accepted,
            Some("Request accepted".to_string()),
            base,
            Actor::User,
        ),
    )?;
    append_stage(store, r2, StageKey::Accept, base + 2 * 60_000)?;

    // PC build reassigned once, now in the build stage.
    let r3 = "REQ-1003";
    append_stage(store, r3, StageKey::Accept, base)?;
    store.append(
        r3,
        TimelineEvent::new(
            EventKind::Reassigned,
            Some("Reassigned to another technician".to_string()),
            base + 5 * 60_000,
            Actor::Admin,
        ),
    )?;
    append_stage(store, r3, StageKey::Build, base + 8 * 60_000)?;

    info!("seeded mock timelines for {r1}, {r2}, {r3}");
    Ok(())
}

fn append_stage(
    store: &dyn TimelineStore,
    request_id: &str,
    stage: StageKey,
    at_ms: i64,
) -> Result<()> {
    store.append(
        request_id,
        TimelineEvent::new(
            EventKind::Stage { stage },
            Some(stage.label().to_string()),
            at_ms,
            Actor::Agent,
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use fieldline_core::engine::RequestProgress;
    use fieldline_core::eta::eta_target_from_events;
    use fieldline_core::model::ServiceType;

    #[test]
    fn seeded_in_house_request_has_eta_and_visit() {
        let store = MemoryStore::new();
        seed(&store).unwrap();

        let events = store.events("REQ-1001").unwrap();
        assert!(eta_target_from_events(&events).is_some());

        let progress = RequestProgress::from_events(ServiceType::InHouse, &events);
        assert_eq!(progress.current_stage(), StageKey::StartVisit);
    }

    #[test]
    fn seeded_requests_exist() {
        let store = MemoryStore::new();
        seed(&store).unwrap();
        for id in ["REQ-1001", "REQ-1002", "REQ-1003"] {
            assert!(!store.events(id).unwrap().is_empty());
        }
    }
}
