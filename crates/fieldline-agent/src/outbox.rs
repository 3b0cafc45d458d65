use crate::gateway::TimelineGateway;
use fieldline_core::backoff::append_backoff_ms;
use fieldline_core::model::TimelineEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::warn;

/// How many delivery attempts before an append is declared dead.
const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
struct PendingAppend {
    request_id: String,
    event: TimelineEvent,
}

/// Delivery summary returned when the outbox is closed. `dead` holds appends
/// that exhausted their retries; callers surface these instead of pretending
/// the history was written.
#[derive(Debug, Default)]
pub struct OutboxReport {
    pub delivered: usize,
    pub dead: Vec<(String, TimelineEvent)>,
}

impl OutboxReport {
    pub fn all_delivered(&self) -> bool {
        self.dead.is_empty()
    }
}

/// Serialized append queue. A single worker drains enqueued events in order,
/// so the timeline's append order matches the order transitions were
/// confirmed, and retries with backoff on transport failure. The daemon
/// dedupes by event id, so at-least-once delivery is safe.
pub struct Outbox {
    tx: mpsc::UnboundedSender<PendingAppend>,
    handle: JoinHandle<OutboxReport>,
}

impl Outbox {
    pub fn spawn<G: TimelineGateway>(gateway: G) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PendingAppend>();

        let handle = tokio::spawn(async move {
            let mut report = OutboxReport::default();
            while let Some(pending) = rx.recv().await {
                if deliver(&gateway, &pending).await {
                    report.delivered += 1;
                } else {
                    report.dead.push((pending.request_id, pending.event));
                }
            }
            report
        });

        Self { tx, handle }
    }

    /// Queue one append. The transition is already committed locally; the
    /// worker owns getting it to the daemon.
    pub fn enqueue(&self, request_id: &str, event: TimelineEvent) {
        let _ = self.tx.send(PendingAppend {
            request_id: request_id.to_string(),
            event,
        });
    }

    /// Drain the queue and stop the worker, reporting what made it through.
    pub async fn close(self) -> OutboxReport {
        drop(self.tx);
        self.handle.await.unwrap_or_default()
    }
}

async fn deliver<G: TimelineGateway>(gateway: &G, pending: &PendingAppend) -> bool {
    for attempt in 1..=MAX_ATTEMPTS {
        let backoff = append_backoff_ms(attempt);
        if backoff > 0 {
            sleep(Duration::from_millis(backoff)).await;
        }
        match gateway.append_event(&pending.request_id, &pending.event).await {
            Ok(()) => return true,
            Err(e) => {
                warn!(
                    "append for {} attempt {attempt}/{MAX_ATTEMPTS} failed: {e}",
                    pending.request_id
                );
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::TransportError;
    use fieldline_core::model::{Actor, EventKind, StageKey};
    use std::sync::{Arc, Mutex};

    /// Gateway that fails the first `failures` appends, then records the rest.
    #[derive(Clone, Default)]
    struct FlakyGateway {
        failures: Arc<Mutex<u32>>,
        delivered: Arc<Mutex<Vec<(String, TimelineEvent)>>>,
    }

    impl FlakyGateway {
        fn failing(n: u32) -> Self {
            Self {
                failures: Arc::new(Mutex::new(n)),
                delivered: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl TimelineGateway for FlakyGateway {
        async fn get_events(&self, _: &str) -> Result<Vec<TimelineEvent>, TransportError> {
            Ok(vec![])
        }

        async fn append_event(
            &self,
            request_id: &str,
            event: &TimelineEvent,
        ) -> Result<(), TransportError> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(TransportError::Rejected {
                    request_id: request_id.to_string(),
                });
            }
            drop(failures);
            self.delivered
                .lock()
                .unwrap()
                .push((request_id.to_string(), event.clone()));
            Ok(())
        }
    }

    fn stage_event(stage: StageKey) -> TimelineEvent {
        TimelineEvent::new(EventKind::Stage { stage }, None, 0, Actor::Agent)
    }

    #[tokio::test]
    async fn delivers_in_enqueue_order() {
        let gateway = FlakyGateway::failing(0);
        let delivered = gateway.delivered.clone();
        let outbox = Outbox::spawn(gateway);

        outbox.enqueue("R1", stage_event(StageKey::Accept));
        outbox.enqueue("R1", stage_event(StageKey::Diagnosis));
        outbox.enqueue("R1", stage_event(StageKey::Repair));
        let report = outbox.close().await;

        assert_eq!(report.delivered, 3);
        assert!(report.all_delivered());
        let stages: Vec<_> = delivered
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, e)| e.stage())
            .collect();
        assert_eq!(stages, vec![StageKey::Accept, StageKey::Diagnosis, StageKey::Repair]);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failure() {
        let gateway = FlakyGateway::failing(2);
        let delivered = gateway.delivered.clone();
        let outbox = Outbox::spawn(gateway);

        outbox.enqueue("R1", stage_event(StageKey::Accept));
        let report = outbox.close().await;

        assert_eq!(report.delivered, 1);
        assert_eq!(delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_dead_appends_after_max_attempts() {
        let gateway = FlakyGateway::failing(u32::MAX);
        let outbox = Outbox::spawn(gateway);

        outbox.enqueue("R1", stage_event(StageKey::Accept));
        let report = outbox.close().await;

        assert_eq!(report.delivered, 0);
        assert_eq!(report.dead.len(), 1);
        assert_eq!(report.dead[0].0, "R1");
    }
}
