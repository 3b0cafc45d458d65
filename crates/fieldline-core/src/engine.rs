use crate::checklist::{describe_selection, validate_selection, SelectionError};
use crate::flow::{advance, index_of, sequence_for};
use crate::model::{Actor, EventKind, ServiceType, StageKey, TimelineEvent};
use crate::time::EpochMs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested stage is not part of this service type's flow. The
    /// legacy behavior was a silent no-op; callers now have to handle it.
    #[error("stage {stage:?} is not part of the {service} flow")]
    NotApplicable { stage: StageKey, service: ServiceType },
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// A committed transition: the new position in the flow plus the event that
/// records it. Exactly one event per commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub index: usize,
    pub event: TimelineEvent,
}

/// Current position of a request within its service type's stage flow.
///
/// Pure value type: it never talks to the gateway. Callers apply transitions,
/// collect the produced events, and deliver them however they like.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestProgress {
    pub service: ServiceType,
    /// Always a valid index into `sequence_for(service)`; only transitions
    /// move it, so the bound holds by construction.
    current: usize,
}

impl RequestProgress {
    pub fn new(service: ServiceType) -> Self {
        Self { service, current: 0 }
    }

    /// Rebuild progress from an event log: the furthest flow stage recorded
    /// wins. Both apps reconstruct their view this way after a fetch.
    pub fn from_events(service: ServiceType, events: &[TimelineEvent]) -> Self {
        let seq = sequence_for(service);
        let current = events
            .iter()
            .filter_map(|e| e.stage())
            .filter_map(|stage| index_of(seq, stage))
            .max()
            .unwrap_or(0);
        Self { service, current }
    }

    pub fn sequence(&self) -> &'static [StageKey] {
        sequence_for(self.service)
    }

    /// Current position in the flow.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_stage(&self) -> StageKey {
        self.sequence()[self.current]
    }

    /// Move the pointer forward to `stage` without recording an event, for
    /// transitions whose event is produced elsewhere (the ETA declaration).
    /// Never moves backwards; rejects stages outside this flow.
    pub fn mark_reached(&mut self, stage: StageKey) -> Result<usize, TransitionError> {
        let Some(index) = index_of(self.sequence(), stage) else {
            return Err(TransitionError::NotApplicable {
                stage,
                service: self.service,
            });
        };
        self.current = self.current.max(index);
        Ok(self.current)
    }

    pub fn is_complete(&self) -> bool {
        self.current == self.sequence().len() - 1
    }

    /// Step to the next stage in the flow and record it. Saturates at the
    /// terminal stage; a commit at the terminal stage re-records Completed
    /// without moving the pointer.
    pub fn advance(&mut self, actor: Actor, at_ms: EpochMs) -> Transition {
        let seq = self.sequence();
        self.current = advance(self.current, seq);
        let stage = seq[self.current];
        let event = TimelineEvent::new(
            EventKind::Stage { stage },
            Some(stage.label().to_string()),
            at_ms,
            actor,
        );
        Transition {
            index: self.current,
            event,
        }
    }

    /// Jump to an explicitly requested stage (non-linear transitions such as
    /// the user-confirmed StartVisit). Rejects stages outside this flow
    /// without touching the pointer or producing an event.
    pub fn apply_stage(
        &mut self,
        stage: StageKey,
        actor: Actor,
        at_ms: EpochMs,
    ) -> Result<Transition, TransitionError> {
        self.apply_stage_with(stage, &[], actor, at_ms)
    }

    /// Like [`apply_stage`](Self::apply_stage) but records the operator's
    /// checklist selections in the event description. Used for the gated
    /// stages (Diagnosis, Install) after confirmation.
    pub fn apply_stage_with(
        &mut self,
        stage: StageKey,
        selections: &[String],
        actor: Actor,
        at_ms: EpochMs,
    ) -> Result<Transition, TransitionError> {
        let seq = self.sequence();
        let Some(index) = index_of(seq, stage) else {
            return Err(TransitionError::NotApplicable {
                stage,
                service: self.service,
            });
        };
        validate_selection(stage, selections)?;

        let description = match stage {
            StageKey::Diagnosis | StageKey::Install => describe_selection(stage, selections),
            _ => stage.label().to_string(),
        };

        self.current = index;
        let event = TimelineEvent::new(
            EventKind::Stage { stage },
            Some(description),
            at_ms,
            actor,
        );
        Ok(Transition { index, event })
    }
}

/// Derived display state of a stage relative to the current pointer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Done,
    Current,
    Pending,
}

/// Per-stage done/current/pending view of a flow, as rendered by the status
/// screens.
pub fn stage_states(progress: &RequestProgress) -> Vec<(StageKey, StageState)> {
    progress
        .sequence()
        .iter()
        .enumerate()
        .map(|(i, stage)| {
            let state = match i.cmp(&progress.current) {
                std::cmp::Ordering::Less => StageState::Done,
                std::cmp::Ordering::Equal => StageState::Current,
                std::cmp::Ordering::Greater => StageState::Pending,
            };
            (*stage, state)
        })
        .collect()
}
