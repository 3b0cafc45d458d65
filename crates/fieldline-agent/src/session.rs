use fieldline_core::checklist::checklist_for;
use fieldline_core::engine::{RequestProgress, Transition, TransitionError};
use fieldline_core::eta::{eta_event, validate_eta_minutes, EtaError};
use fieldline_core::flow::index_of;
use fieldline_core::model::{Actor, ServiceType, StageKey, TimelineEvent};
use fieldline_core::time::now_ms;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Eta(#[from] EtaError),
    #[error("no stage is awaiting confirmation")]
    NoPendingStage,
}

/// Outcome of asking for a stage transition: either it committed, or the
/// stage is gated and the operator must confirm a checklist first.
#[derive(Debug, PartialEq, Eq)]
pub enum StageRequest {
    Committed(Transition),
    NeedsConfirmation {
        stage: StageKey,
        options: &'static [&'static str],
    },
}

/// One agent's working view of a request: the reconstructed progress, the
/// locally known event log, and at most one stage awaiting checklist
/// confirmation. Committed events are mirrored into the local log and handed
/// back for delivery through the outbox.
pub struct Session {
    pub request_id: String,
    pub progress: RequestProgress,
    pub events: Vec<TimelineEvent>,
    pending: Option<StageKey>,
}

impl Session {
    /// Build a session from a fetched timeline. An unreachable backend reads
    /// as an empty log, which reconstructs to the start of the flow.
    pub fn load(request_id: impl Into<String>, service: ServiceType, events: Vec<TimelineEvent>) -> Self {
        let progress = RequestProgress::from_events(service, &events);
        Self {
            request_id: request_id.into(),
            progress,
            events,
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<StageKey> {
        self.pending
    }

    /// Ask to move to `stage`. Gated stages (Diagnosis, Install) defer the
    /// transition until [`confirm_pending`](Self::confirm_pending); nothing
    /// is recorded for them yet. Stages outside this service's flow are
    /// rejected up front, before any gate is shown.
    pub fn request_stage(&mut self, stage: StageKey, actor: Actor) -> Result<StageRequest, SessionError> {
        if let Some(checklist) = checklist_for(stage) {
            if index_of(self.progress.sequence(), stage).is_none() {
                return Err(TransitionError::NotApplicable {
                    stage,
                    service: self.progress.service,
                }
                .into());
            }
            self.pending = Some(stage);
            return Ok(StageRequest::NeedsConfirmation {
                stage,
                options: checklist.options,
            });
        }

        let transition = self.progress.apply_stage(stage, actor, now_ms())?;
        self.events.push(transition.event.clone());
        Ok(StageRequest::Committed(transition))
    }

    /// Commit the pending gated stage with the operator's selections. Clears
    /// the pending state whether or not validation passes the transition.
    pub fn confirm_pending(
        &mut self,
        selections: &[String],
        actor: Actor,
    ) -> Result<Transition, SessionError> {
        let stage = self.pending.take().ok_or(SessionError::NoPendingStage)?;
        let transition = self
            .progress
            .apply_stage_with(stage, selections, actor, now_ms())?;
        self.events.push(transition.event.clone());
        Ok(transition)
    }

    /// Discard the pending stage and any in-progress selections. No event is
    /// recorded.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Advance one step in the flow.
    pub fn advance(&mut self, actor: Actor) -> Transition {
        let transition = self.progress.advance(actor, now_ms());
        self.events.push(transition.event.clone());
        transition
    }

    /// Declare an ETA. Only valid for flows that have an Eta stage; the
    /// produced event carries the minutes so countdowns on both sides derive
    /// the same target.
    pub fn set_eta(&mut self, minutes: i64, actor: Actor) -> Result<TimelineEvent, SessionError> {
        if index_of(self.progress.sequence(), StageKey::Eta).is_none() {
            return Err(TransitionError::NotApplicable {
                stage: StageKey::Eta,
                service: self.progress.service,
            }
            .into());
        }
        let minutes = validate_eta_minutes(minutes)?;
        let event = eta_event(minutes, actor, now_ms());
        // Declaring an ETA is itself the Eta stage of the in-house flow.
        self.progress.mark_reached(StageKey::Eta)?;
        self.events.push(event.clone());
        Ok(event)
    }
}
