use crate::model::{Actor, EventKind, StageKey, TimelineEvent};
use crate::time::EpochMs;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EtaError {
    #[error("eta minutes must be a positive integer, got {0}")]
    InvalidMinutes(i64),
}

/// Validate an agent-supplied ETA. Minutes arrive as i64 so callers that
/// parse loose input can surface the rejected value.
pub fn validate_eta_minutes(minutes: i64) -> Result<u32, EtaError> {
    if minutes <= 0 {
        return Err(EtaError::InvalidMinutes(minutes));
    }
    u32::try_from(minutes).map_err(|_| EtaError::InvalidMinutes(minutes))
}

/// Absolute countdown target for an ETA declared at `set_at_ms`.
pub fn eta_target_ms(set_at_ms: EpochMs, minutes: u32) -> EpochMs {
    set_at_ms + i64::from(minutes) * 60_000
}

/// Seconds remaining until `target_ms`, rounded up, floored at zero.
pub fn remaining_seconds(target_ms: EpochMs, now_ms: EpochMs) -> u64 {
    let diff = target_ms - now_ms;
    if diff <= 0 {
        0
    } else {
        (diff as u64).div_ceil(1000)
    }
}

/// Build the ETA timeline event. Carries the minutes so every reader derives
/// the same target from `at_ms + minutes`; the countdown itself is never
/// persisted.
pub fn eta_event(minutes: u32, actor: Actor, at_ms: EpochMs) -> TimelineEvent {
    let mut event = TimelineEvent::new(
        EventKind::Stage { stage: StageKey::Eta },
        Some(format!("ETA set: {minutes} min")),
        at_ms,
        actor,
    );
    event.eta_minutes = Some(minutes);
    event
}

/// Countdown target recorded in a timeline, if an ETA event is present. An
/// agent can re-declare the ETA; the most recent declaration wins.
pub fn eta_target_from_events(events: &[TimelineEvent]) -> Option<EpochMs> {
    events.iter().rev().find_map(|e| {
        let minutes = e.eta_minutes?;
        match e.kind {
            EventKind::Stage {
                stage: StageKey::Eta,
            } => Some(eta_target_ms(e.at_ms, minutes)),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_minutes() {
        assert_eq!(validate_eta_minutes(0), Err(EtaError::InvalidMinutes(0)));
        assert_eq!(validate_eta_minutes(-5), Err(EtaError::InvalidMinutes(-5)));
        assert_eq!(validate_eta_minutes(25), Ok(25));
    }

    #[test]
    fn target_is_now_plus_minutes() {
        assert_eq!(eta_target_ms(1_000_000, 25), 1_000_000 + 1_500_000);
    }

    #[test]
    fn remaining_rounds_up_and_floors_at_zero() {
        let target = 10_000;
        assert_eq!(remaining_seconds(target, 7_500), 3);
        assert_eq!(remaining_seconds(target, 9_999), 1);
        assert_eq!(remaining_seconds(target, 10_000), 0);
        assert_eq!(remaining_seconds(target, 12_000), 0);
    }

    #[test]
    fn remaining_decreases_monotonically() {
        let target = eta_target_ms(0, 2);
        let mut prev = remaining_seconds(target, 0);
        for now in (1_000..=130_000).step_by(1_000) {
            let r = remaining_seconds(target, now);
            assert!(r <= prev);
            prev = r;
        }
        assert_eq!(prev, 0);
    }

    #[test]
    fn eta_event_round_trips_target() {
        let ev = eta_event(25, Actor::Agent, 5_000);
        assert_eq!(ev.eta_minutes, Some(25));
        let target = eta_target_from_events(std::slice::from_ref(&ev)).unwrap();
        assert_eq!(target, 5_000 + 1_500_000);
    }

    #[test]
    fn redeclared_eta_supersedes_the_first() {
        let events = vec![
            eta_event(25, Actor::Agent, 5_000),
            eta_event(40, Actor::Agent, 90_000),
        ];
        let target = eta_target_from_events(&events).unwrap();
        assert_eq!(target, 90_000 + 40 * 60_000);
    }

    #[test]
    fn no_eta_event_means_no_target() {
        let ev = TimelineEvent::new(EventKind::Accepted, None, 0, Actor::User);
        assert_eq!(eta_target_from_events(&[ev]), None);
    }
}
