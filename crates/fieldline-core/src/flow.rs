use crate::model::{ServiceType, StageKey};

/// Fixed stage sequence for in-house visits.
pub const IN_HOUSE_FLOW: &[StageKey] = &[
    StageKey::Accept,
    StageKey::Eta,
    StageKey::StartVisit,
    StageKey::Diagnosis,
    StageKey::Repair,
    StageKey::EndVisit,
    StageKey::Completed,
];

/// Fixed stage sequence for in-shop repairs.
pub const IN_SHOP_FLOW: &[StageKey] = &[
    StageKey::Accept,
    StageKey::Diagnosis,
    StageKey::Repair,
    StageKey::Completed,
];

/// Fixed stage sequence for PC builds.
pub const PC_BUILD_FLOW: &[StageKey] = &[
    StageKey::Accept,
    StageKey::Build,
    StageKey::Install,
    StageKey::Qa,
    StageKey::Completed,
];

/// The ordered stage sequence for a service type. Total: every service type
/// has a flow, so there is no error case.
pub fn sequence_for(service: ServiceType) -> &'static [StageKey] {
    match service {
        ServiceType::InHouse => IN_HOUSE_FLOW,
        ServiceType::InShop => IN_SHOP_FLOW,
        ServiceType::PcBuild => PC_BUILD_FLOW,
    }
}

/// Position of `stage` within `seq`, or None if the stage is not part of
/// this flow (e.g. Eta in the in-shop flow). Callers must check before
/// moving the current-stage pointer.
pub fn index_of(seq: &[StageKey], stage: StageKey) -> Option<usize> {
    seq.iter().position(|s| *s == stage)
}

/// Move the current-stage pointer forward by one, saturating at the terminal
/// stage. Idempotent once the flow is complete.
pub fn advance(current: usize, seq: &[StageKey]) -> usize {
    (current + 1).min(seq.len() - 1)
}
