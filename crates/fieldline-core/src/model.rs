use crate::time::EpochMs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Opaque request identifier (assigned by whatever created the request).
pub type RequestId = String;

/// Category of a service request. Fixed at creation; selects the stage
/// sequence that applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    InHouse,
    InShop,
    PcBuild,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::InHouse,
        ServiceType::InShop,
        ServiceType::PcBuild,
    ];
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_house" | "in-house" => Ok(ServiceType::InHouse),
            "in_shop" | "in-shop" => Ok(ServiceType::InShop),
            "pc_build" | "pc-build" => Ok(ServiceType::PcBuild),
            other => Err(format!("unknown service type '{other}'")),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceType::InHouse => "in_house",
            ServiceType::InShop => "in_shop",
            ServiceType::PcBuild => "pc_build",
        };
        f.write_str(s)
    }
}

/// One discrete step in a request's progress sequence. Not every stage
/// applies to every service type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    Accept,
    Eta,
    StartVisit,
    Diagnosis,
    Repair,
    EndVisit,
    Build,
    Install,
    Qa,
    Completed,
}

impl StageKey {
    /// Human label used as the default event description.
    pub fn label(&self) -> &'static str {
        match self {
            StageKey::Accept => "Request accepted",
            StageKey::Eta => "ETA set",
            StageKey::StartVisit => "Visit started",
            StageKey::Diagnosis => "Diagnosis",
            StageKey::Repair => "Repair in progress",
            StageKey::EndVisit => "Visit ended",
            StageKey::Build => "Build in progress",
            StageKey::Install => "Install",
            StageKey::Qa => "Quality check",
            StageKey::Completed => "Completed",
        }
    }
}

impl FromStr for StageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(StageKey::Accept),
            "eta" => Ok(StageKey::Eta),
            "start_visit" | "start-visit" => Ok(StageKey::StartVisit),
            "diagnosis" => Ok(StageKey::Diagnosis),
            "repair" => Ok(StageKey::Repair),
            "end_visit" | "end-visit" => Ok(StageKey::EndVisit),
            "build" => Ok(StageKey::Build),
            "install" => Ok(StageKey::Install),
            "qa" => Ok(StageKey::Qa),
            "completed" => Ok(StageKey::Completed),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// Who recorded a timeline event. Supplied by the caller, never derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Agent,
    Admin,
    User,
}

/// What a timeline event records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A stage transition committed.
    Stage { stage: StageKey },
    /// Request was accepted into the system (distinct from the Accept stage;
    /// used by fixture/fallback timelines).
    Accepted,
    Cancelled,
    Reassigned,
}

/// One immutable entry in a request's event log. Append-only; ordering is
/// append order, and the store keeps `at_ms` non-decreasing per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEvent {
    pub id: String,
    #[serde(flatten)]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub at_ms: EpochMs,
    pub actor: Actor,
    /// Set only on the ETA event. Both the agent and customer countdowns
    /// derive their target from this plus `at_ms`, so there is a single
    /// clock for a request's ETA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<u32>,
}

impl TimelineEvent {
    pub fn new(kind: EventKind, description: Option<String>, at_ms: EpochMs, actor: Actor) -> Self {
        Self {
            id: Ulid::new().to_string(),
            kind,
            description,
            at_ms,
            actor,
            eta_minutes: None,
        }
    }

    /// The stage this event committed, if it is a stage event.
    pub fn stage(&self) -> Option<StageKey> {
        match self.kind {
            EventKind::Stage { stage } => Some(stage),
            _ => None,
        }
    }
}
