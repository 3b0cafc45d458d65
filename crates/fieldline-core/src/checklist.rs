use crate::model::StageKey;
use thiserror::Error;

/// Checklist attached to a stage that requires operator confirmation before
/// the transition commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checklist {
    /// Predefined options the operator can multi-select. Free-text additions
    /// are always allowed on top.
    pub options: &'static [&'static str],
    /// Whether confirmation demands at least one selection. The reference
    /// flows allow committing with none recorded, so both shipped checklists
    /// set this to false; the rule lives here so it is declared per stage
    /// rather than scattered through screens.
    pub requires_selection: bool,
}

const DIAGNOSIS_OPTIONS: &[&str] = &[
    "Display Issue",
    "Battery Issue",
    "Water Damage",
    "Charging Port",
    "Software Fault",
];

const INSTALL_OPTIONS: &[&str] = &[
    "Operating System",
    "Drivers",
    "BIOS Update",
    "Benchmark Suite",
];

const DIAGNOSIS_CHECKLIST: Checklist = Checklist {
    options: DIAGNOSIS_OPTIONS,
    requires_selection: false,
};

const INSTALL_CHECKLIST: Checklist = Checklist {
    options: INSTALL_OPTIONS,
    requires_selection: false,
};

/// The checklist gating a stage, if any. Stages without a checklist commit
/// directly.
pub fn checklist_for(stage: StageKey) -> Option<&'static Checklist> {
    match stage {
        StageKey::Diagnosis => Some(&DIAGNOSIS_CHECKLIST),
        StageKey::Install => Some(&INSTALL_CHECKLIST),
        _ => None,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("stage {stage:?} requires at least one selection")]
    SelectionRequired { stage: StageKey },
}

/// Validate a confirmed selection set against the stage's checklist rule.
pub fn validate_selection(stage: StageKey, selections: &[String]) -> Result<(), SelectionError> {
    if let Some(checklist) = checklist_for(stage) {
        if checklist.requires_selection && selections.is_empty() {
            return Err(SelectionError::SelectionRequired { stage });
        }
    }
    Ok(())
}

/// Event description for a gated stage: the stage label followed by the
/// selected items, or "No selections" when the set is empty.
pub fn describe_selection(stage: StageKey, selections: &[String]) -> String {
    if selections.is_empty() {
        format!("{}: No selections", stage.label())
    } else {
        format!("{}: {}", stage.label(), selections.join(", "))
    }
}
