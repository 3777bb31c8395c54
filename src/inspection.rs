use serde::{Deserialize, Serialize};

/// WCA inspection period
pub const INSPECTION_MS: u64 = 15_000;
/// Grace window after inspection in which a late start costs +2
pub const GRACE_MS: u64 = 2_000;
/// Time added to a +2 solve
pub const PLUS_TWO_PENALTY_MS: u64 = 2_000;
/// Continuous hold required before the timer arms
pub const HOLD_TO_ARM_MS: u64 = 300;

/// Penalty earned during inspection, decided when the solve starts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InspectionOutcome {
    #[default]
    None,
    Plus2,
    Dnf,
}

impl InspectionOutcome {
    pub fn is_dnf(self) -> bool {
        self == InspectionOutcome::Dnf
    }
}

/// Outcome for a solve started `inspection_elapsed_ms` into inspection
pub fn outcome_for(inspection_elapsed_ms: u64) -> InspectionOutcome {
    if inspection_elapsed_ms <= INSPECTION_MS {
        InspectionOutcome::None
    } else if inspection_elapsed_ms <= INSPECTION_MS + GRACE_MS {
        InspectionOutcome::Plus2
    } else {
        InspectionOutcome::Dnf
    }
}

/// Countdown value shown during inspection, floored at zero
pub fn remaining_ms(inspection_elapsed_ms: u64) -> u64 {
    INSPECTION_MS.saturating_sub(inspection_elapsed_ms)
}

/// Countdown label: whole seconds rounded up, then "+2" and "DNF" once
/// the inspection limit has passed.
pub fn countdown_label(inspection_elapsed_ms: u64) -> String {
    match outcome_for(inspection_elapsed_ms) {
        InspectionOutcome::None => remaining_ms(inspection_elapsed_ms).div_ceil(1000).to_string(),
        InspectionOutcome::Plus2 => "+2".to_string(),
        InspectionOutcome::Dnf => "DNF".to_string(),
    }
}
