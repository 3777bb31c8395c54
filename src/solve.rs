use serde::{Deserialize, Serialize};

use crate::inspection::{InspectionOutcome, PLUS_TWO_PENALTY_MS};
use crate::util::format_time;

/// One completed solve in a session's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveEntry {
    pub id: String,
    pub elapsed_ms: u64,
    pub event_id: String,
    pub scramble_text: String,
    pub created_at_ms: i64,
    #[serde(default)]
    pub inspection_outcome: InspectionOutcome,
}

impl SolveEntry {
    /// Time used for display and averaging, `None` for a DNF
    pub fn numeric_ms(&self) -> Option<u64> {
        effective_ms(self.elapsed_ms, self.inspection_outcome)
    }

    pub fn is_dnf(&self) -> bool {
        self.inspection_outcome.is_dnf()
    }

    pub fn display_time(&self) -> String {
        display_time(self.elapsed_ms, self.inspection_outcome)
    }
}

pub fn effective_ms(elapsed_ms: u64, outcome: InspectionOutcome) -> Option<u64> {
    match outcome {
        InspectionOutcome::None => Some(elapsed_ms),
        InspectionOutcome::Plus2 => Some(elapsed_ms.saturating_add(PLUS_TWO_PENALTY_MS)),
        InspectionOutcome::Dnf => None,
    }
}

/// `DNF`, the penalised time with a trailing `+`, or the plain time
pub fn display_time(elapsed_ms: u64, outcome: InspectionOutcome) -> String {
    match (outcome, effective_ms(elapsed_ms, outcome)) {
        (InspectionOutcome::Plus2, Some(ms)) => format!("{}+", format_time(ms)),
        (_, Some(ms)) => format_time(ms),
        (_, None) => "DNF".to_string(),
    }
}
