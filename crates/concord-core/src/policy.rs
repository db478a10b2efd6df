//! Alignment policy: the knobs for behavior that is a product decision rather
//! than a fixed rule. Defaults reproduce the established behavior.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Plan phase index that clinic treatments are placed in under
/// [`ClinicPlacement::FixedLate`].
pub const DEFAULT_LATE_PHASE_INDEX: usize = 2;

/// Policy applied by the validator and repairer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentPolicy {
    #[serde(default)]
    pub coverage_averaging: CoverageAveraging,
    #[serde(default)]
    pub clinic_placement: ClinicPlacement,
    #[serde(default = "default_late_phase_index")]
    pub late_phase_index: usize,
}

impl Default for AlignmentPolicy {
    fn default() -> Self {
        Self {
            coverage_averaging: CoverageAveraging::default(),
            clinic_placement: ClinicPlacement::default(),
            late_phase_index: DEFAULT_LATE_PHASE_INDEX,
        }
    }
}

impl AlignmentPolicy {
    pub fn coverage_averaging(mut self, averaging: CoverageAveraging) -> Self {
        self.coverage_averaging = averaging;
        self
    }

    pub fn clinic_placement(mut self, placement: ClinicPlacement) -> Self {
        self.clinic_placement = placement;
        self
    }
}

fn default_late_phase_index() -> usize {
    DEFAULT_LATE_PHASE_INDEX
}

// ---------------------------------------------------------------------------

/// How `overallCoverage` combines the per-category percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageAveraging {
    /// Mean of the four category percentages, each category counting equally.
    #[default]
    Unweighted,
    /// Covered elements over total elements, across all categories.
    CountWeighted,
}

impl fmt::Display for CoverageAveraging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unweighted => "unweighted",
            Self::CountWeighted => "count_weighted",
        };
        f.write_str(s)
    }
}

impl FromStr for CoverageAveraging {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unweighted" => Ok(Self::Unweighted),
            "count_weighted" => Ok(Self::CountWeighted),
            other => Err(PolicyParseError {
                setting: "coverage averaging",
                value: other.to_owned(),
            }),
        }
    }
}

/// Where missing clinic treatments are injected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicPlacement {
    /// Fixed late phase (`late_phase_index`, clamped to the last phase).
    #[default]
    FixedLate,
    /// Same phase-label heuristic used for supplements.
    PhaseHeuristic,
}

impl fmt::Display for ClinicPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FixedLate => "fixed_late",
            Self::PhaseHeuristic => "phase_heuristic",
        };
        f.write_str(s)
    }
}

impl FromStr for ClinicPlacement {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed_late" => Ok(Self::FixedLate),
            "phase_heuristic" => Ok(Self::PhaseHeuristic),
            other => Err(PolicyParseError {
                setting: "clinic placement",
                value: other.to_owned(),
            }),
        }
    }
}

/// Error returned when parsing an invalid policy value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {setting}: {value:?}")]
pub struct PolicyParseError {
    pub setting: &'static str,
    pub value: String,
}
