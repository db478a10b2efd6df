//! Alignment gate: validates a plan draft, repairs it when misaligned, and
//! re-validates the repaired copy.

use std::fmt;

use serde::Serialize;

use crate::category::PerCategory;
use crate::extract::ExtractedElementSet;
use crate::plan::EngagementPlanDraft;
use crate::policy::AlignmentPolicy;
use crate::repair::{AlignmentNote, repair_with};
use crate::validate::{ValidationReport, validate_with};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of running a draft through the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateVerdict {
    /// The draft was aligned as produced.
    Aligned,
    /// Repair closed every gap.
    Repaired {
        /// Number of injected items.
        injected: usize,
    },
    /// Gaps remain after repair.
    Unresolved {
        /// Names still missing, per category.
        missing: PerCategory<Vec<String>>,
    },
}

impl GateVerdict {
    /// True when the final draft is aligned.
    pub fn is_pass(&self) -> bool {
        !matches!(self, Self::Unresolved { .. })
    }
}

impl fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aligned => f.write_str("aligned"),
            Self::Repaired { injected } => write!(f, "repaired ({injected} injected)"),
            Self::Unresolved { missing } => {
                let remaining: usize = missing.iter().map(|(_, names)| names.len()).sum();
                write!(f, "unresolved ({remaining} still missing)")
            }
        }
    }
}

/// Everything the gate produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentOutcome {
    pub verdict: GateVerdict,
    /// Report on the draft as received.
    pub initial: ValidationReport,
    /// Report on the draft handed back (equal to `initial` when no repair ran).
    pub final_report: ValidationReport,
    /// The draft handed back: repaired when needed, otherwise unchanged.
    pub plan: EngagementPlanDraft,
    /// Repair note, when repair ran.
    pub note: Option<AlignmentNote>,
}

// ---------------------------------------------------------------------------
// AlignmentGate
// ---------------------------------------------------------------------------

/// Runs the validate / repair / re-validate flow under one policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentGate {
    policy: AlignmentPolicy,
}

impl AlignmentGate {
    pub fn new(policy: AlignmentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AlignmentPolicy {
        &self.policy
    }

    /// Run the gate for one draft.
    ///
    /// 1. Validates the draft against `elements`.
    /// 2. Returns [`GateVerdict::Aligned`] if nothing is missing.
    /// 3. Otherwise repairs a copy and validates the copy again.
    /// 4. Returns [`GateVerdict::Repaired`] if the copy is aligned, or
    ///    [`GateVerdict::Unresolved`] with the remaining gaps.
    pub fn run(&self, elements: &ExtractedElementSet, draft: &EngagementPlanDraft) -> AlignmentOutcome {
        let initial = validate_with(draft, elements, &self.policy);

        if initial.is_aligned {
            return AlignmentOutcome {
                verdict: GateVerdict::Aligned,
                final_report: initial.clone(),
                initial,
                plan: draft.clone(),
                note: None,
            };
        }

        let repaired = repair_with(draft, &initial, elements, &self.policy);
        let final_report = validate_with(&repaired.plan, elements, &self.policy);

        let verdict = if final_report.is_aligned {
            GateVerdict::Repaired {
                injected: repaired.note.injected_total(),
            }
        } else {
            GateVerdict::Unresolved {
                missing: final_report.missing.clone(),
            }
        };

        tracing::info!(
            initial = initial.overall_coverage,
            final_coverage = final_report.overall_coverage,
            pass = verdict.is_pass(),
            "alignment gate finished"
        );

        AlignmentOutcome {
            verdict,
            initial,
            final_report,
            plan: repaired.plan,
            note: Some(repaired.note),
        }
    }
}
