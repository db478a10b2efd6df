//! Auto-fix repair: inject missing protocol elements into a plan draft.
//!
//! Placement per category:
//! - supplements go to the plan phase their protocol phase label maps to;
//! - clinic treatments go to a fixed late phase (or follow the label
//!   heuristic, depending on [`ClinicPlacement`]);
//! - retest items are appended to the top-level retest schedule;
//! - lifestyle protocols are never injected and stay missing.
//!
//! Repair works on a copy; inputs are never modified.

mod editor;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::category::{ElementCategory, PerCategory};
use crate::extract::{ExtractedElement, ExtractedElementSet};
use crate::phase::map_phase_to_week;
use crate::plan::{EngagementPlanDraft, fields};
use crate::policy::{AlignmentPolicy, ClinicPlacement};
use crate::validate::ValidationReport;

use self::editor::PlanEditor;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Summary of what a repair pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentNote {
    pub supplements: usize,
    pub clinic_treatments: usize,
    pub retest_items: usize,
    /// Missing lifestyle protocols, which repair does not inject.
    pub lifestyle_unrepaired: usize,
    pub text: String,
}

impl AlignmentNote {
    fn new(injected: &PerCategory<Vec<String>>, lifestyle_unrepaired: usize) -> Self {
        let supplements = injected.supplements.len();
        let clinic_treatments = injected.clinic_treatments.len();
        let retest_items = injected.retest_items.len();

        let mut text = format!(
            "Protocol alignment: added {supplements} {}, {clinic_treatments} {}, {retest_items} {}",
            plural(supplements, "supplement", "supplements"),
            plural(clinic_treatments, "clinic treatment", "clinic treatments"),
            plural(retest_items, "retest item", "retest items"),
        );
        if lifestyle_unrepaired > 0 {
            text.push_str(&format!(
                "; {lifestyle_unrepaired} {} left for clinician review",
                plural(lifestyle_unrepaired, "lifestyle protocol", "lifestyle protocols"),
            ));
        }
        text.push('.');

        Self {
            supplements,
            clinic_treatments,
            retest_items,
            lifestyle_unrepaired,
            text,
        }
    }

    /// Number of injected items.
    pub fn injected_total(&self) -> usize {
        self.supplements + self.clinic_treatments + self.retest_items
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

/// Result of a repair pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    /// The repaired copy of the draft.
    pub plan: EngagementPlanDraft,
    pub note: AlignmentNote,
    /// Names injected per category.
    pub injected: PerCategory<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Action text
// ---------------------------------------------------------------------------

pub fn supplement_action(name: &str) -> String {
    format!("Take {name} as prescribed (per protocol)")
}

pub fn clinic_treatment_action(name: &str) -> String {
    format!("Schedule {name} at the clinic (per protocol)")
}

pub fn retest_action(name: &str) -> String {
    format!("Schedule {name} retest (per protocol)")
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// Repair with the default policy.
pub fn repair(
    plan: &EngagementPlanDraft,
    report: &ValidationReport,
    elements: &ExtractedElementSet,
) -> RepairOutcome {
    repair_with(plan, report, elements, &AlignmentPolicy::default())
}

/// Inject every missing supplement, clinic treatment and retest item listed
/// in `report` into a copy of `plan`.
///
/// An aligned report returns an unchanged copy and a zero-count note. When
/// anything is injected, the note text is also appended to the draft's
/// `alignmentNotes`.
pub fn repair_with(
    plan: &EngagementPlanDraft,
    report: &ValidationReport,
    elements: &ExtractedElementSet,
    policy: &AlignmentPolicy,
) -> RepairOutcome {
    let mut repaired = plan.clone();
    let mut injected = PerCategory::<Vec<String>>::default();
    let lifestyle_unrepaired = report.missing.lifestyle_protocols.len();

    if report.is_aligned {
        return RepairOutcome {
            plan: repaired,
            note: AlignmentNote::new(&injected, 0),
            injected,
        };
    }

    let pending = report.missing.supplements.len()
        + report.missing.clinic_treatments.len()
        + report.missing.retest_items.len();

    let note = if pending > 0 {
        let mut editor = PlanEditor::new(repaired.value_mut());

        for (name, element) in resolve_missing(
            &report.missing.supplements,
            elements.by_category(ElementCategory::Supplement),
        ) {
            let label = element.and_then(|e| e.phase_label.as_deref());
            let index = editor.clamp_phase(map_phase_to_week(label));
            editor.push_to_phase(index, fields::SUPPLEMENTS, Value::from(name));
            editor.push_to_phase(index, fields::ITEMS, Value::from(supplement_action(name)));
            tracing::debug!(item = name, phase = index, "injected supplement");
            injected.supplements.push(name.to_owned());
        }

        for (name, element) in resolve_missing(
            &report.missing.clinic_treatments,
            elements.by_category(ElementCategory::ClinicTreatment),
        ) {
            let wanted = match policy.clinic_placement {
                ClinicPlacement::FixedLate => policy.late_phase_index,
                ClinicPlacement::PhaseHeuristic => {
                    map_phase_to_week(element.and_then(|e| e.phase_label.as_deref()))
                }
            };
            let index = editor.clamp_phase(wanted);
            editor.push_to_phase(index, fields::CLINIC_TREATMENTS, Value::from(name));
            editor.push_to_phase(
                index,
                fields::ITEMS,
                Value::from(clinic_treatment_action(name)),
            );
            tracing::debug!(item = name, phase = index, "injected clinic treatment");
            injected.clinic_treatments.push(name.to_owned());
        }

        for (name, element) in resolve_missing(
            &report.missing.retest_items,
            elements.by_category(ElementCategory::RetestItem),
        ) {
            let mut entry = json!({
                "name": name,
                "action": retest_action(name),
            });
            if let Some(timing) = element.and_then(|e| e.timing.as_deref()) {
                entry["timing"] = Value::from(timing);
            }
            editor.push_to_root(fields::RETEST_SCHEDULE, entry);
            tracing::debug!(item = name, "injected retest item");
            injected.retest_items.push(name.to_owned());
        }

        let note = AlignmentNote::new(&injected, lifestyle_unrepaired);
        editor.push_to_root(fields::ALIGNMENT_NOTES, Value::from(note.text.clone()));
        note
    } else {
        AlignmentNote::new(&injected, lifestyle_unrepaired)
    };

    if lifestyle_unrepaired > 0 {
        tracing::info!(
            count = lifestyle_unrepaired,
            "lifestyle protocols are not auto-repaired; left missing"
        );
    }

    tracing::info!(
        supplements = note.supplements,
        clinic_treatments = note.clinic_treatments,
        retest_items = note.retest_items,
        "repaired plan draft"
    );

    RepairOutcome {
        plan: repaired,
        note,
        injected,
    }
}

/// Pair each missing name with the first not-yet-used source element of the
/// same name, so duplicate names in different phases each keep their own
/// metadata. Names with no source element are paired with `None`.
fn resolve_missing<'a>(
    names: &'a [String],
    elements: &'a [ExtractedElement],
) -> Vec<(&'a str, Option<&'a ExtractedElement>)> {
    let mut used = vec![false; elements.len()];
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        let mut found = None;
        for (i, element) in elements.iter().enumerate() {
            if !used[i] && element.name == *name {
                used[i] = true;
                found = Some(element);
                break;
            }
        }
        if found.is_none() {
            tracing::warn!(item = %name, "missing item has no source element; placing by default");
        }
        resolved.push((name.as_str(), found));
    }
    resolved
}
