//! Coverage validation: does an engagement plan draft mention every extracted
//! protocol element?

use serde::{Deserialize, Serialize};

use crate::category::{ElementCategory, PerCategory};
use crate::extract::ExtractedElementSet;
use crate::matcher::NameVariants;
use crate::plan::EngagementPlanDraft;
use crate::policy::{AlignmentPolicy, CoverageAveraging};

/// Coverage of a plan draft against an element set.
///
/// Derived on demand and never stored by the engine. Safety constraints are
/// not part of the alignment decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// True iff no category has missing elements.
    pub is_aligned: bool,
    /// Covered element count per category.
    pub coverage: PerCategory<usize>,
    /// Names of uncovered elements per category, in protocol order.
    pub missing: PerCategory<Vec<String>>,
    /// Covered share per category, 0..=100. Categories without elements are 100.
    pub coverage_percentage: PerCategory<u32>,
    /// Combined coverage, 0..=100, per the policy's averaging.
    pub overall_coverage: u32,
    /// Source element count per category.
    #[serde(default)]
    pub totals: PerCategory<usize>,
}

impl ValidationReport {
    /// Total number of missing names across categories.
    pub fn missing_count(&self) -> usize {
        self.missing.iter().map(|(_, names)| names.len()).sum()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let per_category: Vec<String> = self
            .coverage_percentage
            .iter()
            .map(|(c, pct)| format!("{} {pct}%", c.plural_label()))
            .collect();
        format!(
            "{} -- overall {}% ({})",
            if self.is_aligned { "aligned" } else { "misaligned" },
            self.overall_coverage,
            per_category.join(", ")
        )
    }
}

/// Validate with the default policy.
pub fn validate(plan: &EngagementPlanDraft, elements: &ExtractedElementSet) -> ValidationReport {
    validate_with(plan, elements, &AlignmentPolicy::default())
}

/// Validate a plan draft against an element set.
///
/// Never fails: an absent or malformed draft simply covers nothing.
pub fn validate_with(
    plan: &EngagementPlanDraft,
    elements: &ExtractedElementSet,
    policy: &AlignmentPolicy,
) -> ValidationReport {
    let blob = plan.searchable_text();

    let mut coverage = PerCategory::<usize>::default();
    let mut missing = PerCategory::<Vec<String>>::default();

    for category in ElementCategory::ALL {
        for element in elements.by_category(category) {
            if NameVariants::new(&element.name).found_in(&blob) {
                *coverage.get_mut(category) += 1;
            } else {
                missing.get_mut(category).push(element.name.clone());
            }
        }
    }

    let totals = elements.counts();
    let coverage_percentage =
        PerCategory::from_fn(|c| percent(*coverage.get(c), *totals.get(c)));

    let overall_coverage = match policy.coverage_averaging {
        CoverageAveraging::Unweighted => {
            let sum: u32 = coverage_percentage.iter().map(|(_, p)| *p).sum();
            (sum + 2) / 4
        }
        CoverageAveraging::CountWeighted => {
            let covered: usize = coverage.iter().map(|(_, n)| *n).sum();
            percent(covered, elements.total_elements())
        }
    };

    let is_aligned = missing.iter().all(|(_, names)| names.is_empty());

    let report = ValidationReport {
        is_aligned,
        coverage,
        missing,
        coverage_percentage,
        overall_coverage,
        totals,
    };

    tracing::debug!(
        aligned = report.is_aligned,
        overall = report.overall_coverage,
        missing = report.missing_count(),
        "validated plan coverage"
    );

    report
}

/// `covered / total` as a whole percentage, rounded half up. Empty is 100.
fn percent(covered: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    let pct = (covered * 200 + total) / (2 * total);
    u32::try_from(pct.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::protocol::ProtocolDocument;
    use serde_json::json;

    fn elements(value: serde_json::Value) -> ExtractedElementSet {
        extract(&ProtocolDocument::from_value(value))
    }

    #[test]
    fn percent_rounding() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(0, 3), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn missing_supplement_is_reported() {
        let set = elements(json!({
            "core_protocol": { "items": [{ "name": "Magnesium Glycinate", "category": "supplement" }] }
        }));
        let plan = EngagementPlanDraft::from(json!({ "phases": [{ "items": ["Walk daily"] }] }));
        let report = validate(&plan, &set);
        assert!(!report.is_aligned);
        assert_eq!(report.missing.supplements, vec!["Magnesium Glycinate"]);
        assert_eq!(report.coverage_percentage.supplements, 0);
        assert_eq!(report.coverage_percentage.clinic_treatments, 100);
        assert_eq!(report.overall_coverage, 75);
    }

    #[test]
    fn empty_categories_are_vacuously_covered() {
        let report = validate(&EngagementPlanDraft::absent(), &ExtractedElementSet::default());
        assert!(report.is_aligned);
        for (_, pct) in report.coverage_percentage.iter() {
            assert_eq!(*pct, 100);
        }
        assert_eq!(report.overall_coverage, 100);
    }

    #[test]
    fn absent_plan_covers_nothing() {
        let set = elements(json!({
            "core_protocol": { "items": ["Zinc", "IV Vitamin C"] },
            "retest_schedule": ["CBC"]
        }));
        let report = validate(&EngagementPlanDraft::absent(), &set);
        assert!(!report.is_aligned);
        assert_eq!(report.coverage_percentage.supplements, 0);
        assert_eq!(report.coverage_percentage.clinic_treatments, 0);
        assert_eq!(report.coverage_percentage.retest_items, 0);
        assert_eq!(report.coverage_percentage.lifestyle_protocols, 100);
        assert_eq!(report.overall_coverage, 25);
    }

    #[test]
    fn count_weighted_overall() {
        let set = elements(json!({
            "core_protocol": { "items": ["Zinc", "Selenium", "Boron", "Iodine", "Sleep routine"] }
        }));
        // All four supplements covered, the one lifestyle item missing.
        let plan = EngagementPlanDraft::from(json!({
            "phases": [{ "supplements": ["Zinc", "Selenium", "Boron", "Iodine"] }]
        }));
        let unweighted = validate(&plan, &set);
        assert_eq!(unweighted.coverage_percentage.lifestyle_protocols, 0);
        assert_eq!(unweighted.overall_coverage, 75);

        let policy = AlignmentPolicy::default().coverage_averaging(CoverageAveraging::CountWeighted);
        let weighted = validate_with(&plan, &set, &policy);
        assert_eq!(weighted.overall_coverage, 80);
        assert_eq!(weighted.missing, unweighted.missing);
    }

    #[test]
    fn safety_constraints_do_not_affect_alignment() {
        let set = elements(json!({
            "safety_summary": { "warning_signs": ["Severe headache"] }
        }));
        assert_eq!(set.safety_constraints.len(), 1);
        let report = validate(&EngagementPlanDraft::from(json!({})), &set);
        assert!(report.is_aligned);
    }

    #[test]
    fn duplicate_missing_names_are_listed_per_element() {
        let set = elements(json!({
            "core_protocol": { "items": ["Zinc"] },
            "expansion_phases": [{ "name": "Phase 2", "items": ["Zinc"] }]
        }));
        let report = validate(&EngagementPlanDraft::absent(), &set);
        assert_eq!(report.missing.supplements, vec!["Zinc", "Zinc"]);
        assert_eq!(report.totals.supplements, 2);
    }

    #[test]
    fn report_serializes_with_stable_keys() {
        let report = validate(&EngagementPlanDraft::absent(), &ExtractedElementSet::default());
        let value = serde_json::to_value(&report).unwrap();
        for key in ["isAligned", "coverage", "missing", "coveragePercentage", "overallCoverage"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert!(value["missing"].get("lifestyleProtocols").is_some());
    }

    #[test]
    fn summary_line() {
        let report = validate(&EngagementPlanDraft::absent(), &ExtractedElementSet::default());
        assert!(report.summary().starts_with("aligned -- overall 100%"));
    }
}
