//! Phase-label to plan-phase mapping.
//!
//! Protocol phase labels are free text ("Weeks 1-2: Foundation",
//! "Phase 2 - Detox"). Engagement plans are an ordered list of phases. This
//! maps a label to the index of the plan phase it most likely corresponds to.

/// Ordered mapping rules: the first rule with a matching fragment wins.
pub const PHASE_RULES: &[(&[&str], usize)] = &[
    (&["core", "foundation", "week 1", "weeks 1-2"], 0),
    (&["phase 1", "week 2", "week 3"], 1),
    (&["phase 2", "week 4", "week 5"], 2),
    (&["phase 3", "recovery", "week 6"], 3),
];

/// Index used when the label is absent or matches no rule.
pub const DEFAULT_PHASE_INDEX: usize = 0;

/// Map a free-text phase label to a plan phase index.
pub fn map_phase_to_week(label: Option<&str>) -> usize {
    let Some(label) = label else {
        return DEFAULT_PHASE_INDEX;
    };
    let lower = label.to_lowercase();
    PHASE_RULES
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| lower.contains(f)))
        .map_or(DEFAULT_PHASE_INDEX, |(_, index)| *index)
}
