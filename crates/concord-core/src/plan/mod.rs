//! Engagement plan drafts.
//!
//! Drafts are produced by an external text-generation collaborator and are
//! untrusted: they may be absent, partially shaped, or carry fields nobody
//! asked for. [`EngagementPlanDraft`] therefore keeps the raw JSON value so
//! unknown content survives validation and repair. [`EngagementPlan`] is a
//! typed view for building well-formed drafts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names inside a draft.
pub mod fields {
    pub const PHASES: &str = "phases";
    pub const NAME: &str = "name";
    pub const SUPPLEMENTS: &str = "supplements";
    pub const CLINIC_TREATMENTS: &str = "clinicTreatments";
    pub const LIFESTYLE_ACTIONS: &str = "lifestyleActions";
    pub const ITEMS: &str = "items";
    pub const RETEST_SCHEDULE: &str = "retestSchedule";
    pub const ALIGNMENT_NOTES: &str = "alignmentNotes";
}

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// Well-formed engagement plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementPlan {
    #[serde(default)]
    pub phases: Vec<PlanPhase>,
    #[serde(default)]
    pub retest_schedule: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alignment_notes: Vec<String>,
    /// Any other top-level content.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One phase of an engagement plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPhase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub supplements: Vec<String>,
    #[serde(default)]
    pub clinic_treatments: Vec<String>,
    #[serde(default)]
    pub lifestyle_actions: Vec<String>,
    /// Free-text action lines.
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlanPhase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// An untrusted engagement plan draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngagementPlanDraft(Value);

impl Default for EngagementPlanDraft {
    fn default() -> Self {
        Self::absent()
    }
}

impl From<Value> for EngagementPlanDraft {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<EngagementPlan> for EngagementPlanDraft {
    fn from(plan: EngagementPlan) -> Self {
        // A struct of strings, JSON values and string-keyed maps always
        // converts; fall back to absent rather than panic.
        Self(serde_json::to_value(plan).unwrap_or(Value::Null))
    }
}

impl EngagementPlanDraft {
    /// A missing draft.
    pub fn absent() -> Self {
        Self(Value::Null)
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub(crate) fn value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    /// Typed view of the draft, if it is well-formed.
    pub fn typed(&self) -> Option<EngagementPlan> {
        serde_json::from_value(self.0.clone()).ok()
    }

    /// Number of entries in `phases[]` (0 when missing or not a list).
    pub fn phase_count(&self) -> usize {
        self.0
            .get(fields::PHASES)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Parse raw collaborator output into a draft.
    ///
    /// Accepts bare JSON, JSON wrapped in Markdown code fences, or JSON
    /// surrounded by prose. Never fails: text without a parseable JSON object
    /// yields an absent draft.
    pub fn from_generated_text(text: &str) -> Self {
        let Some(block) = json_block(text) else {
            tracing::warn!("generated plan text contains no JSON object; treating as absent");
            return Self::absent();
        };
        match serde_json::from_str::<Value>(block) {
            Ok(value) => Self(value),
            Err(e) => {
                tracing::warn!(error = %e, "generated plan JSON is invalid; treating as absent");
                Self::absent()
            }
        }
    }

    /// Lowercase text blob used for coverage matching.
    ///
    /// Every string, number and boolean leaf of the draft joined with
    /// newlines. Object keys are structure and are left out.
    /// Absent drafts yield an empty string.
    pub fn searchable_text(&self) -> String {
        let mut leaves = Vec::new();
        collect_leaves(&self.0, &mut leaves);
        leaves.join("\n").to_lowercase()
    }
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push(b.to_string()),
        Value::Number(n) => out.push(n.to_string()),
        Value::String(s) => out.push(s.clone()),
        Value::Array(entries) => entries.iter().for_each(|v| collect_leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
    }
}

/// Locate the JSON object in generated text.
fn json_block(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_draft_has_empty_text() {
        let draft = EngagementPlanDraft::absent();
        assert!(draft.is_absent());
        assert_eq!(draft.searchable_text(), "");
        assert_eq!(draft.phase_count(), 0);
    }

    #[test]
    fn searchable_text_is_lowercase_leaves_without_keys() {
        let draft = EngagementPlanDraft::from(json!({
            "phases": [{ "supplements": ["Vitamin D3"], "items": ["Take \"Omega-3\" daily"] }],
            "weeks": 6,
            "confirmed": true
        }));
        let text = draft.searchable_text();
        assert!(text.contains("vitamin d3"));
        assert!(text.contains("take \"omega-3\" daily"));
        assert!(text.contains('6'));
        assert!(text.contains("true"));
        assert!(!text.contains("supplements"), "keys are not searchable");
    }

    #[test]
    fn typed_plan_roundtrips_extra_fields() {
        let draft = EngagementPlanDraft::from(json!({
            "title": "My plan",
            "phases": [{ "name": "Week 1", "supplements": [], "clinicTreatments": [],
                         "lifestyleActions": [], "items": [], "focus": "gut" }],
            "retestSchedule": []
        }));
        let typed = draft.typed().expect("well-formed");
        assert_eq!(typed.extra["title"], "My plan");
        assert_eq!(typed.phases[0].extra["focus"], "gut");
        let back = EngagementPlanDraft::from(typed);
        assert_eq!(back.as_value()["phases"][0]["focus"], "gut");
    }

    #[test]
    fn malformed_draft_has_no_typed_view() {
        let draft = EngagementPlanDraft::from(json!({ "phases": "week one: rest" }));
        assert!(draft.typed().is_none());
        assert_eq!(draft.phase_count(), 0);
        assert!(draft.searchable_text().contains("week one"));
    }

    #[test]
    fn generated_text_with_fences_and_prose() {
        let fenced = "Here is the plan:\n```json\n{\"phases\": [{\"items\": [\"Rest\"]}]}\n```\nEnjoy!";
        assert_eq!(EngagementPlanDraft::from_generated_text(fenced).phase_count(), 1);

        let bare_fence = "```\n{\"phases\": []}\n```";
        assert!(!EngagementPlanDraft::from_generated_text(bare_fence).is_absent());

        let prose = "Sure! {\"phases\": [{}, {}]} Let me know.";
        assert_eq!(EngagementPlanDraft::from_generated_text(prose).phase_count(), 2);
    }

    #[test]
    fn generated_text_without_json_is_absent() {
        assert!(EngagementPlanDraft::from_generated_text("I cannot help with that.").is_absent());
        assert!(EngagementPlanDraft::from_generated_text("{ broken").is_absent());
        assert!(EngagementPlanDraft::from_generated_text("").is_absent());
    }
}
