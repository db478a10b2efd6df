//! Protocol documents: format types, loading, and normalization.
//!
//! Two layouts exist in stored protocols: the phase-based layout
//! (`core_protocol` + `expansion_phases[]` + supporting blocks) and the older
//! flat `modules[]` layout. [`normalize`] turns either, or a mixture of both,
//! into one ordered list of [`Section`]s that the extractor walks.

pub mod format;
mod lenient;

use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub use format::{
    ClinicTreatments, CorePhase, ExpansionPhase, LegacyModule, ProtocolDocument, ProtocolItem,
    RetestEntry, SafetySummary, TextEntry,
};

/// Label given to core-phase items when the core block is unnamed.
pub const CORE_PHASE_LABEL: &str = "Core Protocol";

/// Errors that can occur while loading a protocol document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("protocol JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ProtocolDocument {
    /// Parse a protocol from JSON text.
    ///
    /// Only syntactically invalid JSON is an error; any well-formed JSON value
    /// is accepted through [`ProtocolDocument::from_value`].
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::from_value(value))
    }

    /// Build a protocol from an already-parsed JSON value. Never fails: a
    /// non-object value yields an empty document.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from(map),
            _ => {
                tracing::warn!("protocol document is not a JSON object; treating as empty");
                Self::default()
            }
        }
    }

    /// Which layout(s) the document uses.
    pub fn shape(&self) -> DocumentShape {
        let phased = self.core_protocol.is_some()
            || !self.expansion_phases.is_empty()
            || self.clinic_treatments.is_some()
            || !self.retest_schedule.is_empty()
            || self.safety_summary.is_some();
        let legacy = !self.modules.is_empty();
        match (phased, legacy) {
            (true, true) => DocumentShape::Mixed,
            (true, false) => DocumentShape::Phased,
            (false, true) => DocumentShape::Legacy,
            (false, false) => DocumentShape::Empty,
        }
    }
}

/// Layout detected in a protocol document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    Phased,
    Legacy,
    /// Phase-based blocks and legacy modules in the same document.
    Mixed,
    Empty,
}

impl fmt::Display for DocumentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Phased => "phased",
            Self::Legacy => "legacy",
            Self::Mixed => "mixed",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Where a canonical phase came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOrigin {
    Core,
    Expansion,
    LegacyModule,
}

/// A phase in canonical form, whatever layout it was written in.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPhase {
    pub origin: PhaseOrigin,
    pub label: String,
    /// Items with their effective phase label already resolved.
    pub items: Vec<ProtocolItem>,
    pub safety_gates: Vec<String>,
}

/// One unit of the canonical protocol walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Phase(CanonicalPhase),
    Modalities(Vec<ProtocolItem>),
    Retests(Vec<RetestEntry>),
    Safety(SafetySummary),
}

/// A protocol reduced to the ordered sections the extractor consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProtocol {
    pub shape: DocumentShape,
    pub sections: Vec<Section>,
}

/// Normalize a protocol document into canonical sections.
///
/// Section order: core phase, expansion phases, clinic modalities, retest
/// schedule, safety summary, legacy modules. Empty blocks produce no section.
///
/// Phase labels: expansion items always take their phase's label; core and
/// legacy-module items keep an explicit item label and otherwise take their
/// container's. Unnamed containers are labelled `Core Protocol`, `Phase N`,
/// or `Module N`.
pub fn normalize(doc: &ProtocolDocument) -> NormalizedProtocol {
    let mut sections = Vec::new();

    if let Some(core) = &doc.core_protocol {
        let label = core
            .name
            .clone()
            .unwrap_or_else(|| CORE_PHASE_LABEL.to_owned());
        sections.push(Section::Phase(CanonicalPhase {
            origin: PhaseOrigin::Core,
            items: label_items(&core.items, &label, false),
            label,
            safety_gates: Vec::new(),
        }));
    }

    for (i, phase) in doc.expansion_phases.iter().enumerate() {
        let label = phase
            .name
            .clone()
            .unwrap_or_else(|| format!("Phase {}", i + 1));
        sections.push(Section::Phase(CanonicalPhase {
            origin: PhaseOrigin::Expansion,
            items: label_items(&phase.items, &label, true),
            label,
            safety_gates: phase.safety_gates.iter().map(|g| g.0.clone()).collect(),
        }));
    }

    if let Some(clinic) = &doc.clinic_treatments {
        if !clinic.available_modalities.is_empty() {
            sections.push(Section::Modalities(clinic.available_modalities.clone()));
        }
    }

    if !doc.retest_schedule.is_empty() {
        sections.push(Section::Retests(doc.retest_schedule.clone()));
    }

    if let Some(safety) = &doc.safety_summary {
        sections.push(Section::Safety(safety.clone()));
    }

    for (i, module) in doc.modules.iter().enumerate() {
        let label = module
            .name
            .clone()
            .unwrap_or_else(|| format!("Module {}", i + 1));
        sections.push(Section::Phase(CanonicalPhase {
            origin: PhaseOrigin::LegacyModule,
            items: label_items(&module.items, &label, false),
            label,
            safety_gates: Vec::new(),
        }));
    }

    NormalizedProtocol {
        shape: doc.shape(),
        sections,
    }
}

fn label_items(items: &[ProtocolItem], label: &str, force: bool) -> Vec<ProtocolItem> {
    items
        .iter()
        .map(|item| {
            let mut item = item.clone();
            if force || item.phase_label.is_none() {
                item.phase_label = Some(label.to_owned());
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> ProtocolDocument {
        ProtocolDocument::from_value(value)
    }

    #[test]
    fn shape_detection() {
        assert_eq!(doc(json!({})).shape(), DocumentShape::Empty);
        assert_eq!(
            doc(json!({ "core_protocol": { "items": [] } })).shape(),
            DocumentShape::Phased
        );
        assert_eq!(
            doc(json!({ "modules": [{ "name": "Week 1", "items": ["Zinc"] }] })).shape(),
            DocumentShape::Legacy
        );
        assert_eq!(
            doc(json!({ "retest_schedule": ["CBC"], "modules": [{ "items": [] }] })).shape(),
            DocumentShape::Mixed
        );
    }

    #[test]
    fn non_object_document_is_empty() {
        assert_eq!(doc(json!([1, 2, 3])), ProtocolDocument::default());
        assert_eq!(doc(Value::Null), ProtocolDocument::default());
    }

    #[test]
    fn from_json_str_rejects_only_bad_syntax() {
        assert!(ProtocolDocument::from_json_str("{ not json").is_err());
        let parsed = ProtocolDocument::from_json_str("\"just a string\"").unwrap();
        assert_eq!(parsed.shape(), DocumentShape::Empty);
    }

    #[test]
    fn normalize_orders_sections() {
        let normalized = normalize(&doc(json!({
            "modules": [{ "name": "Legacy Week 1", "items": ["Zinc"] }],
            "safety_summary": { "warning_signs": ["Rash"] },
            "retest_schedule": ["CBC"],
            "clinic_treatments": { "available_modalities": ["HBOT"] },
            "expansion_phases": [{ "items": ["Binder"] }],
            "core_protocol": { "items": ["Magnesium"] }
        })));
        assert_eq!(normalized.shape, DocumentShape::Mixed);
        let kinds: Vec<&str> = normalized
            .sections
            .iter()
            .map(|s| match s {
                Section::Phase(p) => match p.origin {
                    PhaseOrigin::Core => "core",
                    PhaseOrigin::Expansion => "expansion",
                    PhaseOrigin::LegacyModule => "module",
                },
                Section::Modalities(_) => "modalities",
                Section::Retests(_) => "retests",
                Section::Safety(_) => "safety",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["core", "expansion", "modalities", "retests", "safety", "module"]
        );
    }

    #[test]
    fn normalize_resolves_phase_labels() {
        let normalized = normalize(&doc(json!({
            "core_protocol": { "items": ["Magnesium", { "name": "Zinc", "phase_label": "Week 3" }] },
            "expansion_phases": [
                { "items": [{ "name": "Binder", "phase_label": "ignored" }] },
                { "name": "Phase 3: Recovery", "items": ["Collagen"] }
            ]
        })));
        let phases: Vec<&CanonicalPhase> = normalized
            .sections
            .iter()
            .filter_map(|s| match s {
                Section::Phase(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(phases[0].label, CORE_PHASE_LABEL);
        assert_eq!(phases[0].items[0].phase_label.as_deref(), Some(CORE_PHASE_LABEL));
        assert_eq!(phases[0].items[1].phase_label.as_deref(), Some("Week 3"));
        assert_eq!(phases[1].label, "Phase 1");
        assert_eq!(phases[1].items[0].phase_label.as_deref(), Some("Phase 1"));
        assert_eq!(
            phases[2].items[0].phase_label.as_deref(),
            Some("Phase 3: Recovery")
        );
    }
}
