//! Element extraction: protocol document -> categorized element set.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::category::{self, Classification, ElementCategory, PerCategory};
use crate::protocol::{self, ProtocolDocument, ProtocolItem, RetestEntry, SafetySummary, Section};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One actionable element extracted from a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedElement {
    pub name: String,
    pub category: ElementCategory,
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contraindications: Vec<String>,
    /// Label of the protocol phase the element was found in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_label: Option<String>,
}

impl ExtractedElement {
    fn from_item(item: &ProtocolItem, category: ElementCategory, how: Classification) -> Self {
        Self {
            name: item.name.clone(),
            category,
            classification: how,
            dosage: item.dosage.clone(),
            timing: item.timing.clone(),
            rationale: item.rationale.clone(),
            contraindications: item.contraindications.clone(),
            phase_label: item.phase_label.clone(),
        }
    }

    fn from_retest(entry: &RetestEntry) -> Self {
        Self {
            name: entry.name.clone(),
            category: ElementCategory::RetestItem,
            classification: Classification::Section,
            dosage: None,
            timing: entry.timing.clone(),
            rationale: entry.rationale.clone(),
            contraindications: Vec::new(),
            phase_label: None,
        }
    }
}

/// Kind of safety constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// A phase's entry gate.
    Structural,
    Absolute,
    Monitoring,
    Warning,
}

/// A safety statement carried alongside the elements. Informational only:
/// it takes no part in alignment decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyConstraint {
    pub kind: ConstraintKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_label: Option<String>,
}

/// Every element of a protocol, bucketed by category, plus its safety
/// constraints. Lists keep protocol order and keep duplicate names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedElementSet {
    #[serde(default)]
    pub supplements: Vec<ExtractedElement>,
    #[serde(default)]
    pub clinic_treatments: Vec<ExtractedElement>,
    #[serde(default)]
    pub lifestyle_protocols: Vec<ExtractedElement>,
    #[serde(default)]
    pub retest_items: Vec<ExtractedElement>,
    #[serde(default)]
    pub safety_constraints: Vec<SafetyConstraint>,
}

impl ExtractedElementSet {
    pub fn by_category(&self, category: ElementCategory) -> &[ExtractedElement] {
        match category {
            ElementCategory::Supplement => &self.supplements,
            ElementCategory::ClinicTreatment => &self.clinic_treatments,
            ElementCategory::LifestyleProtocol => &self.lifestyle_protocols,
            ElementCategory::RetestItem => &self.retest_items,
        }
    }

    fn bucket_mut(&mut self, category: ElementCategory) -> &mut Vec<ExtractedElement> {
        match category {
            ElementCategory::Supplement => &mut self.supplements,
            ElementCategory::ClinicTreatment => &mut self.clinic_treatments,
            ElementCategory::LifestyleProtocol => &mut self.lifestyle_protocols,
            ElementCategory::RetestItem => &mut self.retest_items,
        }
    }

    /// Element names of one category, in order.
    pub fn names(&self, category: ElementCategory) -> Vec<&str> {
        self.by_category(category)
            .iter()
            .map(|e| e.name.as_str())
            .collect()
    }

    /// Number of elements per category.
    pub fn counts(&self) -> PerCategory<usize> {
        PerCategory::from_fn(|c| self.by_category(c).len())
    }

    /// Total elements across the four categories.
    pub fn total_elements(&self) -> usize {
        ElementCategory::ALL
            .iter()
            .map(|c| self.by_category(*c).len())
            .sum()
    }

    /// SHA-256 of the canonical JSON form, hex-encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        // Serializing plain data structs into a Vec cannot fail.
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(&bytes);
        }
        hex::encode(hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract every actionable element from a protocol.
///
/// Never fails: missing or unreadable blocks contribute nothing. Explicit
/// category tags decide an item's bucket; untagged items go through
/// [`category::infer_legacy_category`]. Clinic modalities are always clinic
/// treatments and retest entries always retest items.
pub fn extract(doc: &ProtocolDocument) -> ExtractedElementSet {
    let normalized = protocol::normalize(doc);
    let mut set = ExtractedElementSet::default();
    let mut inferred = 0usize;

    for section in &normalized.sections {
        match section {
            Section::Phase(phase) => {
                for item in &phase.items {
                    let (category, how) = category::classify(&item.name, item.category.as_deref());
                    if how == Classification::Inferred {
                        inferred += 1;
                        tracing::debug!(
                            item = %item.name,
                            tag = item.category.as_deref().unwrap_or(""),
                            category = %category,
                            "inferred category from item name"
                        );
                    }
                    set.bucket_mut(category)
                        .push(ExtractedElement::from_item(item, category, how));
                }
                for gate in &phase.safety_gates {
                    set.safety_constraints.push(SafetyConstraint {
                        kind: ConstraintKind::Structural,
                        text: gate.clone(),
                        phase_label: Some(phase.label.clone()),
                    });
                }
            }
            Section::Modalities(items) => {
                set.clinic_treatments.extend(items.iter().map(|item| {
                    ExtractedElement::from_item(
                        item,
                        ElementCategory::ClinicTreatment,
                        Classification::Section,
                    )
                }));
            }
            Section::Retests(entries) => {
                set.retest_items
                    .extend(entries.iter().map(ExtractedElement::from_retest));
            }
            Section::Safety(summary) => push_safety_summary(&mut set, summary),
        }
    }

    tracing::debug!(
        shape = %normalized.shape,
        supplements = set.supplements.len(),
        clinic_treatments = set.clinic_treatments.len(),
        lifestyle_protocols = set.lifestyle_protocols.len(),
        retest_items = set.retest_items.len(),
        safety_constraints = set.safety_constraints.len(),
        inferred,
        "extracted protocol elements"
    );

    set
}

fn push_safety_summary(set: &mut ExtractedElementSet, summary: &SafetySummary) {
    let lists = [
        (ConstraintKind::Absolute, &summary.absolute_contraindications),
        (ConstraintKind::Monitoring, &summary.monitoring_requirements),
        (ConstraintKind::Warning, &summary.warning_signs),
    ];
    for (kind, texts) in lists {
        set.safety_constraints
            .extend(texts.iter().map(|text| SafetyConstraint {
                kind,
                text: text.clone(),
                phase_label: None,
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_json(value: serde_json::Value) -> ExtractedElementSet {
        extract(&ProtocolDocument::from_value(value))
    }

    #[test]
    fn empty_document_gives_empty_set() {
        let set = extract_json(json!({}));
        assert_eq!(set, ExtractedElementSet::default());
        assert_eq!(set.total_elements(), 0);
    }

    #[test]
    fn tagged_supplement_in_core_phase() {
        let set = extract_json(json!({
            "core_protocol": { "items": [{ "name": "Magnesium Glycinate", "category": "supplement" }] }
        }));
        assert_eq!(set.names(ElementCategory::Supplement), vec!["Magnesium Glycinate"]);
        assert_eq!(set.supplements[0].classification, Classification::Tagged);
        assert_eq!(set.supplements[0].phase_label.as_deref(), Some("Core Protocol"));
        assert!(set.clinic_treatments.is_empty());
        assert!(set.lifestyle_protocols.is_empty());
        assert!(set.retest_items.is_empty());
    }

    #[test]
    fn untagged_items_use_legacy_inference() {
        let set = extract_json(json!({
            "core_protocol": { "items": ["IV Glutathione", "Hydration protocol", "Zinc"] }
        }));
        assert_eq!(set.names(ElementCategory::ClinicTreatment), vec!["IV Glutathione"]);
        assert_eq!(set.names(ElementCategory::LifestyleProtocol), vec!["Hydration protocol"]);
        assert_eq!(set.names(ElementCategory::Supplement), vec!["Zinc"]);
        assert!(set
            .supplements
            .iter()
            .all(|e| e.classification == Classification::Inferred));
    }

    #[test]
    fn expansion_phases_tag_items_and_gates() {
        let set = extract_json(json!({
            "expansion_phases": [{
                "name": "Phase 2: Detox",
                "items": [{ "name": "Chlorella", "category": "binder" }],
                "safety_gates": ["Normal bowel movements"]
            }]
        }));
        assert_eq!(set.supplements[0].phase_label.as_deref(), Some("Phase 2: Detox"));
        assert_eq!(set.safety_constraints.len(), 1);
        assert_eq!(set.safety_constraints[0].kind, ConstraintKind::Structural);
        assert_eq!(
            set.safety_constraints[0].phase_label.as_deref(),
            Some("Phase 2: Detox")
        );
    }

    #[test]
    fn modalities_retests_and_safety_summary() {
        let set = extract_json(json!({
            "clinic_treatments": { "available_modalities": ["Sauna", { "name": "Lymphatic massage" }] },
            "retest_schedule": [{ "test": "Vitamin D panel", "timing": "week 8" }],
            "safety_summary": {
                "absolute_contraindications": ["Pregnancy"],
                "monitoring_requirements": ["Monthly CMP"],
                "warning_signs": ["Jaundice", "Severe rash"]
            }
        }));
        assert_eq!(
            set.names(ElementCategory::ClinicTreatment),
            vec!["Sauna", "Lymphatic massage"]
        );
        assert!(set
            .clinic_treatments
            .iter()
            .all(|e| e.classification == Classification::Section));
        assert_eq!(set.retest_items[0].timing.as_deref(), Some("week 8"));
        let kinds: Vec<ConstraintKind> = set.safety_constraints.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConstraintKind::Absolute,
                ConstraintKind::Monitoring,
                ConstraintKind::Warning,
                ConstraintKind::Warning
            ]
        );
    }

    #[test]
    fn legacy_modules_are_extracted() {
        let set = extract_json(json!({
            "modules": [
                { "name": "Weeks 1-2", "items": [{ "name": "Probiotic", "category": "supplements" }] },
                { "name": "Week 4", "items": ["Cold plunge", "Sleep schedule"] }
            ]
        }));
        assert_eq!(set.names(ElementCategory::Supplement), vec!["Probiotic"]);
        assert_eq!(set.supplements[0].phase_label.as_deref(), Some("Weeks 1-2"));
        assert_eq!(set.names(ElementCategory::ClinicTreatment), vec!["Cold plunge"]);
        assert_eq!(set.names(ElementCategory::LifestyleProtocol), vec!["Sleep schedule"]);
    }

    #[test]
    fn duplicate_names_across_phases_are_kept() {
        let set = extract_json(json!({
            "core_protocol": { "items": ["Magnesium"] },
            "expansion_phases": [{ "name": "Phase 2", "items": ["Magnesium"] }]
        }));
        assert_eq!(set.supplements.len(), 2);
        assert_ne!(set.supplements[0].phase_label, set.supplements[1].phase_label);
    }

    #[test]
    fn extraction_is_deterministic() {
        let doc = json!({
            "core_protocol": { "items": ["A", "IV B", "Sleep C"] },
            "retest_schedule": ["D"]
        });
        let a = extract_json(doc.clone());
        let b = extract_json(doc);
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let set = extract_json(json!({ "core_protocol": { "items": ["Zinc"] } }));
        let value = serde_json::to_value(&set).unwrap();
        for key in [
            "supplements",
            "clinicTreatments",
            "lifestyleProtocols",
            "retestItems",
            "safetyConstraints",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["supplements"][0]["phaseLabel"], "Core Protocol");
    }

    #[test]
    fn built_document_keeps_item_details() {
        use crate::protocol::CorePhase;

        let doc = ProtocolDocument {
            core_protocol: Some(CorePhase {
                name: None,
                items: vec![
                    ProtocolItem::named("Zinc").category("supplement").dosage("30mg"),
                    ProtocolItem::named("Evening walk")
                        .category("lifestyle")
                        .phase_label("Week 2"),
                ],
            }),
            ..ProtocolDocument::default()
        };
        let set = extract(&doc);
        assert_eq!(set.supplements[0].dosage.as_deref(), Some("30mg"));
        assert_eq!(set.supplements[0].phase_label.as_deref(), Some("Core Protocol"));
        assert_eq!(set.lifestyle_protocols[0].phase_label.as_deref(), Some("Week 2"));
    }

    #[test]
    fn item_with_timing_and_frequency_is_extracted() {
        let set = extract_json(json!({
            "core_protocol": { "items": [
                "Zinc",
                {
                    "name": "Magnesium Glycinate",
                    "category": "supplement",
                    "timing": "evening",
                    "frequency": "daily"
                }
            ] }
        }));
        assert_eq!(
            set.names(ElementCategory::Supplement),
            vec!["Zinc", "Magnesium Glycinate"]
        );
        assert_eq!(set.supplements[1].timing.as_deref(), Some("evening"));
    }

    #[test]
    fn module_with_module_name_and_phase_is_extracted() {
        let set = extract_json(json!({
            "modules": [{
                "module_name": "Gut Reset",
                "phase": "Weeks 1-2",
                "items": ["L-Glutamine", "Elimination diet"]
            }]
        }));
        assert_eq!(set.total_elements(), 2);
        assert_eq!(set.supplements[0].phase_label.as_deref(), Some("Gut Reset"));
    }

    #[test]
    fn both_phase_list_spellings_keep_core_items() {
        let set = extract_json(json!({
            "core_protocol": { "items": ["Zinc"] },
            "phases": [{ "name": "Other", "items": ["Selenium"] }],
            "expansion_phases": [{ "name": "Detox", "items": ["Chlorella"] }]
        }));
        assert_eq!(set.names(ElementCategory::Supplement), vec!["Zinc", "Chlorella"]);
    }
}
