//! Shared test fixtures for concord integration tests.
//!
//! Protocol and plan documents are built as `serde_json::Value`s so tests can
//! tweak them before handing them to the engine.

use serde_json::{Value, json};

use concord_core::{EngagementPlanDraft, ExtractedElementSet, ProtocolDocument, extract};

/// A phased protocol covering every category and a safety summary.
///
/// Elements:
/// - supplements: Magnesium Glycinate (core), Vitamin D3 (core),
///   Omega-3 Fish Oil (Phase 2)
/// - clinic treatments: IV Vitamin C (Phase 2 modality), HBOT (modality list)
/// - lifestyle: Daily walk (core), Sleep hygiene (Phase 3)
/// - retests: hs-CRP (week 8), Vitamin D 25-OH (week 12)
pub fn phased_protocol() -> Value {
    json!({
        "core_protocol": {
            "name": "Foundation",
            "items": [
                { "name": "Magnesium Glycinate", "category": "supplement", "dosage": "400mg", "timing": "evening" },
                { "name": "Vitamin D3", "category": "supplement", "dosage": "5000 IU" },
                { "name": "Daily walk", "category": "lifestyle" }
            ]
        },
        "expansion_phases": [
            {
                "name": "Phase 2: Weeks 3-4",
                "items": [
                    { "name": "Omega-3 Fish Oil", "category": "supplement" },
                    { "name": "IV Vitamin C", "category": "clinic_treatment" }
                ],
                "safety_gates": ["Confirm kidney function before IV therapy"]
            },
            {
                "name": "Phase 3: Month 2",
                "items": [
                    { "name": "Sleep hygiene", "category": "lifestyle" }
                ]
            }
        ],
        "clinic_treatments": { "available_modalities": ["HBOT"] },
        "retest_schedule": [
            { "name": "hs-CRP", "timing": "week 8" },
            { "name": "Vitamin D 25-OH", "timing": "week 12" }
        ],
        "safety_summary": {
            "absolute_contraindications": ["Pregnancy"],
            "monitoring_requirements": ["Blood pressure weekly"],
            "warning_signs": ["Palpitations"]
        }
    })
}

/// A legacy module-shaped protocol; categories come from keyword inference.
pub fn legacy_protocol() -> Value {
    json!({
        "modules": [
            {
                "name": "Gut Reset",
                "items": ["L-Glutamine", "Elimination diet", "Zinc Carnosine"]
            },
            {
                "name": "Detox Support",
                "items": ["Infrared Sauna sessions", "NAD+ infusion", "Hydration target"]
            }
        ]
    })
}

/// A plan draft with `count` empty phases named `Phase 1..=count`.
pub fn plan_with_phases(count: usize) -> Value {
    let phases: Vec<Value> = (1..=count)
        .map(|n| {
            json!({
                "name": format!("Phase {n}"),
                "supplements": [],
                "clinicTreatments": [],
                "lifestyleActions": [],
                "items": []
            })
        })
        .collect();
    json!({ "phases": phases, "retestSchedule": [] })
}

/// A plan draft that mentions every element of [`phased_protocol`].
pub fn aligned_plan() -> Value {
    json!({
        "phases": [
            {
                "name": "Weeks 1-2",
                "supplements": ["Magnesium glycinate 400mg", "Vitamin D 5000 IU"],
                "lifestyleActions": ["Daily walk after dinner"]
            },
            {
                "name": "Weeks 3-4",
                "supplements": ["Fish oil"],
                "clinicTreatments": ["IV vitamin C"]
            },
            {
                "name": "Month 2",
                "clinicTreatments": ["Hyperbaric oxygen"],
                "lifestyleActions": ["Sleep hygiene routine"]
            }
        ],
        "retestSchedule": [
            { "name": "hs-CRP", "timing": "week 8" },
            { "name": "Vitamin D 25-OH", "timing": "week 12" }
        ]
    })
}

/// Parse a protocol value and extract its elements.
pub fn elements_of(protocol: Value) -> ExtractedElementSet {
    extract(&ProtocolDocument::from_value(protocol))
}

/// Wrap a plan value as a draft.
pub fn draft(plan: Value) -> EngagementPlanDraft {
    EngagementPlanDraft::from(plan)
}
