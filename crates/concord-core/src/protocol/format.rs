//! JSON format types for protocol documents.
//!
//! These types map the clinician-authored protocol as stored by the rest of
//! the application. Both the phase-based layout and the legacy flat
//! `modules[]` layout deserialize into the same [`ProtocolDocument`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Keys that may carry each field, most preferred first.
mod keys {
    pub const EXPANSION_PHASES: &[&str] = &["expansion_phases", "phases"];
    pub const PHASE_NAME: &[&str] = &["name", "phase_name", "label", "title"];
    pub const MODULE_NAME: &[&str] = &["name", "module_name", "phase", "title"];

    pub const ITEM_NAME: &[&str] = &["name", "item"];
    pub const ITEM_CATEGORY: &[&str] = &["category", "type"];
    pub const ITEM_DOSAGE: &[&str] = &["dosage", "dose"];
    pub const ITEM_TIMING: &[&str] = &["timing", "frequency"];
    pub const ITEM_PHASE_LABEL: &[&str] = &["phase_label", "phaseLabel", "phase"];

    pub const RETEST_NAME: &[&str] = &["name", "test", "marker"];
    pub const RETEST_TIMING: &[&str] = &["timing", "when", "week"];
}

/// Top-level protocol document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ProtocolDocument {
    /// The core (first) phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_protocol: Option<CorePhase>,
    /// Ordered expansion phases following the core phase.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expansion_phases: Vec<ExpansionPhase>,
    /// In-clinic treatments offered alongside the phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_treatments: Option<ClinicTreatments>,
    /// Lab retests to schedule.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub retest_schedule: Vec<RetestEntry>,
    /// Safety information applying to the whole protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_summary: Option<SafetySummary>,
    /// Legacy flat layout: one module per phase.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<LegacyModule>,
}

impl From<Map<String, Value>> for ProtocolDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            core_protocol: lenient::option_field(&map, &["core_protocol"]),
            expansion_phases: lenient::list_field(&map, keys::EXPANSION_PHASES),
            clinic_treatments: lenient::option_field(&map, &["clinic_treatments"]),
            retest_schedule: lenient::list_field(&map, &["retest_schedule"]),
            safety_summary: lenient::option_field(&map, &["safety_summary"]),
            modules: lenient::list_field(&map, &["modules"]),
        }
    }
}

/// `core_protocol` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct CorePhase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub items: Vec<ProtocolItem>,
}

impl From<Map<String, Value>> for CorePhase {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            name: lenient::text_field(&map, keys::PHASE_NAME),
            items: lenient::list_field(&map, &["items"]),
        }
    }
}

/// One `expansion_phases[]` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ExpansionPhase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub items: Vec<ProtocolItem>,
    /// Conditions that must hold before the phase may start.
    pub safety_gates: Vec<TextEntry>,
}

impl From<Map<String, Value>> for ExpansionPhase {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            name: lenient::text_field(&map, keys::PHASE_NAME),
            items: lenient::list_field(&map, &["items"]),
            safety_gates: lenient::list_field(&map, &["safety_gates"]),
        }
    }
}

/// `clinic_treatments` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicTreatments {
    #[serde(default, deserialize_with = "lenient::list")]
    pub available_modalities: Vec<ProtocolItem>,
}

/// `safety_summary` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetySummary {
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub absolute_contraindications: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub monitoring_requirements: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub warning_signs: Vec<String>,
}

/// One `modules[]` entry of the legacy layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct LegacyModule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub items: Vec<ProtocolItem>,
}

impl From<Map<String, Value>> for LegacyModule {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            name: lenient::text_field(&map, keys::MODULE_NAME),
            items: lenient::list_field(&map, &["items"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A single actionable element of the protocol.
///
/// Deserializes from either a bare string (the name) or an object. Objects
/// without a usable name are rejected, which the enclosing lenient list turns
/// into a skipped entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ProtocolItem {
    pub name: String,
    /// Advisory category tag; inferred from the name when absent or unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contraindications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_label: Option<String>,
}

impl ProtocolItem {
    /// Item with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the category tag.
    pub fn category(mut self, tag: impl Into<String>) -> Self {
        self.category = Some(tag.into());
        self
    }

    /// Set the dosage.
    pub fn dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = Some(dosage.into());
        self
    }

    /// Set the phase label.
    pub fn phase_label(mut self, label: impl Into<String>) -> Self {
        self.phase_label = Some(label.into());
        self
    }
}

impl TryFrom<Value> for ProtocolItem {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => {
                let name = lenient::text_field(&map, keys::ITEM_NAME)
                    .ok_or_else(|| "protocol item has no name".to_owned())?;
                Ok(Self {
                    name,
                    category: lenient::text_field(&map, keys::ITEM_CATEGORY),
                    dosage: lenient::text_field(&map, keys::ITEM_DOSAGE),
                    timing: lenient::text_field(&map, keys::ITEM_TIMING),
                    rationale: lenient::text_field(&map, &["rationale"]),
                    contraindications: lenient::text_list_field(&map, &["contraindications"]),
                    phase_label: lenient::text_field(&map, keys::ITEM_PHASE_LABEL),
                })
            }
            Value::String(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err("protocol item name is blank".to_owned());
                }
                Ok(Self::named(name))
            }
            _ => Err("protocol item must be a string or an object".to_owned()),
        }
    }
}

/// One `retest_schedule[]` entry: a bare test name or an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct RetestEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl TryFrom<Value> for RetestEntry {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self {
                name: lenient::text_field(&map, keys::RETEST_NAME)
                    .ok_or_else(|| "retest entry has no test name".to_owned())?,
                timing: lenient::text_field(&map, keys::RETEST_TIMING),
                rationale: lenient::text_field(&map, &["rationale"]),
            }),
            Value::String(name) if !name.trim().is_empty() => Ok(Self {
                name: name.trim().to_owned(),
                ..Self::default()
            }),
            _ => Err("retest entry is blank".to_owned()),
        }
    }
}

/// A free-text entry that may be written as a string or as an object with a
/// `text`/`description`/`gate`/`name` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct TextEntry(pub String);

impl TryFrom<Value> for TextEntry {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let text = match &value {
            Value::Object(map) => ["text", "description", "gate", "name"]
                .iter()
                .find_map(|key| map.get(*key).and_then(lenient::text_from_value)),
            other => lenient::text_from_value(other),
        };
        text.map(TextEntry)
            .ok_or_else(|| "entry has no readable text".to_owned())
    }
}

impl From<TextEntry> for String {
    fn from(entry: TextEntry) -> Self {
        entry.0
    }
}
