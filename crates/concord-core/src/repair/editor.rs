//! In-place edits on an untrusted plan draft value.
//!
//! Shapes are coerced only where an injection needs them: a non-object root
//! becomes an empty plan, a missing or `null` list becomes `[]`, a scalar
//! where a list belongs becomes a one-element list, and a non-object phase
//! becomes `{ "name": <its text> }`.

use serde_json::{Map, Value, json};

use crate::plan::fields;

/// Name of the phase added to drafts that have none.
pub const FALLBACK_PHASE_NAME: &str = "Protocol Alignment";

pub(crate) struct PlanEditor<'a> {
    root: &'a mut Value,
}

impl<'a> PlanEditor<'a> {
    pub(crate) fn new(value: &'a mut Value) -> Self {
        if !value.is_object() {
            if !value.is_null() {
                tracing::warn!("plan draft is not a JSON object; replacing with an empty plan");
            }
            *value = json!({ fields::PHASES: [], fields::RETEST_SCHEDULE: [] });
        }
        Self { root: value }
    }

    /// Clamp a wanted phase index to the phases that exist, adding a fallback
    /// phase first when the draft has none.
    pub(crate) fn clamp_phase(&mut self, wanted: usize) -> usize {
        let Some(phases) = self.phases_mut() else {
            return 0;
        };
        if phases.is_empty() {
            tracing::debug!("plan draft has no phases; adding {FALLBACK_PHASE_NAME:?}");
            phases.push(json!({
                fields::NAME: FALLBACK_PHASE_NAME,
                fields::SUPPLEMENTS: [],
                fields::CLINIC_TREATMENTS: [],
                fields::LIFESTYLE_ACTIONS: [],
                fields::ITEMS: [],
            }));
        }
        wanted.min(phases.len() - 1)
    }

    /// Append `entry` to the list field `field` of phase `index`.
    ///
    /// `index` must come from [`PlanEditor::clamp_phase`].
    pub(crate) fn push_to_phase(&mut self, index: usize, field: &str, entry: Value) {
        let Some(phase) = self.phases_mut().and_then(|phases| phases.get_mut(index)) else {
            tracing::warn!(index, "phase index out of range; entry dropped");
            return;
        };
        let Some(list) = object_mut(phase).and_then(|phase| list_mut(phase, field)) else {
            tracing::warn!(index, field, "phase field is not editable; entry dropped");
            return;
        };
        list.push(entry);
    }

    /// Append `entry` to the top-level list field `field`.
    pub(crate) fn push_to_root(&mut self, field: &str, entry: Value) {
        let Some(list) = self.root.as_object_mut().and_then(|root| list_mut(root, field)) else {
            tracing::warn!(field, "plan field is not editable; entry dropped");
            return;
        };
        list.push(entry);
    }

    fn phases_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.root
            .as_object_mut()
            .and_then(|root| list_mut(root, fields::PHASES))
    }
}

/// The list at `field`, created or wrapped into a list as needed.
fn list_mut<'m>(map: &'m mut Map<String, Value>, field: &str) -> Option<&'m mut Vec<Value>> {
    let slot = map.entry(field.to_owned()).or_insert(Value::Null);
    if !slot.is_array() {
        *slot = match slot.take() {
            Value::Null => Value::Array(Vec::new()),
            other => {
                tracing::debug!(field, "wrapping scalar draft field into a list");
                Value::Array(vec![other])
            }
        };
    }
    slot.as_array_mut()
}

fn object_mut(value: &mut Value) -> Option<&mut Map<String, Value>> {
    if !value.is_object() {
        let name = match value.take() {
            Value::String(s) => Value::String(s),
            Value::Null => Value::Null,
            other => Value::String(other.to_string()),
        };
        let mut map = Map::new();
        if !name.is_null() {
            map.insert(fields::NAME.to_owned(), name);
        }
        *value = Value::Object(map);
    }
    value.as_object_mut()
}
