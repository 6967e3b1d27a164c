//! Entity merging.
//!
//! Folds the entities an extractor returned for one message into the
//! accumulated slots of a session. Pure apart from mutating the state passed
//! in; merging the same entities twice leaves the slots unchanged.

use once_cell::sync::Lazy;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::slots::{names, SlotValue};
use super::state::SessionState;

/// Colloquial and localized labels mapped to canonical symptom names.
static SYMPTOM_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("发烧", "fever"),
        ("发热", "fever"),
        ("高烧", "fever"),
        ("低烧", "fever"),
        ("fever", "fever"),
        ("pyrexia", "fever"),
        ("咳嗽", "cough"),
        ("cough", "cough"),
        ("coughing", "cough"),
        ("呕吐", "vomiting"),
        ("吐", "vomiting"),
        ("vomit", "vomiting"),
        ("vomiting", "vomiting"),
        ("腹泻", "diarrhea"),
        ("拉肚子", "diarrhea"),
        ("diarrhoea", "diarrhea"),
        ("diarrhea", "diarrhea"),
        ("皮疹", "rash"),
        ("出疹", "rash"),
        ("rash", "rash"),
    ])
});

/// Normalizes a free-text symptom label to its canonical name.
pub fn normalize_symptom(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    SYMPTOM_ALIASES
        .get(lowered.as_str())
        .map(|canonical| canonical.to_string())
        .unwrap_or(lowered)
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeDelta {
    /// Slot keys whose stored value changed, in key order.
    pub changed_slots: Vec<String>,
    /// True if the primary symptom changed.
    pub symptom_changed: bool,
}

impl MergeDelta {
    pub fn is_empty(&self) -> bool {
        self.changed_slots.is_empty() && !self.symptom_changed
    }
}

/// Merges newly extracted entities into the session's slots.
///
/// - empty and placeholder values are ignored
/// - list slots take the union of old and new values
/// - every other slot is last-write-wins
///
/// An explicit `symptom` entity overwrites the primary symptom; otherwise the
/// first entry of the symptom list seeds it when still unset.
pub fn merge_entities(state: &mut SessionState, entities: &Map<String, JsonValue>) -> MergeDelta {
    let mut delta = MergeDelta::default();
    let mut explicit_symptom: Option<String> = None;

    for (key, raw) in entities {
        let Some(incoming) = SlotValue::from_json(raw) else {
            continue;
        };

        if key == names::SYMPTOM {
            if let Some(first) = incoming.to_list().into_iter().next() {
                explicit_symptom = Some(normalize_symptom(&first));
            }
        }

        let merged = if names::is_list_slot(key) {
            let mut union = state
                .slots
                .get(key)
                .map(SlotValue::to_list)
                .unwrap_or_default();
            for item in incoming.to_list() {
                if !union.contains(&item) {
                    union.push(item);
                }
            }
            SlotValue::List(union)
        } else {
            incoming
        };

        if state.slots.get(key) != Some(&merged) {
            state.slots.insert(key.clone(), merged);
            delta.changed_slots.push(key.clone());
        }
    }

    let next_symptom = match explicit_symptom {
        Some(symptom) => Some(symptom),
        None if !state.has_symptom() => state
            .slots
            .get(names::SYMPTOMS)
            .and_then(|v| v.to_list().into_iter().next())
            .map(|first| normalize_symptom(&first)),
        None => None,
    };

    if let Some(symptom) = next_symptom {
        if state.symptom.as_deref() != Some(symptom.as_str()) {
            state.symptom = Some(symptom);
            delta.symptom_changed = true;
        }
    }

    state.touch();
    delta
}
