//! Session record codec and read-path schema migration.
//!
//! Version 1 records stored the triage outcome as flat `triage_level`,
//! `triage_reason` and `triage_action` fields. Version 2 stores a single
//! `triage_snapshot`. Records are upgraded here, on every read, before they
//! are turned into a [`SessionState`]; storage is never rewritten in place.

use once_cell::sync::Lazy;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::{UpcastError, Upcaster, UpcasterRegistry};
use crate::domain::triage::TriageLevel;

use super::state::{SessionState, CURRENT_SCHEMA_VERSION};

const LEGACY_LEVEL: &str = "triage_level";
const LEGACY_REASON: &str = "triage_reason";
const LEGACY_ACTION: &str = "triage_action";

/// Errors decoding a persisted session record.
#[derive(Debug, Error)]
pub enum RecordDecodeError {
    #[error("record is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("record could not be upgraded: {0}")]
    Upcast(#[from] UpcastError),

    #[error("upgraded record does not match the session schema: {0}")]
    Schema(#[source] serde_json::Error),
}

/// v1 → v2: fold the flat triage fields into a `triage_snapshot`.
pub struct LegacyTriageFieldsUpcaster;

impl Upcaster for LegacyTriageFieldsUpcaster {
    fn source_version(&self) -> u32 {
        1
    }

    fn upcast(&self, mut record: JsonValue) -> Result<JsonValue, UpcastError> {
        let obj = record
            .as_object_mut()
            .ok_or_else(|| UpcastError::InvalidValue("record is not an object".to_string()))?;

        let level = obj.remove(LEGACY_LEVEL).filter(|v| !v.is_null());
        let reason = obj.remove(LEGACY_REASON).filter(|v| !v.is_null());
        let action = obj.remove(LEGACY_ACTION).filter(|v| !v.is_null());

        let has_snapshot = obj
            .get("triage_snapshot")
            .map(|v| !v.is_null())
            .unwrap_or(false);

        if has_snapshot {
            return Ok(record);
        }

        let Some(level) = level else {
            return Ok(record);
        };

        let level_text = level
            .as_str()
            .ok_or_else(|| UpcastError::InvalidValue(format!("{}: {}", LEGACY_LEVEL, level)))?;
        let level: TriageLevel = level_text
            .parse()
            .map_err(|_| UpcastError::InvalidValue(format!("{}: {}", LEGACY_LEVEL, level_text)))?;

        let decided_at = obj
            .get("updated_at")
            .or_else(|| obj.get("created_at"))
            .cloned()
            .ok_or_else(|| UpcastError::MissingField("updated_at".to_string()))?;

        obj.insert(
            "triage_snapshot".to_string(),
            json!({
                "level": level,
                "reason": text_or_empty(reason),
                "action": text_or_empty(action),
                "decided_at": decided_at,
            }),
        );

        Ok(record)
    }
}

fn text_or_empty(value: Option<JsonValue>) -> String {
    match value {
        Some(JsonValue::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

static SESSION_UPCASTERS: Lazy<UpcasterRegistry> = Lazy::new(|| {
    let mut registry = UpcasterRegistry::new(CURRENT_SCHEMA_VERSION);
    registry.register(Arc::new(LegacyTriageFieldsUpcaster));
    registry
});

/// Serializes a session in the current schema.
pub fn encode_session(state: &SessionState) -> Result<String, serde_json::Error> {
    serde_json::to_string(state)
}

/// Parses a persisted record of any supported version.
pub fn decode_session(raw: &str) -> Result<SessionState, RecordDecodeError> {
    let record: JsonValue = serde_json::from_str(raw).map_err(RecordDecodeError::Malformed)?;
    let upgraded = SESSION_UPCASTERS.upcast_to_current(record)?;
    serde_json::from_value(upgraded).map_err(RecordDecodeError::Schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::{DialogueState, Intent};
    use crate::domain::foundation::{ConversationId, UserId};
    use crate::domain::session::SlotValue;
    use crate::domain::triage::Decision;

    fn populated_state() -> SessionState {
        let mut state = SessionState::new(
            ConversationId::new("conv-9").unwrap(),
            UserId::new("user-9").unwrap(),
        );
        state.begin_turn();
        state.dialogue_state = DialogueState::TriageComplete;
        state.current_intent = Some(Intent::SlotFilling);
        state.record_chief_complaint("孩子发烧两天了");
        state.symptom = Some("fever".to_string());
        state
            .slots
            .insert("age_months".to_string(), SlotValue::Number(18.0));
        state.slots.insert(
            "accompanying_symptoms".to_string(),
            SlotValue::List(vec!["cough".to_string()]),
        );
        state
            .slots
            .insert("temperature".to_string(), SlotValue::Text("38.6".to_string()));
        state.record_decision(&Decision::new(
            TriageLevel::Outpatient,
            "fever without warning signs",
            "see a pediatrician within 24 hours",
        ));
        state
    }

    #[test]
    fn current_records_round_trip_exactly() {
        let state = populated_state();
        let raw = encode_session(&state).unwrap();
        let decoded = decode_session(&raw).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn legacy_flat_fields_become_a_snapshot() {
        let raw = r#"{
            "conversation_id": "conv-old",
            "user_id": "user-old",
            "dialogue_state": "TRIAGE_COMPLETE",
            "current_intent": "TRIAGE",
            "symptom": "fever",
            "slots": {"age_months": 30, "temperature": "39"},
            "triage_level": "紧急",
            "triage_reason": "high fever",
            "triage_action": "go to the ER",
            "turn_count": 4,
            "created_at": "2024-01-01T08:00:00Z",
            "updated_at": "2024-01-01T09:30:00Z"
        }"#;

        let state = decode_session(raw).unwrap();
        let snapshot = state.triage_snapshot().unwrap();

        assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(snapshot.level(), TriageLevel::Emergency);
        assert_eq!(snapshot.reason(), "high fever");
        assert_eq!(snapshot.action(), "go to the ER");
        assert_eq!(snapshot.decided_at(), state.updated_at);
        assert_eq!(state.turn_count(), 4);
        assert_eq!(state.triage_level(), Some(TriageLevel::Emergency));
    }

    #[test]
    fn upgraded_legacy_record_round_trips() {
        let raw = r#"{
            "conversation_id": "conv-old",
            "user_id": "user-old",
            "triage_level": "outpatient",
            "created_at": "2024-01-01T08:00:00Z",
            "updated_at": "2024-01-01T09:30:00Z"
        }"#;

        let upgraded = decode_session(raw).unwrap();
        let again = decode_session(&encode_session(&upgraded).unwrap()).unwrap();

        assert_eq!(again, upgraded);
        assert_eq!(again.triage_snapshot().unwrap().reason(), "");
    }

    #[test]
    fn legacy_record_without_decision_has_no_snapshot() {
        let raw = r#"{
            "conversation_id": "c",
            "user_id": "u",
            "triage_level": null,
            "created_at": "2024-01-01T08:00:00Z",
            "updated_at": "2024-01-01T08:00:00Z"
        }"#;

        let state = decode_session(raw).unwrap();
        assert!(state.triage_snapshot().is_none());
        assert_eq!(state.dialogue_state, DialogueState::Initial);
    }

    #[test]
    fn unknown_legacy_level_is_rejected() {
        let raw = r#"{
            "conversation_id": "c",
            "user_id": "u",
            "triage_level": "sometime",
            "created_at": "2024-01-01T08:00:00Z",
            "updated_at": "2024-01-01T08:00:00Z"
        }"#;

        assert!(matches!(
            decode_session(raw),
            Err(RecordDecodeError::Upcast(UpcastError::InvalidValue(_)))
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            decode_session("{not json"),
            Err(RecordDecodeError::Malformed(_))
        ));
    }
}
