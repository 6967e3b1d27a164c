//! Slot values and well-known slot names.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Accumulated facts for one conversation, keyed by slot name.
pub type Slots = BTreeMap<String, SlotValue>;

/// Well-known slot names.
pub mod names {
    pub const SYMPTOM: &str = "symptom";
    pub const SYMPTOMS: &str = "symptoms";
    pub const ACCOMPANYING_SYMPTOMS: &str = "accompanying_symptoms";
    pub const AGE_MONTHS: &str = "age_months";
    pub const WEIGHT_KG: &str = "weight_kg";
    pub const TEMPERATURE: &str = "temperature";
    pub const DURATION: &str = "duration";
    pub const MENTAL_STATE: &str = "mental_state";

    /// Slots maintained as de-duplicated unions rather than overwritten.
    pub const LIST_SLOTS: [&str; 2] = [SYMPTOMS, ACCOMPANYING_SYMPTOMS];

    pub fn is_list_slot(name: &str) -> bool {
        LIST_SLOTS.contains(&name)
    }
}

/// Tokens an extractor emits when it has nothing to say.
const PLACEHOLDERS: &[&str] = &[
    "unknown",
    "n/a",
    "na",
    "none given",
    "not specified",
    "unspecified",
    "unclear",
    "null",
    "未知",
    "不知道",
    "不清楚",
    "未提及",
    "未说明",
    "不详",
    "无",
];

/// Returns true for empty or placeholder text.
pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str())
}

/// A single slot value: scalar or list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl SlotValue {
    /// Converts an extracted JSON value, dropping empty and placeholder values.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(Self::Flag(*b)),
            JsonValue::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(Self::Number),
            JsonValue::String(s) => {
                if is_placeholder(s) {
                    None
                } else {
                    Some(Self::Text(s.trim().to_string()))
                }
            }
            JsonValue::Array(items) => {
                let mut list: Vec<String> = Vec::new();
                for item in items {
                    if let Some(text) = Self::from_json(item).map(|v| v.to_text()) {
                        if !is_placeholder(&text) && !list.contains(&text) {
                            list.push(text);
                        }
                    }
                }
                if list.is_empty() {
                    None
                } else {
                    Some(Self::List(list))
                }
            }
            JsonValue::Object(map) => {
                if map.is_empty() {
                    None
                } else {
                    Some(Self::Text(value.to_string()))
                }
            }
        }
    }

    /// Renders the value as plain text; lists are comma-joined.
    pub fn to_text(&self) -> String {
        match self {
            Self::Flag(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }

    /// Coerces the value to a sequence: scalars become a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            other => vec![other.to_text()],
        }
    }

    /// Returns true for empty text or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Case-insensitive equality; a list matches if any element does.
    /// Numeric text compares by value, so "38.0" matches "38".
    pub fn matches_exact(&self, expected: &str) -> bool {
        let expected = expected.trim().to_lowercase();
        match self {
            Self::List(items) => items.iter().any(|item| text_matches(item, &expected)),
            Self::Number(n) => {
                format_number(*n) == expected
                    || expected.parse::<f64>().map(|e| e == *n).unwrap_or(false)
            }
            other => text_matches(&other.to_text(), &expected),
        }
    }
}

fn text_matches(actual: &str, expected: &str) -> bool {
    let actual = actual.trim().to_lowercase();
    if actual == expected {
        return true;
    }
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(e)) => a == e,
        _ => false,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholders_are_detected_case_insensitively() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("  "));
        assert!(is_placeholder("Unknown"));
        assert!(is_placeholder("N/A"));
        assert!(is_placeholder("Not Specified"));
        assert!(is_placeholder("不清楚"));
        assert!(!is_placeholder("fever"));
    }

    #[test]
    fn from_json_drops_empty_values() {
        assert_eq!(SlotValue::from_json(&json!(null)), None);
        assert_eq!(SlotValue::from_json(&json!("")), None);
        assert_eq!(SlotValue::from_json(&json!([])), None);
        assert_eq!(SlotValue::from_json(&json!({})), None);
        assert_eq!(SlotValue::from_json(&json!("unclear")), None);
        assert_eq!(SlotValue::from_json(&json!(["unknown", ""])), None);
    }

    #[test]
    fn from_json_keeps_scalars_and_dedupes_lists() {
        assert_eq!(SlotValue::from_json(&json!(2)), Some(SlotValue::Number(2.0)));
        assert_eq!(
            SlotValue::from_json(&json!(" 38.5 ")),
            Some(SlotValue::Text("38.5".to_string()))
        );
        assert_eq!(
            SlotValue::from_json(&json!(["cough", "rash", "cough", "n/a"])),
            Some(SlotValue::List(vec!["cough".to_string(), "rash".to_string()]))
        );
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(SlotValue::Number(2.0).to_text(), "2");
        assert_eq!(SlotValue::Number(38.5).to_text(), "38.5");
    }

    #[test]
    fn exact_match_ignores_case_and_checks_list_members() {
        assert!(SlotValue::Text("Normal".to_string()).matches_exact("normal"));
        assert!(SlotValue::List(vec!["Rash".to_string()]).matches_exact("rash"));
        assert!(SlotValue::Number(3.0).matches_exact("3"));
        assert!(SlotValue::Number(3.0).matches_exact("3.0"));
        assert!(!SlotValue::Flag(true).matches_exact("yes"));
    }

    #[test]
    fn untagged_serde_round_trip() {
        let values = vec![
            SlotValue::Flag(false),
            SlotValue::Number(12.25),
            SlotValue::Text("lethargic".to_string()),
            SlotValue::List(vec!["cough".to_string()]),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: SlotValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn numeric_text_matches_by_value() {
        let text = SlotValue::Text("38.0".to_string());
        assert!(text.matches_exact("38"));
        assert!(!text.matches_exact("38.5"));

        let list = SlotValue::List(vec!["rash".to_string(), "3".to_string()]);
        assert!(list.matches_exact("3.0"));
        assert!(!SlotValue::Text("high".to_string()).matches_exact("38"));
    }
}
