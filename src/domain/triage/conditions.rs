//! Slot conditions used by danger rules, decision rules and relaxation rules.
//!
//! On disk a condition is either a literal (exact match) or an object with
//! any of `lt`, `lte`, `gt`, `gte` and `contains`. Several keys in one object
//! must all hold.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::domain::session::{SlotValue, Slots};

use super::normalize::normalize_slot_number;

/// A single comparison inside an object condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Lt(f64),
    Lte(f64),
    Gt(f64),
    Gte(f64),
    Contains(String),
}

/// A condition over one slot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "JsonValue")]
pub enum Condition {
    /// Case-insensitive equality; list slots match on any element.
    Equals(String),
    /// Conjunction of comparisons.
    Compare(Vec<Comparison>),
}

/// Conditions keyed by slot name; all must hold.
pub type ConditionSet = BTreeMap<String, Condition>;

impl TryFrom<JsonValue> for Condition {
    type Error = String;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(s) => Ok(Self::Equals(s)),
            JsonValue::Number(n) => Ok(Self::Equals(n.to_string())),
            JsonValue::Bool(b) => Ok(Self::Equals(b.to_string())),
            JsonValue::Object(map) => {
                if map.is_empty() {
                    return Err("condition object has no operators".to_string());
                }
                let mut comparisons = Vec::with_capacity(map.len());
                for (op, operand) in map {
                    comparisons.push(parse_comparison(&op, operand)?);
                }
                Ok(Self::Compare(comparisons))
            }
            other => Err(format!("unsupported condition: {}", other)),
        }
    }
}

fn parse_comparison(op: &str, operand: JsonValue) -> Result<Comparison, String> {
    if op == "contains" {
        return match operand {
            JsonValue::String(s) => Ok(Comparison::Contains(s)),
            other => Err(format!("'contains' expects a string, got {}", other)),
        };
    }

    let bound = match &operand {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("'{}' expects a number, got {}", op, operand))?;

    match op {
        "lt" => Ok(Comparison::Lt(bound)),
        "lte" => Ok(Comparison::Lte(bound)),
        "gt" => Ok(Comparison::Gt(bound)),
        "gte" => Ok(Comparison::Gte(bound)),
        other => Err(format!("unknown condition operator '{}'", other)),
    }
}

impl Condition {
    /// Parses a condition from a JSON literal.
    pub fn parse(value: JsonValue) -> Result<Self, String> {
        Self::try_from(value)
    }

    /// Evaluates the condition against one slot. Absent or unparseable
    /// values never match.
    pub fn matches(&self, slot: &str, value: Option<&SlotValue>) -> bool {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return false;
        };

        match self {
            Self::Equals(expected) => value.matches_exact(expected),
            Self::Compare(comparisons) => comparisons
                .iter()
                .all(|comparison| comparison.holds(slot, value)),
        }
    }
}

impl Comparison {
    fn holds(&self, slot: &str, value: &SlotValue) -> bool {
        if let Self::Contains(needle) = self {
            let needle = needle.to_lowercase();
            return value
                .to_list()
                .iter()
                .any(|item| item.to_lowercase().contains(&needle));
        }

        let Some(actual) = normalize_slot_number(slot, value) else {
            return false;
        };

        match self {
            Self::Lt(bound) => actual < *bound,
            Self::Lte(bound) => actual <= *bound,
            Self::Gt(bound) => actual > *bound,
            Self::Gte(bound) => actual >= *bound,
            Self::Contains(_) => false,
        }
    }
}

/// True if every condition holds against `slots`. An empty set holds.
pub fn all_conditions_hold(conditions: &ConditionSet, slots: &Slots) -> bool {
    conditions
        .iter()
        .all(|(slot, condition)| condition.matches(slot, slots.get(slot)))
}
