//! Rule tables: danger signals, per-symptom decision rules and slot
//! definitions.
//!
//! Tables are loaded once at startup from a rules directory:
//!
//! ```text
//! <dir>/danger_signals.json
//! <dir>/slot_definitions.json
//! <dir>/rules/<symptom>.json
//! ```
//!
//! YAML (`.yaml` / `.yml`) is accepted in place of JSON. A missing or
//! unreadable table falls back to the built-in defaults for that table only.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::conditions::ConditionSet;
use super::decision::Decision;

/// Errors loading a rule table.
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("rule table not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

// ============================================
// Danger signals
// ============================================

/// Keyword rule checked against every symptom.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordDangerRule {
    pub keywords: Vec<String>,
    pub alert_message: String,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// Condition rule checked only for its symptom.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionDangerRule {
    pub conditions: ConditionSet,
    pub alert_message: String,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// The danger-signal table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DangerSignalTable {
    #[serde(default)]
    pub universal: Vec<KeywordDangerRule>,
    #[serde(default)]
    pub symptom_specific: BTreeMap<String, Vec<ConditionDangerRule>>,
}

impl DangerSignalTable {
    /// Orders every rule list by priority; ties and unprioritized rules
    /// keep their listed position.
    pub fn sorted(mut self) -> Self {
        order_by_priority(&mut self.universal, |r| r.priority);
        for rules in self.symptom_specific.values_mut() {
            order_by_priority(rules, |r| r.priority);
        }
        self
    }

    pub fn rules_for(&self, symptom: &str) -> &[ConditionDangerRule] {
        self.symptom_specific
            .get(symptom)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn order_by_priority<T>(rules: &mut Vec<T>, priority: impl Fn(&T) -> Option<i64>) {
    let mut keyed: Vec<(i64, T)> = rules
        .drain(..)
        .enumerate()
        .map(|(index, rule)| (priority(&rule).unwrap_or(index as i64), rule))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    rules.extend(keyed.into_iter().map(|(_, rule)| rule));
}

// ============================================
// Decision rules
// ============================================

/// One prioritized decision rule for a symptom.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymptomRule {
    pub priority: i64,
    #[serde(default)]
    pub conditions: ConditionSet,
    pub decision: Decision,
}

/// Contents of `rules/<symptom>.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SymptomRuleFile {
    #[serde(default)]
    pub rules: Vec<SymptomRule>,
}

impl SymptomRuleFile {
    pub fn into_sorted_rules(self) -> Vec<SymptomRule> {
        let mut rules = self.rules;
        rules.sort_by_key(|r| r.priority);
        rules
    }
}

// ============================================
// Slot definitions
// ============================================

/// Required and optional slots for a symptom, with the question for each.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SlotDefinition {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
    #[serde(default)]
    pub questions: BTreeMap<String, String>,
    /// When every condition holds, no further questions are asked.
    #[serde(default)]
    pub skip_when: Option<ConditionSet>,
}

/// Key of the definition used for symptoms without their own entry.
pub const DEFAULT_SLOT_DEFINITION: &str = "default";

// ============================================
// Rule book
// ============================================

/// Every table the engine evaluates.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
    pub danger: DangerSignalTable,
    pub symptom_rules: BTreeMap<String, Vec<SymptomRule>>,
    pub slot_definitions: BTreeMap<String, SlotDefinition>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleBook {
    /// The hard-coded tables used when no rule files are available.
    pub fn builtin() -> Self {
        Self {
            danger: builtin_danger_table(),
            symptom_rules: builtin_symptom_rules(),
            slot_definitions: builtin_slot_definitions(),
        }
    }

    /// Loads tables from `dir`, falling back per table on any error.
    pub fn load_from_dir(dir: &Path) -> Self {
        let danger = match read_table::<DangerSignalTable>(dir, "danger_signals") {
            Ok(table) => table.sorted(),
            Err(e) => {
                tracing::warn!(error = %e, "Using built-in danger signals");
                builtin_danger_table()
            }
        };

        let slot_definitions =
            match read_table::<BTreeMap<String, SlotDefinition>>(dir, "slot_definitions") {
                Ok(table) => table,
                Err(e) => {
                    tracing::warn!(error = %e, "Using built-in slot definitions");
                    builtin_slot_definitions()
                }
            };

        let symptom_rules = match read_symptom_rules(&dir.join("rules")) {
            Ok(rules) if !rules.is_empty() => rules,
            Ok(_) => {
                tracing::warn!(dir = %dir.display(), "No symptom rule files; using built-in rules");
                builtin_symptom_rules()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Using built-in symptom rules");
                builtin_symptom_rules()
            }
        };

        tracing::info!(
            dir = %dir.display(),
            danger_symptoms = danger.symptom_specific.len(),
            rule_symptoms = symptom_rules.len(),
            slot_definitions = slot_definitions.len(),
            "Loaded triage rules"
        );

        Self {
            danger,
            symptom_rules,
            slot_definitions,
        }
    }

    pub fn symptom_rules(&self, symptom: &str) -> &[SymptomRule] {
        self.symptom_rules
            .get(symptom)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The slot definition for a symptom, or the default definition.
    pub fn slot_definition(&self, symptom: &str) -> Option<&SlotDefinition> {
        self.slot_definitions
            .get(symptom)
            .or_else(|| self.slot_definitions.get(DEFAULT_SLOT_DEFINITION))
    }
}

/// Finds `<stem>.json`, `<stem>.yaml` or `<stem>.yml` in `dir` and parses it.
pub fn read_table<T: DeserializeOwned>(dir: &Path, stem: &str) -> Result<T, RuleLoadError> {
    for ext in ["json", "yaml", "yml"] {
        let path = dir.join(format!("{}.{}", stem, ext));
        if path.is_file() {
            return parse_file(&path);
        }
    }
    Err(RuleLoadError::NotFound(dir.join(format!("{}.json", stem))))
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, RuleLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RuleLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(&raw).map_err(|source| RuleLoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&raw).map_err(|source| RuleLoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Reads every rule file in `dir`. A broken file is skipped with a warning.
fn read_symptom_rules(dir: &Path) -> Result<BTreeMap<String, Vec<SymptomRule>>, RuleLoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            RuleLoadError::NotFound(dir.to_path_buf())
        } else {
            RuleLoadError::Io {
                path: dir.to_path_buf(),
                source,
            }
        }
    })?;

    let mut rules = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(symptom) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json") | Some("yaml") | Some("yml")
        ) {
            continue;
        }

        match parse_file::<SymptomRuleFile>(&path) {
            Ok(file) => {
                rules.insert(symptom.to_lowercase(), file.into_sorted_rules());
            }
            Err(e) => tracing::warn!(error = %e, "Skipping symptom rule file"),
        }
    }
    Ok(rules)
}

// ============================================
// Built-in defaults
// ============================================

fn builtin_danger_table() -> DangerSignalTable {
    let table = json!({
        "universal": [
            {
                "keywords": ["抽搐", "惊厥", "抽风", "seizure", "convulsion"],
                "alert_message": "Seizures need emergency care. Call emergency services or go to the nearest emergency department now."
            },
            {
                "keywords": ["呼吸困难", "喘不上气", "嘴唇发紫", "difficulty breathing", "trouble breathing", "blue lips"],
                "alert_message": "Breathing difficulty is an emergency. Call emergency services or go to the nearest emergency department now."
            },
            {
                "keywords": ["昏迷", "叫不醒", "意识不清", "unresponsive", "unconscious", "hard to wake"],
                "alert_message": "A child who is hard to wake needs emergency care. Go to the nearest emergency department now."
            },
            {
                "keywords": ["脖子僵硬", "颈部僵硬", "stiff neck", "紫癜", "purple spots"],
                "alert_message": "These signs can indicate a serious infection. Go to the nearest emergency department now."
            }
        ],
        "symptom_specific": {
            "fever": [
                {
                    "conditions": {"age_months": {"lt": 3}, "temperature": {"gte": 38.0}},
                    "alert_message": "Fever in a baby under 3 months is an emergency. Go to the nearest emergency department now.",
                    "priority": 1
                },
                {
                    "conditions": {"temperature": {"gte": 41.0}},
                    "alert_message": "A temperature of 41°C or above is an emergency. Go to the nearest emergency department now.",
                    "priority": 2
                }
            ],
            "vomiting": [
                {
                    "conditions": {"accompanying_symptoms": {"contains": "blood"}},
                    "alert_message": "Vomiting blood needs emergency care. Go to the nearest emergency department now."
                }
            ],
            "diarrhea": [
                {
                    "conditions": {"age_months": {"lt": 6}, "duration": {"gte": 24}},
                    "alert_message": "Diarrhea for over a day in a baby under 6 months risks dehydration. Go to the emergency department now."
                }
            ]
        }
    });

    serde_json::from_value::<DangerSignalTable>(table)
        .map(DangerSignalTable::sorted)
        .unwrap_or_default()
}

fn builtin_symptom_rules() -> BTreeMap<String, Vec<SymptomRule>> {
    let files = json!({
        "fever": {"rules": [
            {
                "priority": 1,
                "conditions": {"age_months": {"lt": 6}},
                "decision": {
                    "level": "urgent",
                    "reason": "Fever in a baby under 6 months",
                    "action": "See a doctor within the next few hours."
                }
            },
            {
                "priority": 2,
                "conditions": {"temperature": {"gte": 39.5}},
                "decision": {
                    "level": "urgent",
                    "reason": "High fever of 39.5°C or above",
                    "action": "See a doctor today; give a fever reducer if your child is uncomfortable."
                }
            },
            {
                "priority": 3,
                "conditions": {"duration": {"gte": 72}},
                "decision": {
                    "level": "outpatient",
                    "reason": "Fever lasting three days or more",
                    "action": "Book a pediatric visit within 24 hours."
                }
            }
        ]},
        "cough": {"rules": [
            {
                "priority": 1,
                "conditions": {"duration": {"gte": 336}},
                "decision": {
                    "level": "outpatient",
                    "reason": "Cough lasting two weeks or more",
                    "action": "Book a pediatric visit to check for a lingering infection."
                }
            }
        ]},
        "vomiting": {"rules": [
            {
                "priority": 1,
                "conditions": {"mental_state": {"contains": "letharg"}},
                "decision": {
                    "level": "urgent",
                    "reason": "Vomiting with reduced alertness",
                    "action": "See a doctor within the next few hours."
                }
            }
        ]}
    });

    let mut rules = BTreeMap::new();
    if let Some(map) = files.as_object() {
        for (symptom, file) in map {
            if let Ok(file) = serde_json::from_value::<SymptomRuleFile>(file.clone()) {
                rules.insert(symptom.clone(), file.into_sorted_rules());
            }
        }
    }
    rules
}

fn builtin_slot_definitions() -> BTreeMap<String, SlotDefinition> {
    let table = json!({
        "fever": {
            "required": ["age_months", "temperature", "duration", "mental_state"],
            "optional": ["accompanying_symptoms", "weight_kg"],
            "questions": {
                "age_months": "How old is your child?",
                "temperature": "What is the highest temperature you have measured?",
                "duration": "How long has the fever lasted?",
                "mental_state": "How is your child's energy? Playing normally, or unusually sleepy or irritable?"
            },
            "skip_when": {
                "age_months": {"gte": 36},
                "temperature": {"lt": 38.5},
                "mental_state": "normal"
            }
        },
        "cough": {
            "required": ["age_months", "duration"],
            "optional": ["temperature", "accompanying_symptoms"],
            "questions": {
                "age_months": "How old is your child?",
                "duration": "How long has the cough lasted?"
            }
        },
        "vomiting": {
            "required": ["age_months", "duration", "mental_state"],
            "optional": ["accompanying_symptoms"],
            "questions": {
                "age_months": "How old is your child?",
                "duration": "How long has the vomiting been going on?",
                "mental_state": "Is your child alert, or unusually sleepy?"
            }
        },
        "diarrhea": {
            "required": ["age_months", "duration", "mental_state"],
            "optional": ["accompanying_symptoms"],
            "questions": {
                "age_months": "How old is your child?",
                "duration": "How long has the diarrhea lasted?",
                "mental_state": "Is your child alert and still drinking?"
            }
        },
        "rash": {
            "required": ["age_months", "duration"],
            "optional": ["temperature", "accompanying_symptoms"],
            "questions": {
                "age_months": "How old is your child?",
                "duration": "When did the rash appear?"
            }
        },
        "default": {
            "required": ["age_months", "duration"],
            "questions": {
                "age_months": "How old is your child?",
                "duration": "How long has this been going on?"
            }
        }
    });

    serde_json::from_value(table).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::triage::TriageLevel;
    use tempfile::TempDir;

    #[test]
    fn builtin_tables_are_populated() {
        let book = RuleBook::builtin();

        assert_eq!(book.danger.universal.len(), 4);
        assert_eq!(book.danger.rules_for("fever").len(), 2);
        assert_eq!(
            book.slot_definition("fever").unwrap().required,
            vec!["age_months", "temperature", "duration", "mental_state"]
        );
        assert!(book.slot_definition("fever").unwrap().skip_when.is_some());
        assert_eq!(book.symptom_rules("fever").len(), 3);
    }

    #[test]
    fn unknown_symptom_uses_default_definition() {
        let book = RuleBook::builtin();
        let def = book.slot_definition("ear pain").unwrap();
        assert_eq!(def.required, vec!["age_months", "duration"]);
    }

    #[test]
    fn danger_rules_are_stably_sorted_by_priority() {
        let table: DangerSignalTable = serde_json::from_value(json!({
            "universal": [
                {"keywords": ["a"], "alert_message": "first listed", "priority": 5},
                {"keywords": ["b"], "alert_message": "no priority"},
                {"keywords": ["c"], "alert_message": "tie", "priority": 5},
                {"keywords": ["d"], "alert_message": "urgent", "priority": 0}
            ]
        }))
        .unwrap();

        let order: Vec<_> = table
            .sorted()
            .universal
            .into_iter()
            .map(|r| r.alert_message)
            .collect();

        assert_eq!(order, vec!["urgent", "no priority", "first listed", "tie"]);
    }

    #[test]
    fn symptom_rules_sort_ascending() {
        let file: SymptomRuleFile = serde_json::from_value(json!({"rules": [
            {"priority": 3, "conditions": {}, "decision": {"level": "home_care", "reason": "c", "action": "c"}},
            {"priority": 1, "conditions": {}, "decision": {"level": "urgent", "reason": "a", "action": "a"}}
        ]}))
        .unwrap();

        let rules = file.into_sorted_rules();
        assert_eq!(rules[0].decision.level, TriageLevel::Urgent);
        assert_eq!(rules[1].priority, 3);
    }

    #[test]
    fn loads_tables_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("danger_signals.json"),
            r#"{"universal": [{"keywords": ["x"], "alert_message": "custom"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("slot_definitions.yaml"),
            "earache:\n  required: [age_months]\n  questions:\n    age_months: How old?\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("rules")).unwrap();
        std::fs::write(
            dir.path().join("rules").join("earache.json"),
            r#"{"rules": [{"priority": 1, "conditions": {}, "decision": {"level": "outpatient", "reason": "r", "action": "a"}}]}"#,
        )
        .unwrap();

        let book = RuleBook::load_from_dir(dir.path());

        assert_eq!(book.danger.universal.len(), 1);
        assert_eq!(book.danger.universal[0].alert_message, "custom");
        assert_eq!(book.slot_definition("earache").unwrap().required, vec!["age_months"]);
        assert_eq!(book.symptom_rules("earache").len(), 1);
        assert!(book.symptom_rules("fever").is_empty());
    }

    #[test]
    fn broken_tables_fall_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("danger_signals.json"), "{ nope").unwrap();

        let book = RuleBook::load_from_dir(dir.path());

        assert_eq!(book, RuleBook::builtin());
    }

    #[test]
    fn missing_table_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let result = read_table::<DangerSignalTable>(dir.path(), "danger_signals");
        assert!(matches!(result, Err(RuleLoadError::NotFound(_))));
    }
}
