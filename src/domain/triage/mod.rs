//! Triage domain module.
//!
//! Rule tables, condition evaluation, numeric normalization and the rule
//! engine that turns accumulated slots into danger alerts and decisions.

pub mod conditions;
pub mod decision;
pub mod engine;
pub mod normalize;
pub mod rules;

pub use conditions::{all_conditions_hold, Comparison, Condition, ConditionSet};
pub use decision::{Decision, TriageLevel, TriageSnapshot};
pub use engine::TriageRuleEngine;
pub use normalize::{age_to_months, chinese_to_number, duration_to_hours, to_number};
pub use rules::{
    ConditionDangerRule, DangerSignalTable, KeywordDangerRule, RuleBook, RuleLoadError,
    SlotDefinition, SymptomRule, SymptomRuleFile,
};
