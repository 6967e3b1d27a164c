//! Rule table configuration

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::triage::RuleBook;

/// Where rule tables are read from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesConfig {
    /// Directory holding `danger_signals`, `slot_definitions` and `rules/`.
    /// Built-in tables are used when unset.
    pub dir: Option<PathBuf>,
}

impl RulesConfig {
    /// Loads the rule book. Missing or broken tables fall back to the
    /// built-in ones individually.
    pub fn load_rule_book(&self) -> RuleBook {
        match &self.dir {
            Some(dir) => RuleBook::load_from_dir(dir),
            None => RuleBook::builtin(),
        }
    }
}
