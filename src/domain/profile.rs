//! Child profile used to auto-fill slots.

use serde::{Deserialize, Serialize};

/// Facts a profile source may already know about the child.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    #[serde(default)]
    pub age_in_months: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

impl ChildProfile {
    pub fn new(age_in_months: Option<f64>, weight_kg: Option<f64>) -> Self {
        Self {
            age_in_months,
            weight_kg,
        }
    }

    /// True if the profile carries nothing usable.
    pub fn is_blank(&self) -> bool {
        self.age_in_months.is_none() && self.weight_kg.is_none()
    }
}
