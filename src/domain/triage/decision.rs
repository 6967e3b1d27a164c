//! Triage decisions and the snapshot recorded on a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Urgency of a triage outcome, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageLevel {
    /// Go to an emergency department now.
    Emergency,
    /// Seek medical care within hours.
    Urgent,
    /// Book a regular pediatric visit.
    Outpatient,
    /// Care at home and watch for warning signs.
    #[serde(alias = "observe")]
    HomeCare,
}

impl TriageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Urgent => "urgent",
            Self::Outpatient => "outpatient",
            Self::HomeCare => "home_care",
        }
    }
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriageLevel {
    type Err = ValidationError;

    /// Accepts canonical names plus the labels older records used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emergency" | "紧急" | "急诊" | "立即就医" => Ok(Self::Emergency),
            "urgent" | "尽快就医" | "urgent_care" => Ok(Self::Urgent),
            "outpatient" | "门诊" | "routine" => Ok(Self::Outpatient),
            "home_care" | "homecare" | "home" | "observe" | "居家观察" => Ok(Self::HomeCare),
            other => Err(ValidationError::invalid_format(
                "triage_level",
                format!("unknown level '{}'", other),
            )),
        }
    }
}

/// A rendered triage decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub level: TriageLevel,
    pub reason: String,
    pub action: String,
}

impl Decision {
    pub fn new(level: TriageLevel, reason: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            level,
            reason: reason.into(),
            action: action.into(),
        }
    }
}

/// The final decision recorded for a conversation.
///
/// Fields are read-only; a later re-decision replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageSnapshot {
    level: TriageLevel,
    reason: String,
    action: String,
    decided_at: DateTime<Utc>,
}

impl TriageSnapshot {
    /// Freezes a decision at the given instant.
    pub fn from_decision(decision: &Decision, decided_at: DateTime<Utc>) -> Self {
        Self {
            level: decision.level,
            reason: decision.reason.clone(),
            action: decision.action.clone(),
            decided_at,
        }
    }

    pub fn level(&self) -> TriageLevel {
        self.level
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }

    /// Returns the decision this snapshot froze.
    pub fn decision(&self) -> Decision {
        Decision::new(self.level, self.reason.clone(), self.action.clone())
    }
}
