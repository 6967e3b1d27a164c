//! Dialogue states and user intents.
//!
//! `DialogueState` records which phase the conversation is in after the last
//! turn. `Intent` is what the extractor believes the user wants in the current
//! message. Neither carries behavior beyond naming; the controller decides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Phase of a triage conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogueState {
    /// Bootstrap state of a freshly created conversation.
    #[default]
    Initial,
    Greeting,
    CollectingSlots,
    ReadyForTriage,
    /// Reached only after a triage decision has been rendered.
    TriageComplete,
    DangerDetected,
    RagQuery,
}

impl DialogueState {
    /// Returns a short label suitable for logs and UI display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Greeting => "greeting",
            Self::CollectingSlots => "collecting_slots",
            Self::ReadyForTriage => "ready_for_triage",
            Self::TriageComplete => "triage_complete",
            Self::DangerDetected => "danger_detected",
            Self::RagQuery => "rag_query",
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Intent of a single user message, as classified by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Greeting,
    Triage,
    SlotFilling,
    Consult,
    Medication,
    Care,
}

impl Intent {
    /// Returns true if this intent asks for (or feeds) a triage decision.
    pub fn drives_triage(&self) -> bool {
        matches!(self, Self::Triage | Self::SlotFilling)
    }

    /// Returns the canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "GREETING",
            Self::Triage => "TRIAGE",
            Self::SlotFilling => "SLOT_FILLING",
            Self::Consult => "CONSULT",
            Self::Medication => "MEDICATION",
            Self::Care => "CARE",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ValidationError;

    /// Parses wire names case-insensitively; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "GREETING" => Ok(Self::Greeting),
            "TRIAGE" => Ok(Self::Triage),
            "SLOT_FILLING" => Ok(Self::SlotFilling),
            "CONSULT" => Ok(Self::Consult),
            "MEDICATION" => Ok(Self::Medication),
            "CARE" => Ok(Self::Care),
            _ => Err(ValidationError::invalid_format(
                "intent",
                format!("unknown intent '{}'", s),
            )),
        }
    }
}
