//! Dialogue controller.
//!
//! Picks the next system action for a turn from the current inputs alone.
//! The chain below is evaluated top to bottom and the first match wins:
//!
//! 1. danger alert present      → `DangerDetected`  / `SendDangerAlert`
//! 2. greeting intent           → `Greeting`        / `SendGreeting`
//! 3. no primary symptom yet    → `CollectingSlots` / `AskForSymptom`
//! 4. required slots missing    → `CollectingSlots` / `AskMissingSlots`
//! 5. triage or slot filling    → `ReadyForTriage`  / `MakeTriageDecision`
//! 6. anything else             → `RagQuery`        / `RunRagQuery`
//!
//! The controller never reads the previous `DialogueState`; history only
//! reaches it through `has_symptom`, `missing_slots` and `danger_alert`.

use serde::{Deserialize, Serialize};

use super::state::{DialogueState, Intent};

/// Action the orchestrator executes after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogueAction {
    SendDangerAlert {
        alert: String,
    },
    SendGreeting,
    AskForSymptom,
    AskMissingSlots {
        missing_slots: Vec<String>,
    },
    MakeTriageDecision,
    RunRagQuery,
    /// Action name written by a newer build or a foreign producer.
    #[serde(other)]
    Unrecognized,
}

impl DialogueAction {
    /// Returns the canonical action name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendDangerAlert { .. } => "SEND_DANGER_ALERT",
            Self::SendGreeting => "SEND_GREETING",
            Self::AskForSymptom => "ASK_FOR_SYMPTOM",
            Self::AskMissingSlots { .. } => "ASK_MISSING_SLOTS",
            Self::MakeTriageDecision => "MAKE_TRIAGE_DECISION",
            Self::RunRagQuery => "RUN_RAG_QUERY",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

/// Result of one controller evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: DialogueState,
    pub action: DialogueAction,
}

impl Transition {
    fn new(state: DialogueState, action: DialogueAction) -> Self {
        Self { state, action }
    }
}

/// Evaluates the priority chain for one turn.
///
/// A blank `danger_alert` counts as absent.
pub fn transition(
    intent: Option<Intent>,
    has_symptom: bool,
    danger_alert: Option<&str>,
    missing_slots: &[String],
) -> Transition {
    if let Some(alert) = danger_alert.filter(|a| !a.trim().is_empty()) {
        return Transition::new(
            DialogueState::DangerDetected,
            DialogueAction::SendDangerAlert {
                alert: alert.to_string(),
            },
        );
    }

    if intent == Some(Intent::Greeting) {
        return Transition::new(DialogueState::Greeting, DialogueAction::SendGreeting);
    }

    if !has_symptom {
        return Transition::new(DialogueState::CollectingSlots, DialogueAction::AskForSymptom);
    }

    if !missing_slots.is_empty() {
        return Transition::new(
            DialogueState::CollectingSlots,
            DialogueAction::AskMissingSlots {
                missing_slots: missing_slots.to_vec(),
            },
        );
    }

    if intent.map(|i| i.drives_triage()).unwrap_or(false) {
        return Transition::new(
            DialogueState::ReadyForTriage,
            DialogueAction::MakeTriageDecision,
        );
    }

    Transition::new(DialogueState::RagQuery, DialogueAction::RunRagQuery)
}
