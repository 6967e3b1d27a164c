//! Session State Entity
//!
//! The per-conversation record the orchestrator reads and writes once per
//! turn. It holds accumulated slots, the dialogue phase and the final triage
//! snapshot, and has no behavior beyond small merge/query helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::dialogue::{DialogueState, Intent};
use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::triage::{Decision, TriageLevel, TriageSnapshot};

use super::slots::{SlotValue, Slots};

/// Persisted schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Complete state of one triage conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    conversation_id: ConversationId,
    user_id: UserId,
    #[serde(default)]
    pub dialogue_state: DialogueState,
    #[serde(default)]
    pub current_intent: Option<Intent>,
    #[serde(default)]
    chief_complaint: Option<String>,
    #[serde(default)]
    pub symptom: Option<String>,
    #[serde(default)]
    pub slots: Slots,
    #[serde(default)]
    triage_snapshot: Option<TriageSnapshot>,
    #[serde(default)]
    pub danger_signal: Option<String>,
    #[serde(default)]
    turn_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl SessionState {
    /// Create an empty state for a new conversation.
    pub fn new(conversation_id: ConversationId, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            conversation_id,
            user_id,
            dialogue_state: DialogueState::Initial,
            current_intent: None,
            chief_complaint: None,
            symptom: None,
            slots: Slots::new(),
            triage_snapshot: None,
            danger_signal: None,
            turn_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn chief_complaint(&self) -> Option<&str> {
        self.chief_complaint.as_deref()
    }

    pub fn triage_snapshot(&self) -> Option<&TriageSnapshot> {
        self.triage_snapshot.as_ref()
    }

    /// The authoritative triage level, if a decision has been recorded.
    pub fn triage_level(&self) -> Option<TriageLevel> {
        self.triage_snapshot.as_ref().map(|s| s.level())
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Start a new turn.
    pub fn begin_turn(&mut self) {
        self.turn_count += 1;
        self.touch();
    }

    /// Record the chief complaint unless one is already set.
    ///
    /// Returns true if the message was recorded.
    pub fn record_chief_complaint(&mut self, message: &str) -> bool {
        if self.chief_complaint.is_some() || message.trim().is_empty() {
            return false;
        }
        self.chief_complaint = Some(message.to_string());
        self.touch();
        true
    }

    /// Replace the triage snapshot with a freshly rendered decision.
    pub fn record_decision(&mut self, decision: &Decision) -> &TriageSnapshot {
        let now = Utc::now();
        self.updated_at = now;
        self.triage_snapshot
            .insert(TriageSnapshot::from_decision(decision, now))
    }

    /// Record the most recent danger alert.
    pub fn record_danger(&mut self, alert: impl Into<String>) {
        self.danger_signal = Some(alert.into());
        self.touch();
    }

    pub fn slot(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    pub fn has_symptom(&self) -> bool {
        self.symptom
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    /// Update `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> SessionState {
        SessionState::new(
            ConversationId::new("conv-1").unwrap(),
            UserId::new("user-1").unwrap(),
        )
    }

    #[test]
    fn new_state_is_empty() {
        let state = test_state();

        assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(state.dialogue_state, DialogueState::Initial);
        assert!(state.current_intent.is_none());
        assert!(state.slots.is_empty());
        assert!(state.triage_snapshot().is_none());
        assert_eq!(state.turn_count(), 0);
        assert!(!state.has_symptom());
        assert_eq!(state.created_at, state.updated_at);
    }

    #[test]
    fn begin_turn_increments_counter() {
        let mut state = test_state();
        state.begin_turn();
        state.begin_turn();
        assert_eq!(state.turn_count(), 2);
    }

    #[test]
    fn chief_complaint_is_write_once() {
        let mut state = test_state();

        assert!(state.record_chief_complaint("my son has a fever"));
        assert!(!state.record_chief_complaint("now he is coughing"));

        assert_eq!(state.chief_complaint(), Some("my son has a fever"));
    }

    #[test]
    fn blank_chief_complaint_is_ignored() {
        let mut state = test_state();
        assert!(!state.record_chief_complaint("   "));
        assert!(state.chief_complaint().is_none());
    }

    #[test]
    fn record_decision_replaces_whole_snapshot() {
        let mut state = test_state();
        state.record_decision(&Decision::new(TriageLevel::Outpatient, "r1", "a1"));
        let first = state.triage_snapshot().cloned().unwrap();

        state.record_decision(&Decision::new(TriageLevel::Urgent, "r2", "a2"));
        let second = state.triage_snapshot().unwrap();

        assert_eq!(first.level(), TriageLevel::Outpatient);
        assert_eq!(second.level(), TriageLevel::Urgent);
        assert_eq!(second.reason(), "r2");
        assert_eq!(second.action(), "a2");
        assert!(second.decided_at() >= first.decided_at());
        assert_eq!(state.triage_level(), Some(TriageLevel::Urgent));
    }

    #[test]
    fn blank_symptom_does_not_count() {
        let mut state = test_state();
        state.symptom = Some("  ".to_string());
        assert!(!state.has_symptom());
        state.symptom = Some("fever".to_string());
        assert!(state.has_symptom());
    }
}
