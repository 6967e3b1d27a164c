//! Conversation orchestrator - drives one triage turn end to end.
//!
//! Per turn:
//!
//! 1. load or create the session
//! 2. look up the child profile (creating a default one if absent)
//! 3. extract intent and entities, merge entities into the slots
//! 4. compute missing slots (with profile auto-fill) and check danger signals
//! 5. pick the next action with the dialogue controller and execute it
//! 6. persist the session
//!
//! Turns on the same conversation are serialized by a per-conversation lock
//! held for the whole read-modify-write. Collaborator calls are bounded by a
//! timeout; a failed or late collaborator yields a neutral result.

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::dialogue::{transition, DialogueAction, DialogueState, Intent};
use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::profile::ChildProfile;
use crate::domain::session::{merge_entities, SessionState};
use crate::domain::triage::{TriageRuleEngine, TriageSnapshot};
use crate::ports::{
    ExtractionError, IntentExtractor, KnowledgeRetriever, ProfileError, ProfileReader,
    RetrievalError, RetrievedAnswer,
};

use super::responses;
use super::session_store::SessionStore;

/// Default bound on a single collaborator call.
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Command to process one user message
#[derive(Debug, Clone)]
pub struct TurnCommand {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub message: String,
}

/// Outcome of one turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnResult {
    pub conversation_id: ConversationId,
    pub action: DialogueAction,
    pub dialogue_state: DialogueState,
    pub response: String,
    pub missing_slots: Vec<String>,
    pub danger_alert: Option<String>,
    pub triage: Option<TriageSnapshot>,
    pub sources: Vec<String>,
    /// False if the session could not be written to durable storage.
    pub persisted: bool,
}

/// Errors that abort a turn before any state changes
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("conversation {conversation_id} belongs to another user")]
    ForeignConversation { conversation_id: ConversationId },
}

/// Drives triage turns over injected collaborators.
pub struct ConversationOrchestrator {
    store: Arc<SessionStore>,
    engine: Arc<TriageRuleEngine>,
    extractor: Arc<dyn IntentExtractor>,
    profiles: Arc<dyn ProfileReader>,
    retriever: Arc<dyn KnowledgeRetriever>,
    collaborator_timeout: Duration,
    turn_locks: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        engine: Arc<TriageRuleEngine>,
        extractor: Arc<dyn IntentExtractor>,
        profiles: Arc<dyn ProfileReader>,
        retriever: Arc<dyn KnowledgeRetriever>,
    ) -> Self {
        Self {
            store,
            engine,
            extractor,
            profiles,
            retriever,
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the bound on each collaborator call.
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Process one user message.
    pub async fn handle(&self, cmd: TurnCommand) -> Result<TurnResult, TurnError> {
        if cmd.message.trim().is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        let lock = self.turn_lock(&cmd.conversation_id).await;
        let result = {
            let _turn = lock.lock().await;
            self.run_turn(&cmd).await
        };
        self.release_turn_lock(&cmd.conversation_id, lock).await;
        result
    }

    async fn run_turn(&self, cmd: &TurnCommand) -> Result<TurnResult, TurnError> {
        let mut state = self.store.load(&cmd.conversation_id, &cmd.user_id).await;
        if state.user_id() != &cmd.user_id {
            tracing::warn!(
                conversation_id = %cmd.conversation_id,
                user_id = %cmd.user_id,
                "Rejected turn for a conversation owned by another user"
            );
            return Err(TurnError::ForeignConversation {
                conversation_id: cmd.conversation_id.clone(),
            });
        }
        state.begin_turn();

        let profile = self.fetch_profile(&cmd.user_id).await;
        self.apply_extraction(&mut state, &cmd.message, profile.as_ref())
            .await;

        let has_symptom = state.has_symptom();
        let missing_slots = match state.symptom.clone() {
            Some(symptom) if has_symptom => {
                self.engine
                    .get_missing_slots(&symptom, &mut state.slots, profile.as_ref())
            }
            _ => Vec::new(),
        };

        let danger_alert = self
            .engine
            .check_danger(state.symptom.as_deref(), &state.slots);
        if let Some(alert) = &danger_alert {
            tracing::warn!(conversation_id = %cmd.conversation_id, alert = %alert, "Danger signal detected");
            state.record_danger(alert.clone());
        }

        let next = transition(
            state.current_intent,
            has_symptom,
            danger_alert.as_deref(),
            &missing_slots,
        );
        state.dialogue_state = next.state;

        let (response, sources) = self
            .execute(&mut state, &next.action, &cmd.message, profile.as_ref())
            .await;

        let persisted = self.store.save(&mut state).await;
        if !persisted {
            tracing::warn!(conversation_id = %cmd.conversation_id, "Turn completed without durable persistence");
        }

        tracing::info!(
            conversation_id = %cmd.conversation_id,
            turn = state.turn_count(),
            action = next.action.name(),
            state = %state.dialogue_state,
            "Turn complete"
        );

        Ok(TurnResult {
            conversation_id: cmd.conversation_id.clone(),
            action: next.action,
            dialogue_state: state.dialogue_state,
            response,
            missing_slots,
            danger_alert,
            triage: state.triage_snapshot().cloned(),
            sources,
            persisted,
        })
    }

    async fn apply_extraction(
        &self,
        state: &mut SessionState,
        message: &str,
        profile: Option<&ChildProfile>,
    ) {
        let extraction = self
            .bounded(
                self.extractor.extract(message, profile, &state.slots),
                ExtractionError::Timeout,
            )
            .await;

        let extraction = match extraction {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(conversation_id = %state.conversation_id(), error = %e, "Extraction failed");
                return;
            }
        };

        if let Some(intent) = extraction.intent {
            state.current_intent = Some(intent);
            if intent == Intent::Triage {
                state.record_chief_complaint(message);
            }
        }

        let delta = merge_entities(state, &extraction.entities);
        if !delta.is_empty() {
            tracing::debug!(
                conversation_id = %state.conversation_id(),
                changed = ?delta.changed_slots,
                symptom_changed = delta.symptom_changed,
                "Merged entities"
            );
        }
    }

    async fn execute(
        &self,
        state: &mut SessionState,
        action: &DialogueAction,
        message: &str,
        profile: Option<&ChildProfile>,
    ) -> (String, Vec<String>) {
        match action {
            DialogueAction::SendDangerAlert { alert } => (responses::danger_alert(alert), Vec::new()),
            DialogueAction::SendGreeting => (responses::GREETING.to_string(), Vec::new()),
            DialogueAction::AskForSymptom => (responses::ASK_FOR_SYMPTOM.to_string(), Vec::new()),
            DialogueAction::AskMissingSlots { missing_slots } => {
                let symptom = state.symptom.clone().unwrap_or_default();
                let questions: Vec<String> = missing_slots
                    .iter()
                    .map(|slot| self.engine.question_for(&symptom, slot))
                    .collect();
                (responses::missing_slot_questions(&questions), Vec::new())
            }
            DialogueAction::MakeTriageDecision => {
                let symptom = state.symptom.clone().unwrap_or_default();
                let decision = self.engine.decide(&symptom, &state.slots);
                state.record_decision(&decision);
                state.dialogue_state = DialogueState::TriageComplete;
                tracing::info!(
                    conversation_id = %state.conversation_id(),
                    level = %decision.level,
                    "Triage decision recorded"
                );
                (responses::decision(&decision), Vec::new())
            }
            DialogueAction::RunRagQuery => {
                let answer = self.retrieve(state, message, profile).await;
                match answer {
                    Some(answer) => (responses::knowledge_answer(&answer), answer.sources),
                    None => (responses::KNOWLEDGE_UNAVAILABLE.to_string(), Vec::new()),
                }
            }
            DialogueAction::Unrecognized => (responses::PLEASE_REPHRASE.to_string(), Vec::new()),
        }
    }

    async fn retrieve(
        &self,
        state: &SessionState,
        query: &str,
        profile: Option<&ChildProfile>,
    ) -> Option<RetrievedAnswer> {
        match self
            .bounded(self.retriever.retrieve(query, profile), RetrievalError::Timeout)
            .await
        {
            Ok(answer) => Some(answer),
            Err(e) => {
                tracing::warn!(conversation_id = %state.conversation_id(), error = %e, "Retrieval failed");
                None
            }
        }
    }

    /// Reads the profile, creating a default one on first contact. A
    /// concurrent creator wins and this call re-reads its record.
    async fn fetch_profile(&self, user_id: &UserId) -> Option<ChildProfile> {
        match self
            .bounded(self.profiles.get_profile(user_id), profile_timeout)
            .await
        {
            Ok(profile) => return Some(profile),
            Err(ProfileError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Profile lookup failed");
                return None;
            }
        }

        match self
            .bounded(self.profiles.create_default_profile(user_id), profile_timeout)
            .await
        {
            Ok(profile) => {
                tracing::info!(user_id = %user_id, "Created default profile");
                Some(profile)
            }
            Err(ProfileError::AlreadyExists(_)) => {
                tracing::debug!(user_id = %user_id, "Profile created concurrently; re-reading");
                self.bounded(self.profiles.get_profile(user_id), profile_timeout)
                    .await
                    .ok()
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Profile creation failed");
                None
            }
        }
    }

    /// Runs a collaborator call under the configured timeout. Expiry becomes
    /// the collaborator's own error, built from the timeout in milliseconds.
    async fn bounded<T, E, F>(&self, call: F, on_timeout: fn(u64) -> E) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.collaborator_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(on_timeout(
                u64::try_from(self.collaborator_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    async fn turn_lock(&self, conversation_id: &ConversationId) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        locks
            .entry(conversation_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release_turn_lock(&self, conversation_id: &ConversationId, lock: Arc<Mutex<()>>) {
        let mut locks = self.turn_locks.lock().await;
        drop(lock);
        let idle = locks
            .get(conversation_id)
            .map(|l| Arc::strong_count(l) == 1)
            .unwrap_or(false);
        if idle {
            locks.remove(conversation_id);
        }
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.turn_locks.lock().await.len()
    }
}

fn profile_timeout(millis: u64) -> ProfileError {
    ProfileError::Unavailable(format!("timed out after {} ms", millis))
}
