//! End-to-end turn flows through the orchestrator with mock collaborators.

use serde_json::json;
use std::sync::Arc;

use triage_engine::adapters::{
    InMemoryProfileReader, InMemorySessionRecordStorage, MockIntentExtractor,
    MockKnowledgeRetriever,
};
use triage_engine::application::{ConversationOrchestrator, SessionStore, TurnCommand};
use triage_engine::domain::dialogue::{DialogueAction, DialogueState, Intent};
use triage_engine::domain::foundation::{ConversationId, UserId};
use triage_engine::domain::triage::{TriageLevel, TriageRuleEngine};
use triage_engine::ports::Extraction;

struct Fixture {
    orchestrator: ConversationOrchestrator,
    extractor: MockIntentExtractor,
}

impl Fixture {
    fn new() -> Self {
        let extractor = MockIntentExtractor::new();
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionRecordStorage::new()),
            64,
        ));
        let orchestrator = ConversationOrchestrator::new(
            store,
            Arc::new(TriageRuleEngine::default()),
            Arc::new(extractor.clone()),
            Arc::new(InMemoryProfileReader::new()),
            Arc::new(MockKnowledgeRetriever::new()),
        );
        Self {
            orchestrator,
            extractor,
        }
    }

    fn cmd(message: &str) -> TurnCommand {
        TurnCommand {
            conversation_id: ConversationId::new("conv-e2e").unwrap(),
            user_id: UserId::new("parent-1").unwrap(),
            message: message.to_string(),
        }
    }
}

#[tokio::test]
async fn young_infant_fever_raises_danger_alert() {
    let f = Fixture::new();
    f.extractor.push_extraction(
        Extraction::new(Intent::Triage)
            .with_entity("symptom", json!("fever"))
            .with_entity("age_months", json!(2))
            .with_entity("temperature", json!("38.0")),
    );

    let result = f.orchestrator.handle(Fixture::cmd("宝宝发烧38度")).await.unwrap();

    assert!(matches!(result.action, DialogueAction::SendDangerAlert { .. }));
    assert_eq!(result.dialogue_state, DialogueState::DangerDetected);
    assert!(result.danger_alert.unwrap().contains("under 3 months"));
    assert!(result.triage.is_none());
}

#[tokio::test]
async fn greeting_on_fresh_conversation() {
    let f = Fixture::new();
    f.extractor.push_extraction(Extraction::new(Intent::Greeting));

    let result = f.orchestrator.handle(Fixture::cmd("你好")).await.unwrap();

    assert_eq!(result.action, DialogueAction::SendGreeting);
    assert_eq!(result.dialogue_state, DialogueState::Greeting);
}

#[tokio::test]
async fn triage_without_symptom_asks_for_one() {
    let f = Fixture::new();
    f.extractor.push_extraction(Extraction::new(Intent::Triage));

    let result = f
        .orchestrator
        .handle(Fixture::cmd("my child is not well"))
        .await
        .unwrap();

    assert_eq!(result.action, DialogueAction::AskForSymptom);
    assert_eq!(result.dialogue_state, DialogueState::CollectingSlots);
}

#[tokio::test]
async fn missing_slots_are_asked_in_declared_order() {
    let f = Fixture::new();
    f.extractor.push_extraction(
        Extraction::new(Intent::Triage)
            .with_entity("symptom", json!("fever"))
            .with_entity("age_months", json!(18)),
    );

    let result = f
        .orchestrator
        .handle(Fixture::cmd("1岁半的孩子发烧"))
        .await
        .unwrap();

    let expected = vec![
        "temperature".to_string(),
        "duration".to_string(),
        "mental_state".to_string(),
    ];
    assert_eq!(
        result.action,
        DialogueAction::AskMissingSlots {
            missing_slots: expected.clone()
        }
    );
    assert_eq!(result.missing_slots, expected);
    assert!(result.response.contains("highest temperature"));
}

#[tokio::test]
async fn complete_slots_produce_a_stable_decision() {
    let f = Fixture::new();
    f.extractor.push_extraction(
        Extraction::new(Intent::Triage)
            .with_entity("symptom", json!("fever"))
            .with_entity("age_months", json!(18)),
    );
    f.extractor.push_extraction(
        Extraction::new(Intent::SlotFilling)
            .with_entity("temperature", json!("39.8"))
            .with_entity("duration", json!("1天"))
            .with_entity("mental_state", json!("normal")),
    );
    f.extractor.push_extraction(Extraction::new(Intent::Greeting));

    f.orchestrator.handle(Fixture::cmd("孩子发烧")).await.unwrap();
    let decided = f
        .orchestrator
        .handle(Fixture::cmd("39.8度，一天了，精神还好"))
        .await
        .unwrap();

    assert_eq!(decided.action, DialogueAction::MakeTriageDecision);
    assert_eq!(decided.dialogue_state, DialogueState::TriageComplete);
    let snapshot = decided.triage.clone().unwrap();
    assert_eq!(snapshot.level(), TriageLevel::Urgent);
    assert!(snapshot.reason().contains("39.5"));

    let later = f.orchestrator.handle(Fixture::cmd("谢谢")).await.unwrap();

    assert_eq!(later.action, DialogueAction::SendGreeting);
    assert_eq!(later.triage, Some(snapshot));
}

#[tokio::test]
async fn mild_fever_in_older_child_skips_follow_up() {
    let f = Fixture::new();
    f.extractor.push_extraction(
        Extraction::new(Intent::Triage)
            .with_entity("symptom", json!("fever"))
            .with_entity("age_months", json!("4岁"))
            .with_entity("temperature", json!(38.1))
            .with_entity("mental_state", json!("Normal")),
    );

    let result = f
        .orchestrator
        .handle(Fixture::cmd("4岁孩子低烧，精神正常"))
        .await
        .unwrap();

    assert_eq!(result.action, DialogueAction::MakeTriageDecision);
    assert_eq!(result.triage.unwrap().level(), TriageLevel::HomeCare);
}

#[tokio::test]
async fn keyword_danger_overrides_greeting() {
    let f = Fixture::new();
    f.extractor.push_extraction(
        Extraction::new(Intent::Greeting)
            .with_entity("accompanying_symptoms", json!(["抽搐"])),
    );

    let result = f.orchestrator.handle(Fixture::cmd("你好，孩子抽搐了")).await.unwrap();

    assert!(matches!(result.action, DialogueAction::SendDangerAlert { .. }));
}
