//! User-facing response text for each dialogue action.

use crate::domain::triage::{Decision, TriageLevel};
use crate::ports::RetrievedAnswer;

pub const GREETING: &str = "Hello! I can help you decide how urgently your child needs care. \
What symptoms is your child having?";

pub const ASK_FOR_SYMPTOM: &str =
    "What is the main symptom you are worried about? For example fever, cough, vomiting, diarrhea or a rash.";

pub const PLEASE_REPHRASE: &str =
    "Sorry, I didn't quite follow. Could you rephrase that or describe your child's symptoms?";

pub const KNOWLEDGE_UNAVAILABLE: &str = "I can't look that up right now. \
If you are worried about your child's symptoms, describe them and I will help you assess them.";

pub fn danger_alert(alert: &str) -> String {
    format!("⚠️ {}", alert)
}

/// Joins the questions for missing slots into one message.
pub fn missing_slot_questions(questions: &[String]) -> String {
    match questions {
        [] => PLEASE_REPHRASE.to_string(),
        [only] => only.clone(),
        many => {
            let mut text = String::from("To assess this I need a bit more information:");
            for (i, question) in many.iter().enumerate() {
                text.push_str(&format!("\n{}. {}", i + 1, question));
            }
            text
        }
    }
}

pub fn decision(decision: &Decision) -> String {
    let headline = match decision.level {
        TriageLevel::Emergency => "Go to the emergency department now.",
        TriageLevel::Urgent => "Your child should see a doctor today.",
        TriageLevel::Outpatient => "Book a regular appointment with a pediatrician.",
        TriageLevel::HomeCare => "This can be managed at home for now.",
    };
    format!(
        "{}\nReason: {}\nWhat to do: {}",
        headline, decision.reason, decision.action
    )
}

pub fn knowledge_answer(answer: &RetrievedAnswer) -> String {
    if answer.answer.trim().is_empty() {
        return KNOWLEDGE_UNAVAILABLE.to_string();
    }
    if answer.sources.is_empty() {
        return answer.answer.clone();
    }
    format!("{}\n\nSources: {}", answer.answer, answer.sources.join("; "))
}
