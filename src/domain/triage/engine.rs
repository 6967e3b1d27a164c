//! Triage rule engine.
//!
//! A pure evaluator over a [`RuleBook`] loaded once at startup. It never
//! suspends and never fails: malformed inputs simply do not match.

use crate::domain::profile::ChildProfile;
use crate::domain::session::{slot_names, SlotValue, Slots};

use super::conditions::all_conditions_hold;
use super::decision::{Decision, TriageLevel};
use super::rules::RuleBook;

/// Evaluates danger signals, missing slots and final decisions.
#[derive(Debug, Clone)]
pub struct TriageRuleEngine {
    rules: RuleBook,
}

impl Default for TriageRuleEngine {
    fn default() -> Self {
        Self::new(RuleBook::builtin())
    }
}

impl TriageRuleEngine {
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Returns the first danger alert that fires, if any.
    ///
    /// Keyword rules are checked first against a lower-cased text view of the
    /// slots; then the symptom's condition rules, in priority order.
    pub fn check_danger(&self, symptom: Option<&str>, slots: &Slots) -> Option<String> {
        let haystack = danger_text(slots);

        for rule in &self.rules.danger.universal {
            let hit = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .any(|k| haystack.contains(&k));
            if hit {
                return Some(rule.alert_message.clone());
            }
        }

        let symptom = symptom?;
        self.rules
            .danger
            .rules_for(symptom)
            .iter()
            .find(|rule| !rule.conditions.is_empty() && all_conditions_hold(&rule.conditions, slots))
            .map(|rule| rule.alert_message.clone())
    }

    /// Lists required slots still missing for `symptom`, in declared order.
    ///
    /// Absent age and weight are first filled from the profile. When the
    /// symptom's relaxation rule holds nothing is reported missing.
    pub fn get_missing_slots(
        &self,
        symptom: &str,
        slots: &mut Slots,
        profile: Option<&ChildProfile>,
    ) -> Vec<String> {
        if let Some(profile) = profile {
            autofill(slots, slot_names::AGE_MONTHS, profile.age_in_months);
            autofill(slots, slot_names::WEIGHT_KG, profile.weight_kg);
        }

        let Some(definition) = self.rules.slot_definition(symptom) else {
            return Vec::new();
        };

        if let Some(skip_when) = &definition.skip_when {
            if !skip_when.is_empty() && all_conditions_hold(skip_when, slots) {
                tracing::debug!(symptom, "Relaxation rule holds; no follow-up questions");
                return Vec::new();
            }
        }

        definition
            .required
            .iter()
            .filter(|slot| slots.get(slot.as_str()).map_or(true, SlotValue::is_empty))
            .cloned()
            .collect()
    }

    /// Renders the final decision for `symptom`.
    pub fn decide(&self, symptom: &str, slots: &Slots) -> Decision {
        if let Some(alert) = self.check_danger(Some(symptom), slots) {
            return Decision::new(
                TriageLevel::Emergency,
                alert,
                "Go to the nearest emergency department or call emergency services now.",
            );
        }

        if let Some(rule) = self
            .rules
            .symptom_rules(symptom)
            .iter()
            .find(|rule| all_conditions_hold(&rule.conditions, slots))
        {
            return rule.decision.clone();
        }

        default_decision(symptom)
    }

    /// The question to ask for a missing slot.
    pub fn question_for(&self, symptom: &str, slot: &str) -> String {
        self.rules
            .slot_definition(symptom)
            .and_then(|def| def.questions.get(slot))
            .cloned()
            .unwrap_or_else(|| format!("Could you tell me the {}?", slot.replace('_', " ")))
    }
}

fn autofill(slots: &mut Slots, slot: &str, value: Option<f64>) {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return;
    };
    let absent = slots.get(slot).map_or(true, SlotValue::is_empty);
    if absent {
        slots.insert(slot.to_string(), SlotValue::Number(value));
    }
}

/// Mental state and accompanying symptoms first, then every slot value.
fn danger_text(slots: &Slots) -> String {
    let mut parts: Vec<String> = Vec::new();
    for key in [slot_names::MENTAL_STATE, slot_names::ACCOMPANYING_SYMPTOMS] {
        if let Some(value) = slots.get(key) {
            parts.push(value.to_text());
        }
    }
    parts.extend(slots.values().map(SlotValue::to_text));
    parts.join(" ").to_lowercase()
}

fn default_decision(symptom: &str) -> Decision {
    match symptom {
        "fever" => Decision::new(
            TriageLevel::HomeCare,
            "Fever without warning signs",
            "Keep your child hydrated, use a fever reducer for comfort and recheck the temperature every 4 hours.",
        ),
        "cough" => Decision::new(
            TriageLevel::HomeCare,
            "Cough without breathing difficulty",
            "Offer fluids, keep the air humid and see a doctor if breathing becomes fast or labored.",
        ),
        "vomiting" => Decision::new(
            TriageLevel::Outpatient,
            "Vomiting without warning signs",
            "Give small sips of oral rehydration solution and book a visit if it continues past 24 hours.",
        ),
        "diarrhea" => Decision::new(
            TriageLevel::HomeCare,
            "Diarrhea without dehydration signs",
            "Give oral rehydration solution and watch for fewer wet diapers or a dry mouth.",
        ),
        "rash" => Decision::new(
            TriageLevel::Outpatient,
            "Rash without warning signs",
            "Book a pediatric visit; go to the emergency department if spots do not fade when pressed.",
        ),
        _ => Decision::new(
            TriageLevel::HomeCare,
            "No warning signs identified",
            "Observe your child at home and seek care if symptoms worsen.",
        ),
    }
}
