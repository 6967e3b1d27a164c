//! Extractor for callers that classify messages themselves.
//!
//! A caller stages the extraction for a message before the turn runs; the
//! staged entry is consumed by the next `extract` call for that exact text.
//! Without a staged entry, a message that is itself a JSON object carrying
//! `intent` and `entities` is parsed as an [`Extraction`], and plain text
//! yields an empty extraction so the turn still proceeds.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::profile::ChildProfile;
use crate::domain::session::Slots;
use crate::ports::{Extraction, ExtractionError, IntentExtractor};

#[derive(Debug, Clone, Default)]
pub struct PassthroughExtractor {
    staged: Arc<Mutex<HashMap<String, Extraction>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PassthroughExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the extraction to return for `message`.
    pub fn stage(&self, message: impl Into<String>, extraction: Extraction) {
        locked(&self.staged).insert(message.into(), extraction);
    }

    pub fn staged_count(&self) -> usize {
        locked(&self.staged).len()
    }
}

#[async_trait]
impl IntentExtractor for PassthroughExtractor {
    async fn extract(
        &self,
        message: &str,
        _profile: Option<&ChildProfile>,
        _accumulated_slots: &Slots,
    ) -> Result<Extraction, ExtractionError> {
        if let Some(staged) = locked(&self.staged).remove(message) {
            return Ok(staged);
        }

        let trimmed = message.trim();
        if !trimmed.starts_with('{') {
            return Ok(Extraction::default());
        }
        serde_json::from_str(trimmed).map_err(|e| ExtractionError::MalformedOutput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::Intent;
    use serde_json::json;

    #[tokio::test]
    async fn staged_extraction_is_consumed_once() {
        let extractor = PassthroughExtractor::new();
        extractor.stage(
            "孩子发烧了",
            Extraction::new(Intent::Triage).with_entity("symptom", json!("fever")),
        );

        let first = extractor
            .extract("孩子发烧了", None, &Slots::new())
            .await
            .unwrap();
        let second = extractor
            .extract("孩子发烧了", None, &Slots::new())
            .await
            .unwrap();

        assert_eq!(first.intent, Some(Intent::Triage));
        assert_eq!(second, Extraction::default());
        assert_eq!(extractor.staged_count(), 0);
    }

    #[tokio::test]
    async fn parses_embedded_extraction() {
        let message = r#"{"intent": "TRIAGE", "confidence": 0.9, "entities": {"symptom": "fever"}}"#;
        let extraction = PassthroughExtractor::new()
            .extract(message, None, &Slots::new())
            .await
            .unwrap();

        assert_eq!(extraction.intent, Some(Intent::Triage));
        assert_eq!(extraction.entities.get("symptom"), Some(&json!("fever")));
    }

    #[tokio::test]
    async fn plain_text_is_empty_extraction() {
        let extraction = PassthroughExtractor::new()
            .extract("hello", None, &Slots::new())
            .await
            .unwrap();
        assert_eq!(extraction, Extraction::default());
    }

    #[tokio::test]
    async fn broken_json_is_malformed() {
        let result = PassthroughExtractor::new()
            .extract("{intent", None, &Slots::new())
            .await;
        assert!(matches!(result, Err(ExtractionError::MalformedOutput(_))));
    }
}
