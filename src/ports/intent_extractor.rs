//! Intent Extractor Port - Natural-language understanding boundary.
//!
//! The extractor classifies a user message and pulls out candidate slot
//! values. It is typically backed by an LLM; the core treats it as opaque.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::dialogue::Intent;
use crate::domain::profile::ChildProfile;
use crate::domain::session::Slots;

/// Port for classifying a message and extracting entities
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    /// Extract the intent and entities of one message.
    ///
    /// `accumulated_slots` lets the extractor resolve follow-up answers such
    /// as a bare "3 days" against the question that was asked.
    async fn extract(
        &self,
        message: &str,
        profile: Option<&ChildProfile>,
        accumulated_slots: &Slots,
    ) -> Result<Extraction, ExtractionError>;
}

/// Result of extracting one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub entities: Map<String, JsonValue>,
}

impl Extraction {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent: Some(intent),
            confidence: 1.0,
            entities: Map::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_entity(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.entities.insert(key.into(), value);
        self
    }
}

/// Extraction failures. All of them are recoverable for a turn.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    #[error("extractor unavailable: {0}")]
    Unavailable(String),

    #[error("extractor returned malformed output: {0}")]
    MalformedOutput(String),

    #[error("extraction timed out after {0} ms")]
    Timeout(u64),
}
