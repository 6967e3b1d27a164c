//! Knowledge Retriever Port - Answer generation for open questions.
//!
//! Consulted only when the dialogue controller chooses a knowledge lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::profile::ChildProfile;

/// Port for retrieval-augmented answers
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        profile: Option<&ChildProfile>,
    ) -> Result<RetrievedAnswer, RetrievalError>;
}

/// An answer with the sources it was drawn from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedAnswer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl RetrievedAnswer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    #[error("retriever unavailable: {0}")]
    Unavailable(String),

    #[error("no answer found")]
    NoAnswer,

    #[error("retrieval timed out after {0} ms")]
    Timeout(u64),
}
