//! Mock knowledge retriever for testing and offline runs.
//!
//! Answers from a queue, then from an optional fixed answer. With neither
//! configured it reports itself unavailable, which callers treat as a
//! neutral result.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::profile::ChildProfile;
use crate::ports::{KnowledgeRetriever, RetrievalError, RetrievedAnswer};

#[derive(Debug, Clone, Default)]
pub struct MockKnowledgeRetriever {
    responses: Arc<Mutex<VecDeque<Result<RetrievedAnswer, RetrievalError>>>>,
    fallback: Option<RetrievedAnswer>,
    queries: Arc<Mutex<Vec<String>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockKnowledgeRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, answer: RetrievedAnswer) -> Self {
        locked(&self.responses).push_back(Ok(answer));
        self
    }

    pub fn with_error(self, error: RetrievalError) -> Self {
        locked(&self.responses).push_back(Err(error));
        self
    }

    /// Answer every query the queue does not cover with `answer`.
    pub fn always(mut self, answer: RetrievedAnswer) -> Self {
        self.fallback = Some(answer);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        locked(&self.queries).clone()
    }
}

#[async_trait]
impl KnowledgeRetriever for MockKnowledgeRetriever {
    async fn retrieve(
        &self,
        query: &str,
        _profile: Option<&ChildProfile>,
    ) -> Result<RetrievedAnswer, RetrievalError> {
        locked(&self.queries).push(query.to_string());

        if let Some(queued) = locked(&self.responses).pop_front() {
            return queued;
        }
        self.fallback
            .clone()
            .ok_or_else(|| RetrievalError::Unavailable("no knowledge base configured".to_string()))
    }
}
