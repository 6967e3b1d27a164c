//! Mock intent extractor for testing.
//!
//! Returns queued extractions in order, with optional delay and error
//! injection, and records every message it was asked about.
//!
//! # Example
//!
//! ```ignore
//! let extractor = MockIntentExtractor::new()
//!     .with_extraction(Extraction::new(Intent::Greeting))
//!     .with_error(ExtractionError::Unavailable("down".into()));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::profile::ChildProfile;
use crate::domain::session::Slots;
use crate::ports::{Extraction, ExtractionError, IntentExtractor};

/// A call the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractCall {
    pub message: String,
    pub profile: Option<ChildProfile>,
    pub slot_count: usize,
}

/// Mock extractor with queued responses.
#[derive(Debug, Clone, Default)]
pub struct MockIntentExtractor {
    responses: Arc<Mutex<VecDeque<Result<Extraction, ExtractionError>>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<ExtractCall>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockIntentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful extraction.
    pub fn with_extraction(self, extraction: Extraction) -> Self {
        locked(&self.responses).push_back(Ok(extraction));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ExtractionError) -> Self {
        locked(&self.responses).push_back(Err(error));
        self
    }

    /// Queue a successful extraction on a shared instance.
    pub fn push_extraction(&self, extraction: Extraction) {
        locked(&self.responses).push_back(Ok(extraction));
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<ExtractCall> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl IntentExtractor for MockIntentExtractor {
    async fn extract(
        &self,
        message: &str,
        profile: Option<&ChildProfile>,
        accumulated_slots: &Slots,
    ) -> Result<Extraction, ExtractionError> {
        locked(&self.calls).push(ExtractCall {
            message: message.to_string(),
            profile: profile.cloned(),
            slot_count: accumulated_slots.len(),
        });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        locked(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(Extraction::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::Intent;

    #[tokio::test]
    async fn returns_queued_responses_in_order() {
        let extractor = MockIntentExtractor::new()
            .with_extraction(Extraction::new(Intent::Greeting))
            .with_error(ExtractionError::Unavailable("down".to_string()));

        let first = extractor.extract("hi", None, &Slots::new()).await.unwrap();
        let second = extractor.extract("again", None, &Slots::new()).await;
        let third = extractor.extract("more", None, &Slots::new()).await.unwrap();

        assert_eq!(first.intent, Some(Intent::Greeting));
        assert!(second.is_err());
        assert_eq!(third, Extraction::default());
        assert_eq!(extractor.call_count(), 3);
        assert_eq!(extractor.calls()[1].message, "again");
    }
}
