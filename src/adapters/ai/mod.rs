//! Collaborator adapters for extraction and retrieval.
//!
//! ## Available Adapters
//!
//! - `MockIntentExtractor` - Queued extractions for tests
//! - `PassthroughExtractor` - Reads a caller-supplied extraction from the message
//! - `MockKnowledgeRetriever` - Queued or fixed answers for tests and offline runs

mod mock_extractor;
mod mock_retriever;
mod passthrough_extractor;

pub use mock_extractor::{ExtractCall, MockIntentExtractor};
pub use mock_retriever::MockKnowledgeRetriever;
pub use passthrough_extractor::PassthroughExtractor;
