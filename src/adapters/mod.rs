//! Adapters - Implementations of port interfaces.
//!
//! - `storage` - Session record storage (in-memory, file, Redis)
//! - `ai` - Extractor and retriever adapters
//! - `profile` - Child profile readers

pub mod ai;
pub mod profile;
pub mod storage;

pub use ai::{MockIntentExtractor, MockKnowledgeRetriever, PassthroughExtractor};
pub use profile::InMemoryProfileReader;
pub use storage::{
    FileSessionRecordStorage, InMemorySessionRecordStorage, RedisSessionRecordStorage,
};
