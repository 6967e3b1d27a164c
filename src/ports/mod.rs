//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the triage core and the outside world. Adapters implement these ports.
//!
//! - `SessionRecordStorage` - Durable key-value store for session records
//! - `IntentExtractor` - Message classification and entity extraction
//! - `ProfileReader` - Child profile lookup for slot auto-fill
//! - `KnowledgeRetriever` - Answers for open questions

mod intent_extractor;
mod knowledge_retriever;
mod profile_reader;
mod session_storage;

pub use intent_extractor::{Extraction, ExtractionError, IntentExtractor};
pub use knowledge_retriever::{KnowledgeRetriever, RetrievalError, RetrievedAnswer};
pub use profile_reader::{ProfileError, ProfileReader};
pub use session_storage::{SessionRecordStorage, SessionStorageError};
