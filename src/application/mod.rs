//! Application layer - Turn orchestration and session storage.
//!
//! Coordinates the domain (merger, rule engine, dialogue controller) with the
//! ports (extractor, profiles, retriever, record storage).

mod lru_cache;
mod orchestrator;
pub mod responses;
mod session_store;

pub use lru_cache::LruCache;
pub use orchestrator::{
    ConversationOrchestrator, TurnCommand, TurnError, TurnResult, DEFAULT_COLLABORATOR_TIMEOUT,
};
pub use session_store::{SessionStore, DEFAULT_CACHE_CAPACITY};
