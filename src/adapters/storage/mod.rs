//! Session record storage adapters.
//!
//! - `InMemorySessionRecordStorage` - For tests and single-process development
//! - `FileSessionRecordStorage` - JSON files on local disk
//! - `RedisSessionRecordStorage` - Shared Redis for multi-process deployments

mod file_session_storage;
mod in_memory_session_storage;
mod redis_session_storage;

pub use file_session_storage::FileSessionRecordStorage;
pub use in_memory_session_storage::InMemorySessionRecordStorage;
pub use redis_session_storage::RedisSessionRecordStorage;
