//! Session Record Storage Port - Durable key-value layer for sessions.
//!
//! Records are opaque serialized strings keyed by conversation id, with a
//! secondary index from user id to that user's conversation ids. Encoding
//! and schema migration live above this port; adapters only move bytes.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, UserId};

/// Errors that can occur during session record storage operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Corrupt index for user {user_id}: {reason}")]
    CorruptIndex { user_id: UserId, reason: String },

    #[error("Storage timed out after {0} seconds")]
    Timeout(u64),
}

impl From<std::io::Error> for SessionStorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Port for the durable session record store
#[async_trait]
pub trait SessionRecordStorage: Send + Sync {
    /// Load the raw record for a conversation, if one exists.
    async fn get(&self, conversation_id: &ConversationId)
        -> Result<Option<String>, SessionStorageError>;

    /// Store the raw record and add the conversation to the user's index.
    async fn put(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
        record: &str,
    ) -> Result<(), SessionStorageError>;

    /// Remove the record and its index entry.
    ///
    /// Returns `false` if nothing was stored.
    async fn delete(&self, conversation_id: &ConversationId) -> Result<bool, SessionStorageError>;

    /// Conversation ids indexed for a user, in no particular order.
    async fn list_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, SessionStorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: SessionStorageError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(err, SessionStorageError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn corrupt_index_names_user() {
        let err = SessionStorageError::CorruptIndex {
            user_id: UserId::new("parent-7").unwrap(),
            reason: "not a list".to_string(),
        };
        assert!(err.to_string().contains("parent-7"));
    }
}
