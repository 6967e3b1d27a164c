//! In-Memory Session Record Storage Adapter
//!
//! Stores session records in memory. Useful for testing and development;
//! read and write failures can be injected to exercise degraded persistence.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{SessionRecordStorage, SessionStorageError};

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<ConversationId, (UserId, String)>,
    by_user: HashMap<UserId, BTreeSet<ConversationId>>,
}

/// In-memory storage for session records
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRecordStorage {
    tables: Arc<RwLock<Tables>>,
    fail_writes: Arc<AtomicBool>,
    failing_reads: Arc<AtomicUsize>,
}

impl InMemorySessionRecordStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next `count` calls to `get` fail.
    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Insert a raw record directly, bypassing failure injection.
    pub async fn insert_raw(&self, conversation_id: ConversationId, user_id: UserId, record: String) {
        let mut tables = self.tables.write().await;
        tables
            .by_user
            .entry(user_id.clone())
            .or_default()
            .insert(conversation_id.clone());
        tables.records.insert(conversation_id, (user_id, record));
    }

    /// Number of stored records
    pub async fn record_count(&self) -> usize {
        self.tables.read().await.records.len()
    }
}

#[async_trait]
impl SessionRecordStorage for InMemorySessionRecordStorage {
    async fn get(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<String>, SessionStorageError> {
        let injected = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SessionStorageError::Backend(
                "read failure injected".to_string(),
            ));
        }

        let tables = self.tables.read().await;
        Ok(tables
            .records
            .get(conversation_id)
            .map(|(_, record)| record.clone()))
    }

    async fn put(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
        record: &str,
    ) -> Result<(), SessionStorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionStorageError::Backend(
                "write failure injected".to_string(),
            ));
        }
        self.insert_raw(conversation_id.clone(), user_id.clone(), record.to_string())
            .await;
        Ok(())
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<bool, SessionStorageError> {
        let mut tables = self.tables.write().await;
        let Some((owner, _)) = tables.records.remove(conversation_id) else {
            return Ok(false);
        };

        if let Some(ids) = tables.by_user.get_mut(&owner) {
            ids.remove(conversation_id);
            if ids.is_empty() {
                tables.by_user.remove(&owner);
            }
        }
        Ok(true)
    }

    async fn list_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, SessionStorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_user
            .get(user_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(id: &str) -> ConversationId {
        ConversationId::new(id).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn put_then_get() {
        let storage = InMemorySessionRecordStorage::new();
        storage.put(&conv("c1"), &user("u1"), "{}").await.unwrap();

        assert_eq!(storage.get(&conv("c1")).await.unwrap().as_deref(), Some("{}"));
        assert_eq!(storage.get(&conv("missing")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn index_tracks_user_conversations() {
        let storage = InMemorySessionRecordStorage::new();
        storage.put(&conv("c1"), &user("u1"), "a").await.unwrap();
        storage.put(&conv("c2"), &user("u1"), "b").await.unwrap();
        storage.put(&conv("c3"), &user("u2"), "c").await.unwrap();

        let ids = storage.list_ids_for_user(&user("u1")).await.unwrap();
        assert_eq!(ids, vec![conv("c1"), conv("c2")]);
    }

    #[tokio::test]
    async fn delete_removes_record_and_index() {
        let storage = InMemorySessionRecordStorage::new();
        storage.put(&conv("c1"), &user("u1"), "a").await.unwrap();

        assert!(storage.delete(&conv("c1")).await.unwrap());
        assert!(!storage.delete(&conv("c1")).await.unwrap());
        assert!(storage.list_ids_for_user(&user("u1")).await.unwrap().is_empty());
        assert_eq!(storage.record_count().await, 0);
    }

    #[tokio::test]
    async fn injected_failures_reject_writes() {
        let storage = InMemorySessionRecordStorage::new();
        storage.set_fail_writes(true);

        let result = storage.put(&conv("c1"), &user("u1"), "a").await;
        assert!(matches!(result, Err(SessionStorageError::Backend(_))));

        storage.set_fail_writes(false);
        assert!(storage.put(&conv("c1"), &user("u1"), "a").await.is_ok());
    }

    #[tokio::test]
    async fn injected_read_failures_are_counted() {
        let storage = InMemorySessionRecordStorage::new();
        storage.put(&conv("c1"), &user("u1"), "a").await.unwrap();
        storage.fail_next_reads(1);

        assert!(storage.get(&conv("c1")).await.is_err());
        assert_eq!(storage.get(&conv("c1")).await.unwrap().as_deref(), Some("a"));
    }
}
