//! Session store: LRU cache in front of durable record storage.
//!
//! Every operation holds one store-wide async mutex over the whole
//! cache-plus-storage step. `load` never fails: storage errors and
//! undecodable records degrade to a fresh session. Such a session is
//! never written back over the record it replaced; `save` refuses it
//! until a later `load` reads the record again.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::session::{decode_session, encode_session, SessionState};
use crate::ports::SessionRecordStorage;

use super::lru_cache::LruCache;

/// Default number of sessions kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

struct Inner {
    cache: LruCache<ConversationId, SessionState>,
    /// Conversations whose durable record could not be read on last load.
    unreadable: HashSet<ConversationId>,
}

pub struct SessionStore {
    inner: Mutex<Inner>,
    storage: Arc<dyn SessionRecordStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionRecordStorage>, cache_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(cache_capacity),
                unreadable: HashSet::new(),
            }),
            storage,
        }
    }

    /// Load a session, creating an empty one if none exists.
    pub async fn load(&self, conversation_id: &ConversationId, user_id: &UserId) -> SessionState {
        let mut inner = self.inner.lock().await;

        if let Some(state) = inner.cache.get(conversation_id) {
            return state.clone();
        }

        match self.storage.get(conversation_id).await {
            Ok(Some(raw)) => match decode_session(&raw) {
                Ok(state) => {
                    tracing::debug!(conversation_id = %conversation_id, "Session loaded from storage");
                    inner.unreadable.remove(conversation_id);
                    inner.cache.put(conversation_id.clone(), state.clone());
                    return state;
                }
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        error = %e,
                        "Stored session is unreadable; starting fresh"
                    );
                    inner.unreadable.insert(conversation_id.clone());
                }
            },
            Ok(None) => {
                inner.unreadable.remove(conversation_id);
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Session storage read failed; starting fresh"
                );
                inner.unreadable.insert(conversation_id.clone());
            }
        }

        tracing::info!(conversation_id = %conversation_id, user_id = %user_id, "Creating session");
        SessionState::new(conversation_id.clone(), user_id.clone())
    }

    /// Write a session through to cache and storage.
    ///
    /// Returns `false` if the durable write failed; the cache is updated
    /// regardless. A session whose stored record could not be read is not
    /// written at all, and stays uncached so the next `load` retries storage.
    pub async fn save(&self, state: &mut SessionState) -> bool {
        state.touch();
        let mut inner = self.inner.lock().await;

        if inner.unreadable.contains(state.conversation_id()) {
            tracing::warn!(
                conversation_id = %state.conversation_id(),
                "Refusing to overwrite a session record that could not be read"
            );
            return false;
        }

        if let Some((evicted, _)) = inner.cache.put(state.conversation_id().clone(), state.clone()) {
            tracing::debug!(conversation_id = %evicted, "Evicted session from cache");
        }

        let raw = match encode_session(state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(conversation_id = %state.conversation_id(), error = %e, "Failed to encode session");
                return false;
            }
        };

        match self
            .storage
            .put(state.conversation_id(), state.user_id(), &raw)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %state.conversation_id(),
                    error = %e,
                    "Session storage write failed"
                );
                false
            }
        }
    }

    /// Delete a session from cache and storage.
    ///
    /// Returns `true` if anything was removed.
    pub async fn delete(&self, conversation_id: &ConversationId) -> bool {
        let mut inner = self.inner.lock().await;
        let cached = inner.cache.remove(conversation_id).is_some();
        inner.unreadable.remove(conversation_id);

        let stored = match self.storage.delete(conversation_id).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(conversation_id = %conversation_id, error = %e, "Session delete failed");
                false
            }
        };

        cached || stored
    }

    /// All sessions of a user, most recently updated first.
    pub async fn list_for_user(&self, user_id: &UserId) -> Vec<SessionState> {
        let inner = self.inner.lock().await;
        let cache = &inner.cache;

        let ids = match self.storage.list_ids_for_user(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Listing sessions failed");
                Vec::new()
            }
        };

        let mut sessions: Vec<SessionState> = cache
            .keys()
            .filter_map(|id| cache.peek(id).cloned())
            .filter(|s| s.user_id() == user_id)
            .collect();

        let missing: Vec<ConversationId> = ids
            .into_iter()
            .filter(|id| !cache.contains(id))
            .collect();
        drop(inner);

        let fetched = join_all(missing.iter().map(|id| self.storage.get(id))).await;
        for (id, result) in missing.iter().zip(fetched) {
            match result.map(|raw| raw.map(|r| decode_session(&r))) {
                Ok(Some(Ok(state))) => sessions.push(state),
                Ok(Some(Err(e))) => {
                    tracing::warn!(conversation_id = %id, error = %e, "Skipping unreadable session")
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(conversation_id = %id, error = %e, "Skipping session"),
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }

    /// Cached conversation ids, least recently used first.
    pub async fn cached_ids(&self) -> Vec<ConversationId> {
        self.inner.lock().await.cache.keys().cloned().collect()
    }

    pub async fn cache_len(&self) -> usize {
        self.inner.lock().await.cache.len()
    }
}
