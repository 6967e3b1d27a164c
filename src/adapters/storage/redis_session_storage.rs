//! Redis-backed session record storage for multi-process deployments.
//!
//! Key layout under a configurable prefix:
//!
//! - `<prefix>:session:<conversation_id>` - serialized record (`SET`)
//! - `<prefix>:owner:<conversation_id>` - owning user id (`SET`)
//! - `<prefix>:user:<user_id>` - set of conversation ids (`SADD`)
//!
//! Record, owner and index writes go out as one atomic pipeline.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{SessionRecordStorage, SessionStorageError};

/// Redis session record storage.
#[derive(Clone)]
pub struct RedisSessionRecordStorage {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisSessionRecordStorage {
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Open a multiplexed connection and wrap it.
    pub async fn connect(url: &str, key_prefix: &str) -> Result<Self, SessionStorageError> {
        let client = redis::Client::open(url).map_err(backend_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)?;
        Ok(Self::new(conn, key_prefix))
    }

    fn session_key(&self, conversation_id: &ConversationId) -> String {
        format!("{}:session:{}", self.key_prefix, conversation_id)
    }

    fn owner_key(&self, conversation_id: &ConversationId) -> String {
        format!("{}:owner:{}", self.key_prefix, conversation_id)
    }

    fn user_key(&self, user_id: &UserId) -> String {
        format!("{}:user:{}", self.key_prefix, user_id)
    }
}

fn backend_error(e: redis::RedisError) -> SessionStorageError {
    SessionStorageError::Backend(e.to_string())
}

#[async_trait]
impl SessionRecordStorage for RedisSessionRecordStorage {
    async fn get(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<String>, SessionStorageError> {
        let mut conn = self.conn.clone();
        conn.get(self.session_key(conversation_id))
            .await
            .map_err(backend_error)
    }

    async fn put(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
        record: &str,
    ) -> Result<(), SessionStorageError> {
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .set(self.session_key(conversation_id), record)
            .ignore()
            .set(self.owner_key(conversation_id), user_id.as_str())
            .ignore()
            .sadd(self.user_key(user_id), conversation_id.as_str())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend_error)
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<bool, SessionStorageError> {
        let mut conn = self.conn.clone();
        let owner: Option<String> = conn
            .get(self.owner_key(conversation_id))
            .await
            .map_err(backend_error)?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(self.session_key(conversation_id))
            .del(self.owner_key(conversation_id))
            .ignore();
        if let Some(user_id) = owner.and_then(|o| UserId::new(o).ok()) {
            pipe.srem(self.user_key(&user_id), conversation_id.as_str())
                .ignore();
        }

        let (removed,): (i64,) = pipe.query_async(&mut conn).await.map_err(backend_error)?;
        Ok(removed > 0)
    }

    async fn list_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, SessionStorageError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .smembers(self.user_key(user_id))
            .await
            .map_err(backend_error)?;
        Ok(members
            .into_iter()
            .filter_map(|id| ConversationId::new(id).ok())
            .collect())
    }
}
