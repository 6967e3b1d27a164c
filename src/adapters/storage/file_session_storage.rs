//! File-based Session Record Storage Adapter
//!
//! Stores one JSON record per conversation plus one index file per user:
//!
//! ```text
//! <base>/sessions/<conversation_id>.json
//! <base>/sessions/<conversation_id>.owner
//! <base>/users/<user_id>.json        # ["conv-1", "conv-2"]
//! ```
//!
//! Identifiers are escaped so they are always safe file names. Writes go to a
//! temporary file first and are renamed into place.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{SessionRecordStorage, SessionStorageError};

/// File-based storage for session records
#[derive(Debug, Clone)]
pub struct FileSessionRecordStorage {
    base_path: PathBuf,
    index_lock: Arc<Mutex<()>>,
}

impl FileSessionRecordStorage {
    /// Create a new file storage rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileSessionRecordStorage::new("./data/triage");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            index_lock: Arc::new(Mutex::new(())),
        }
    }

    fn sessions_dir(&self) -> PathBuf {
        self.base_path.join("sessions")
    }

    fn users_dir(&self) -> PathBuf {
        self.base_path.join("users")
    }

    fn record_path(&self, conversation_id: &ConversationId) -> PathBuf {
        self.sessions_dir()
            .join(format!("{}.json", escape_file_name(conversation_id.as_str())))
    }

    fn owner_path(&self, conversation_id: &ConversationId) -> PathBuf {
        self.sessions_dir()
            .join(format!("{}.owner", escape_file_name(conversation_id.as_str())))
    }

    fn index_path(&self, user_id: &UserId) -> PathBuf {
        self.users_dir()
            .join(format!("{}.json", escape_file_name(user_id.as_str())))
    }

    async fn read_index(&self, user_id: &UserId) -> Result<BTreeSet<String>, SessionStorageError> {
        let Some(raw) = read_optional(&self.index_path(user_id)).await? else {
            return Ok(BTreeSet::new());
        };
        serde_json::from_str(&raw).map_err(|e| SessionStorageError::CorruptIndex {
            user_id: user_id.clone(),
            reason: e.to_string(),
        })
    }

    async fn write_index(
        &self,
        user_id: &UserId,
        ids: &BTreeSet<String>,
    ) -> Result<(), SessionStorageError> {
        let path = self.index_path(user_id);
        if ids.is_empty() {
            return remove_optional(&path).await.map(|_| ());
        }
        let raw = serde_json::to_string(ids)
            .map_err(|e| SessionStorageError::Backend(e.to_string()))?;
        write_atomic(&path, &raw).await
    }
}

#[async_trait]
impl SessionRecordStorage for FileSessionRecordStorage {
    async fn get(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<String>, SessionStorageError> {
        read_optional(&self.record_path(conversation_id)).await
    }

    async fn put(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
        record: &str,
    ) -> Result<(), SessionStorageError> {
        write_atomic(&self.record_path(conversation_id), record).await?;

        let _guard = self.index_lock.lock().await;
        write_atomic(&self.owner_path(conversation_id), user_id.as_str()).await?;

        let mut ids = self.read_index(user_id).await?;
        if ids.insert(conversation_id.as_str().to_string()) {
            self.write_index(user_id, &ids).await?;
        }
        Ok(())
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<bool, SessionStorageError> {
        let _guard = self.index_lock.lock().await;

        let existed = remove_optional(&self.record_path(conversation_id)).await?;

        let owner_path = self.owner_path(conversation_id);
        if let Some(owner) = read_optional(&owner_path).await? {
            remove_optional(&owner_path).await?;
            if let Ok(user_id) = UserId::new(owner.trim()) {
                let mut ids = self.read_index(&user_id).await?;
                if ids.remove(conversation_id.as_str()) {
                    self.write_index(&user_id, &ids).await?;
                }
            }
        }

        Ok(existed)
    }

    async fn list_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, SessionStorageError> {
        let ids = self.read_index(user_id).await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| ConversationId::new(id).ok())
            .collect())
    }
}

/// Escapes everything except ASCII alphanumerics, `-` and `_`.
fn escape_file_name(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{:02X}", byte));
        }
    }
    escaped
}

async fn read_optional(path: &Path) -> Result<Option<String>, SessionStorageError> {
    match fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_optional(path: &Path) -> Result<bool, SessionStorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), SessionStorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
