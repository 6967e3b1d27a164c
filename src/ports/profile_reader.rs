//! ProfileReader port for child profile lookups

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::profile::ChildProfile;

/// Read access to stored child profiles, used only for slot auto-fill.
#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// Get the profile for a user.
    async fn get_profile(&self, user_id: &UserId) -> Result<ChildProfile, ProfileError>;

    /// Create an empty profile for a user who has none.
    ///
    /// Returns `ProfileError::AlreadyExists` if another caller created it first.
    async fn create_default_profile(&self, user_id: &UserId) -> Result<ChildProfile, ProfileError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProfileError {
    #[error("no profile for user {0}")]
    NotFound(UserId),

    #[error("profile for user {0} already exists")]
    AlreadyExists(UserId),

    #[error("profile source unavailable: {0}")]
    Unavailable(String),
}
