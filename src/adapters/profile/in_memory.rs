//! In-memory profile reader.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::profile::ChildProfile;
use crate::ports::{ProfileError, ProfileReader};

/// Profiles held in a map; `create_default_profile` is insert-if-absent.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileReader {
    profiles: Arc<RwLock<HashMap<UserId, ChildProfile>>>,
    creations: Arc<AtomicUsize>,
}

impl InMemoryProfileReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: UserId, profile: ChildProfile) {
        self.profiles.write().await.insert(user_id, profile);
    }

    /// Number of default profiles this reader created.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileReader for InMemoryProfileReader {
    async fn get_profile(&self, user_id: &UserId) -> Result<ChildProfile, ProfileError> {
        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(user_id.clone()))
    }

    async fn create_default_profile(&self, user_id: &UserId) -> Result<ChildProfile, ProfileError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(user_id) {
            return Err(ProfileError::AlreadyExists(user_id.clone()));
        }
        let profile = ChildProfile::default();
        profiles.insert(user_id.clone(), profile.clone());
        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let reader = InMemoryProfileReader::new();
        let user = UserId::new("u1").unwrap();
        assert!(matches!(
            reader.get_profile(&user).await,
            Err(ProfileError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn second_creation_loses_the_race() {
        let reader = InMemoryProfileReader::new();
        let user = UserId::new("u1").unwrap();

        assert!(reader.create_default_profile(&user).await.is_ok());
        assert!(matches!(
            reader.create_default_profile(&user).await,
            Err(ProfileError::AlreadyExists(_))
        ));
        assert_eq!(reader.creations(), 1);
        assert!(reader.get_profile(&user).await.unwrap().is_blank());
    }
}
