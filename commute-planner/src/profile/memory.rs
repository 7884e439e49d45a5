//! In-memory profile store.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::CommuteProfile;

use super::ProfileStore;
use super::error::ProfileError;

/// Profile store that forgets everything when dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    profile: Arc<RwLock<Option<CommuteProfile>>>,
}

impl InMemoryProfileStore {
    pub fn new(profile: Option<CommuteProfile>) -> Self {
        Self {
            profile: Arc::new(RwLock::new(profile)),
        }
    }
}

impl ProfileStore for InMemoryProfileStore {
    async fn load_profile(&self) -> Result<Option<CommuteProfile>, ProfileError> {
        Ok(self.profile.read().await.clone())
    }

    async fn save_profile(&self, profile: &CommuteProfile) -> Result<(), ProfileError> {
        *self.profile.write().await = Some(profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load() {
        let store = InMemoryProfileStore::default();
        assert!(store.load_profile().await.unwrap().is_none());

        let profile = CommuteProfile::new("Home", "Work", "A", "B", "Blue");
        store.save_profile(&profile).await.unwrap();

        assert_eq!(store.load_profile().await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryProfileStore::default();
        let other = store.clone();

        let profile = CommuteProfile::new("Home", "Work", "A", "B", "Blue");
        other.save_profile(&profile).await.unwrap();

        assert_eq!(store.load_profile().await.unwrap(), Some(profile));
    }
}
