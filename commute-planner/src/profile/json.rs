//! Disk-backed profile store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::CommuteProfile;

use super::ProfileStore;
use super::error::ProfileError;

/// Configuration for the JSON profile store.
#[derive(Debug, Clone)]
pub struct ProfileStoreConfig {
    /// Path to the profile file.
    pub path: PathBuf,
}

impl ProfileStoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProfileStoreConfig {
    fn default() -> Self {
        Self::new("commute_profile.json")
    }
}

/// Profile store keeping one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    config: ProfileStoreConfig,
}

impl JsonProfileStore {
    pub fn new(config: ProfileStoreConfig) -> Self {
        Self { config }
    }

    /// Get the profile file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn io_error(&self, source: std::io::Error) -> ProfileError {
        ProfileError::Io {
            path: self.config.path.clone(),
            source,
        }
    }
}

impl ProfileStore for JsonProfileStore {
    /// A missing file means no profile yet; a corrupt one is an error.
    async fn load_profile(&self) -> Result<Option<CommuteProfile>, ProfileError> {
        let contents = match tokio::fs::read_to_string(&self.config.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let profile = serde_json::from_str(&contents)?;
        Ok(Some(profile))
    }

    /// Creates parent directories if they don't exist.
    async fn save_profile(&self, profile: &CommuteProfile) -> Result<(), ProfileError> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let json = serde_json::to_string_pretty(profile)?;
        tokio::fs::write(&self.config.path, json)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.config.path.display(), "saved commute profile");
        Ok(())
    }
}
