//! Profile store error types.

use std::path::PathBuf;

/// Errors that can occur when loading or saving a profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Reading or writing the profile file failed
    #[error("profile file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored profile could not be parsed or serialized
    #[error("profile JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
