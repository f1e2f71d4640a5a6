// ⚠️ Error taxonomy for loading the badge store
// Validation findings are NOT errors here - see validation.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A stored record is not a well-formed badge object.
    /// Fatal to the load: no partial corpus is exposed.
    #[error("malformed record {path}: {reason}")]
    MalformedRecord { path: String, reason: String },

    /// The store root (or a file inside it) could not be read
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn malformed(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        RegistryError::MalformedRecord {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the load failed because of a record's content rather than I/O
    pub fn is_malformed(&self) -> bool {
        matches!(self, RegistryError::MalformedRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
