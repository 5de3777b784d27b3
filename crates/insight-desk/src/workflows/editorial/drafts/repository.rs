use std::path::PathBuf;

use serde::Serialize;

use super::domain::{Draft, Slug};

/// Every parseable draft plus the records that could not be read.
#[derive(Debug, Clone, Default)]
pub struct DraftListing {
    pub drafts: Vec<Draft>,
    pub rejected: Vec<RejectedRecord>,
}

/// A stored record the repository could not turn into a [`Draft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub key: String,
    pub reason: String,
}

/// Storage abstraction keyed by slug, so the lifecycle runs over any backing store.
pub trait DraftRepository: Send + Sync {
    fn get(&self, slug: &Slug) -> Result<Option<Draft>, RepositoryError>;
    fn list(&self) -> Result<DraftListing, RepositoryError>;
    /// Insert or overwrite. Last write wins for the same slug.
    fn put(&self, draft: &Draft) -> Result<(), RepositoryError>;
    fn delete(&self, slug: &Slug) -> Result<bool, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("i/o failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record {key}: {reason}")]
    Malformed { key: String, reason: String },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
