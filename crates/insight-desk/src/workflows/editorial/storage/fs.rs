use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::workflows::editorial::drafts::{
    Draft, DraftListing, DraftRepository, RejectedRecord, RepositoryError, Slug,
};
use crate::workflows::editorial::publish::{ArticleStore, PublishedArticle};

/// Flat-file store: one pretty-printed JSON file per slug plus a registry file.
#[derive(Debug, Clone)]
pub struct FileStore {
    drafts_dir: PathBuf,
    published_dir: PathBuf,
    registry_path: PathBuf,
}

impl FileStore {
    pub fn new(
        drafts_dir: impl Into<PathBuf>,
        published_dir: impl Into<PathBuf>,
        registry_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            drafts_dir: drafts_dir.into(),
            published_dir: published_dir.into(),
            registry_path: registry_path.into(),
        }
    }

    pub fn drafts_dir(&self) -> &Path {
        &self.drafts_dir
    }

    pub fn published_dir(&self) -> &Path {
        &self.published_dir
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn draft_path(&self, slug: &Slug) -> PathBuf {
        self.drafts_dir.join(format!("{slug}.json"))
    }

    pub fn article_path(&self, slug: &Slug) -> PathBuf {
        self.published_dir.join(format!("{slug}.json"))
    }
}

/// Write `value` next to `path` and rename it into place, so readers never see a partial file.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), RepositoryError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|err| RepositoryError::io(&dir, err))?;

    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    let mut staged = NamedTempFile::new_in(&dir).map_err(|err| RepositoryError::io(&dir, err))?;
    staged
        .write_all(&bytes)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|err| RepositoryError::io(staged.path(), err))?;
    staged
        .persist(path)
        .map_err(|err| RepositoryError::io(path, err.error))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RepositoryError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(RepositoryError::io(path, err)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| RepositoryError::Malformed {
            key: path.display().to_string(),
            reason: err.to_string(),
        })
}

impl DraftRepository for FileStore {
    fn get(&self, slug: &Slug) -> Result<Option<Draft>, RepositoryError> {
        read_json(&self.draft_path(slug))
    }

    fn list(&self) -> Result<DraftListing, RepositoryError> {
        let entries = match fs::read_dir(&self.drafts_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DraftListing::default()),
            Err(err) => return Err(RepositoryError::io(&self.drafts_dir, err)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| RepositoryError::io(&self.drafts_dir, err))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut listing = DraftListing::default();
        for path in paths {
            let key = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();

            match read_json::<Draft>(&path) {
                Ok(Some(draft)) if draft.slug().as_str() == stem => listing.drafts.push(draft),
                Ok(Some(draft)) => listing.rejected.push(RejectedRecord {
                    key,
                    reason: format!("file name does not match slug '{}'", draft.slug()),
                }),
                // Removed between read_dir and read.
                Ok(None) => {}
                Err(RepositoryError::Malformed { reason, .. }) => {
                    listing.rejected.push(RejectedRecord { key, reason })
                }
                Err(err) => listing.rejected.push(RejectedRecord {
                    key,
                    reason: err.to_string(),
                }),
            }
        }
        Ok(listing)
    }

    fn put(&self, draft: &Draft) -> Result<(), RepositoryError> {
        write_json_atomic(&self.draft_path(draft.slug()), draft)
    }

    fn delete(&self, slug: &Slug) -> Result<bool, RepositoryError> {
        let path = self.draft_path(slug);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(RepositoryError::io(path, err)),
        }
    }
}

impl ArticleStore for FileStore {
    fn put_article(&self, article: &PublishedArticle) -> Result<(), RepositoryError> {
        write_json_atomic(&self.article_path(&article.slug), article)
    }

    fn article(&self, slug: &Slug) -> Result<Option<PublishedArticle>, RepositoryError> {
        read_json(&self.article_path(slug))
    }

    fn write_registry(&self, articles: &[PublishedArticle]) -> Result<(), RepositoryError> {
        write_json_atomic(&self.registry_path, articles)
    }

    fn registry(&self) -> Result<Vec<PublishedArticle>, RepositoryError> {
        Ok(read_json(&self.registry_path)?.unwrap_or_default())
    }
}
