use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::workflows::editorial::drafts::{
    Draft, DraftListing, DraftRepository, RejectedRecord, RepositoryError, Slug,
};
use crate::workflows::editorial::publish::{ArticleStore, PublishedArticle};

/// Embedded store keeping records as serialised JSON, so unreadable records behave the
/// same way they do on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    drafts: Mutex<BTreeMap<String, String>>,
    articles: Mutex<BTreeMap<Slug, PublishedArticle>>,
    registry: Mutex<Option<Vec<PublishedArticle>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw record under `key`, bypassing validation.
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) -> Result<(), RepositoryError> {
        lock(&self.drafts)?.insert(key.into(), raw.into());
        Ok(())
    }
}

fn decode(key: &str, raw: &str) -> Result<Draft, RepositoryError> {
    serde_json::from_str(raw).map_err(|err| RepositoryError::Malformed {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

impl DraftRepository for MemoryStore {
    fn get(&self, slug: &Slug) -> Result<Option<Draft>, RepositoryError> {
        let drafts = lock(&self.drafts)?;
        drafts
            .get(slug.as_str())
            .map(|raw| decode(slug.as_str(), raw))
            .transpose()
    }

    fn list(&self) -> Result<DraftListing, RepositoryError> {
        let drafts = lock(&self.drafts)?;
        let mut listing = DraftListing::default();
        for (key, raw) in drafts.iter() {
            match decode(key, raw) {
                Ok(draft) if draft.slug().as_str() == key => listing.drafts.push(draft),
                Ok(draft) => listing.rejected.push(RejectedRecord {
                    key: key.clone(),
                    reason: format!("key does not match slug '{}'", draft.slug()),
                }),
                Err(err) => listing.rejected.push(RejectedRecord {
                    key: key.clone(),
                    reason: err.to_string(),
                }),
            }
        }
        Ok(listing)
    }

    fn put(&self, draft: &Draft) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(draft)?;
        lock(&self.drafts)?.insert(draft.slug().to_string(), raw);
        Ok(())
    }

    fn delete(&self, slug: &Slug) -> Result<bool, RepositoryError> {
        Ok(lock(&self.drafts)?.remove(slug.as_str()).is_some())
    }
}

impl ArticleStore for MemoryStore {
    fn put_article(&self, article: &PublishedArticle) -> Result<(), RepositoryError> {
        lock(&self.articles)?.insert(article.slug.clone(), article.clone());
        Ok(())
    }

    fn article(&self, slug: &Slug) -> Result<Option<PublishedArticle>, RepositoryError> {
        Ok(lock(&self.articles)?.get(slug).cloned())
    }

    fn write_registry(&self, articles: &[PublishedArticle]) -> Result<(), RepositoryError> {
        *lock(&self.registry)? = Some(articles.to_vec());
        Ok(())
    }

    fn registry(&self) -> Result<Vec<PublishedArticle>, RepositoryError> {
        Ok(lock(&self.registry)?.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::editorial::drafts::{now, NewDraft};

    #[test]
    fn raw_records_that_fail_to_parse_are_rejected() {
        let store = MemoryStore::new();
        store.insert_raw("broken", "{\"slug\": 4}").expect("seed");
        let draft = NewDraft {
            slug: "fine".to_string(),
            title: "Fine".to_string(),
            summary: "Fine".to_string(),
            category: "news".to_string(),
            content: "<p>Fine</p>".to_string(),
            author: None,
            images: Vec::new(),
        }
        .into_draft(now())
        .expect("valid draft");
        store.put(&draft).expect("put succeeds");

        let listing = store.list().expect("list succeeds");
        assert_eq!(listing.drafts, vec![draft]);
        assert_eq!(listing.rejected.len(), 1);
        assert_eq!(listing.rejected[0].key, "broken");

        let slug = Slug::parse("broken").expect("slug");
        assert!(matches!(store.get(&slug), Err(RepositoryError::Malformed { .. })));
    }
}
