use super::article::PublishedArticle;
use crate::workflows::editorial::drafts::{RepositoryError, Slug};

/// Destination for published snapshots and the registry the read path consumes.
pub trait ArticleStore: Send + Sync {
    /// Write one snapshot, replacing any previous snapshot for the slug.
    fn put_article(&self, article: &PublishedArticle) -> Result<(), RepositoryError>;
    fn article(&self, slug: &Slug) -> Result<Option<PublishedArticle>, RepositoryError>;
    /// Replace the whole registry in one atomic step.
    fn write_registry(&self, articles: &[PublishedArticle]) -> Result<(), RepositoryError>;
    /// Current registry; empty if none has been written yet.
    fn registry(&self) -> Result<Vec<PublishedArticle>, RepositoryError>;
}
