//! Build-time publishing: immutable article snapshots plus the registry read by the site.

mod article;
mod pipeline;
mod store;

pub use article::{format_date, format_iso_date, read_time, PublishedArticle};
pub use pipeline::{PipelineError, PublishPipeline, PublishReport, SkipReason, SkippedDraft};
pub use store::ArticleStore;
