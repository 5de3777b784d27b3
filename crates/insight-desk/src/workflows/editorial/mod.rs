//! Editorial workflow for insights articles: authoring drafts, gating review on
//! unresolved placeholders, and publishing snapshots for the read path.

pub mod content;
pub mod drafts;
pub mod notify;
pub mod placeholders;
pub mod publish;
pub mod storage;

pub use content::{ContentBlock, ContentDocument, ContentError, PlaceholderNode};
pub use drafts::{
    ApprovalOutcome, Draft, DraftRepository, DraftService, DraftServiceError, DraftStatus,
    GateDecision, GateEvaluator, NewDraft, Slug,
};
pub use notify::{DisabledNotifier, ResendNotifier, ReviewLinks, ReviewNotifier};
pub use placeholders::{
    scan, scan_with, MapAvailability, Marker, MarkerClass, ScanOptions, ScanReport,
};
pub use publish::{ArticleStore, PublishPipeline, PublishReport, PublishedArticle};
pub use storage::{FileStore, MemoryStore};
