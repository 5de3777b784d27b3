use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::article::PublishedArticle;
use super::store::ArticleStore;
use crate::workflows::editorial::drafts::{
    now, Draft, DraftRepository, DraftStatus, GateDecision, GateEvaluator, RepositoryError, Slug,
    Timestamp,
};

/// Build-time batch that snapshots approved and published drafts and rebuilds the registry.
pub struct PublishPipeline<R, A> {
    drafts: Arc<R>,
    articles: Arc<A>,
    gate: GateEvaluator,
    // Held for a whole run so the registry has a single writer.
    run_lock: Mutex<()>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Malformed(String),
    Blocked { unresolved: usize },
    Transition(String),
    SnapshotWrite(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed record: {reason}"),
            Self::Blocked { unresolved } => {
                write!(f, "{unresolved} unresolved placeholder(s)")
            }
            Self::Transition(reason) => write!(f, "cannot publish: {reason}"),
            Self::SnapshotWrite(reason) => write!(f, "snapshot write failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDraft {
    pub key: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Drafts snapshotted in this run.
    pub published: Vec<Slug>,
    /// Subset of `published` that moved from approved to published.
    pub promoted: Vec<Slug>,
    /// Published drafts that failed the gate; their previous snapshot stays listed.
    pub held: Vec<Slug>,
    pub skipped: Vec<SkippedDraft>,
    /// Records in draft or pending_review status.
    pub ineligible: usize,
}

impl PublishReport {
    pub fn published_count(&self) -> usize {
        self.published.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn registry_len(&self) -> usize {
        self.published.len() + self.held.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to enumerate drafts: {0}")]
    Enumerate(#[source] RepositoryError),
    #[error("failed to write registry: {0}")]
    Registry(#[source] RepositoryError),
}

impl<R, A> PublishPipeline<R, A>
where
    R: DraftRepository + 'static,
    A: ArticleStore + 'static,
{
    pub fn new(drafts: Arc<R>, articles: Arc<A>, gate: GateEvaluator) -> Self {
        Self {
            drafts,
            articles,
            gate,
            run_lock: Mutex::new(()),
        }
    }

    pub fn run(&self) -> Result<PublishReport, PipelineError> {
        self.run_at(now())
    }

    /// Run with an explicit clock. `now` stamps every draft promoted in this run.
    pub fn run_at(&self, now: Timestamp) -> Result<PublishReport, PipelineError> {
        let _guard = self
            .run_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let listing = self.drafts.list().map_err(PipelineError::Enumerate)?;
        let mut report = PublishReport::default();

        for rejected in listing.rejected {
            warn!(key = %rejected.key, reason = %rejected.reason, "skipping malformed draft record");
            report.skipped.push(SkippedDraft {
                key: rejected.key,
                reason: SkipReason::Malformed(rejected.reason),
            });
        }

        let mut registry = Vec::new();
        for draft in listing.drafts {
            if !draft.status().is_publishable() {
                debug!(slug = %draft.slug(), status = %draft.status(), "draft not eligible");
                report.ineligible += 1;
                continue;
            }
            if let Some(article) = self.publish_one(draft, now, &mut report) {
                registry.push(article);
            }
        }

        registry.sort_by(|left, right| {
            right
                .published_at
                .cmp(&left.published_at)
                .then_with(|| left.slug.cmp(&right.slug))
        });
        self.articles
            .write_registry(&registry)
            .map_err(PipelineError::Registry)?;

        info!(
            published = report.published_count(),
            promoted = report.promoted.len(),
            held = report.held.len(),
            skipped = report.skipped_count(),
            ineligible = report.ineligible,
            registry = registry.len(),
            "publish pipeline finished"
        );
        Ok(report)
    }

    fn publish_one(
        &self,
        mut draft: Draft,
        now: Timestamp,
        report: &mut PublishReport,
    ) -> Option<PublishedArticle> {
        let slug = draft.slug().clone();
        let was_approved = draft.status() == DraftStatus::Approved;

        let clearance = match self.gate.evaluate(&draft) {
            GateDecision::Clear(clearance) => clearance,
            GateDecision::Blocked(scan) => {
                if !was_approved {
                    match self.articles.article(&slug) {
                        Ok(Some(previous)) => {
                            warn!(
                                slug = %slug,
                                unresolved = scan.count(),
                                "published draft has unresolved placeholders; keeping previous snapshot"
                            );
                            report.held.push(slug);
                            return Some(previous);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(slug = %slug, error = %err, "failed to read previous snapshot");
                        }
                    }
                }
                warn!(
                    slug = %slug,
                    unresolved = scan.count(),
                    "skipping draft with unresolved placeholders"
                );
                report.skipped.push(SkippedDraft {
                    key: slug.to_string(),
                    reason: SkipReason::Blocked {
                        unresolved: scan.count(),
                    },
                });
                return None;
            }
        };

        let changed = match draft.mark_published(clearance, now) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(slug = %slug, error = %err, "skipping draft that cannot be published");
                report.skipped.push(SkippedDraft {
                    key: slug.to_string(),
                    reason: SkipReason::Transition(err.to_string()),
                });
                return None;
            }
        };

        let published_at = draft.published_at().unwrap_or(now);
        let article = PublishedArticle::snapshot(&draft, published_at);
        if let Err(err) = self.articles.put_article(&article) {
            warn!(slug = %slug, error = %err, "failed to write published snapshot");
            report.skipped.push(SkippedDraft {
                key: slug.to_string(),
                reason: SkipReason::SnapshotWrite(err.to_string()),
            });
            return None;
        }

        if changed {
            match self.drafts.put(&draft) {
                Ok(()) if was_approved => {
                    info!(slug = %slug, published_at = %published_at, "draft promoted to published");
                    report.promoted.push(slug.clone());
                }
                Ok(()) => {}
                Err(err) => {
                    // The snapshot is live; the next run retries the status change.
                    warn!(slug = %slug, error = %err, "failed to persist published draft");
                }
            }
        }

        report.published.push(slug);
        Some(article)
    }
}
