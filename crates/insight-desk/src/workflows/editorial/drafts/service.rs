use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{now, Draft, DraftRevision, NewDraft, Slug, TransitionError, ValidationError};
use super::gate::{GateDecision, GateEvaluator};
use super::repository::{DraftListing, DraftRepository, RepositoryError};
use crate::workflows::editorial::content::{
    ContentDocument, ContentError, ImageResolution, QuoteResolution,
};
use crate::workflows::editorial::notify::{
    Delivery, NotifyError, ReviewLinks, ReviewNotice, ReviewNotifier,
};
use crate::workflows::editorial::placeholders::ScanReport;

pub const DEFAULT_REVIEWER: &str = "editor";

/// Service composing the draft repository, placeholder gate, and reviewer notifier.
pub struct DraftService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    gate: GateEvaluator,
    links: ReviewLinks,
}

/// Result of the best-effort review notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DraftCreation {
    pub draft: Draft,
    pub review_url: String,
    pub notification: NotificationOutcome,
}

/// A draft together with its current placeholder report.
#[derive(Debug, Clone, Serialize)]
pub struct DraftInspection {
    pub draft: Draft,
    pub report: ScanReport,
}

#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
    Approved(Draft),
    Blocked(ScanReport),
}

impl<R, N> DraftService<R, N>
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, gate: GateEvaluator, links: ReviewLinks) -> Self {
        Self {
            repository,
            notifier,
            gate,
            links,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn gate(&self) -> &GateEvaluator {
        &self.gate
    }

    pub fn links(&self) -> &ReviewLinks {
        &self.links
    }

    /// Validate and store a new draft in `pending_review`, then notify the reviewer.
    pub fn create(&self, new_draft: NewDraft) -> Result<DraftCreation, DraftServiceError> {
        let draft = new_draft.into_draft(now())?;
        if self.repository.get(draft.slug())?.is_some() {
            return Err(RepositoryError::Conflict.into());
        }
        self.repository.put(&draft)?;
        info!(slug = %draft.slug(), status = %draft.status(), "draft created");

        let notice = ReviewNotice::for_draft(&draft, &self.links);
        let notification = match self.notifier.notify(&notice) {
            Ok(Delivery::Sent { .. }) => NotificationOutcome::Sent,
            Ok(Delivery::Skipped { reason }) => NotificationOutcome::Skipped(reason),
            Err(err) => {
                warn!(slug = %draft.slug(), error = %err, "review notification failed");
                NotificationOutcome::Failed(err.to_string())
            }
        };

        Ok(DraftCreation {
            review_url: notice.review_url,
            draft,
            notification,
        })
    }

    pub fn get(&self, slug: &Slug) -> Result<Draft, DraftServiceError> {
        let draft = self.repository.get(slug)?.ok_or(RepositoryError::NotFound)?;
        Ok(draft)
    }

    pub fn list(&self) -> Result<DraftListing, DraftServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn inspect(&self, slug: &Slug) -> Result<DraftInspection, DraftServiceError> {
        let draft = self.get(slug)?;
        Ok(self.inspection(draft))
    }

    pub fn revise(
        &self,
        slug: &Slug,
        revision: DraftRevision,
    ) -> Result<DraftInspection, DraftServiceError> {
        let mut draft = self.get(slug)?;
        if draft.revise(revision, now())? {
            self.repository.put(&draft)?;
            info!(slug = %slug, "draft revised");
        }
        Ok(self.inspection(draft))
    }

    /// Resolve an image placeholder in content, plus any `images` entry equal to the marker.
    pub fn resolve_image(
        &self,
        slug: &Slug,
        marker: &str,
        resolution: &ImageResolution,
    ) -> Result<DraftInspection, DraftServiceError> {
        let mut draft = self.get(slug)?;
        let mut document = ContentDocument::parse(draft.content());
        let mut resolved = match document.resolve_image(marker, resolution) {
            Ok(count) => count,
            // The marker may live only in the image list.
            Err(ContentError::MarkerNotFound(_)) => 0,
            Err(err) => return Err(err.into()),
        };

        let url = resolution.image_url.trim();
        let images: Vec<String> = draft
            .images()
            .iter()
            .map(|entry| {
                if entry.trim() == marker.trim() {
                    resolved += 1;
                    url.to_string()
                } else {
                    entry.clone()
                }
            })
            .collect();

        if resolved == 0 {
            return Err(ContentError::MarkerNotFound(marker.to_string()).into());
        }
        draft.apply_resolution(document.render(), images, now());
        self.repository.put(&draft)?;
        info!(slug = %slug, marker, resolved, "image placeholder resolved");
        Ok(self.inspection(draft))
    }

    pub fn resolve_quote(
        &self,
        slug: &Slug,
        marker: &str,
        resolution: &QuoteResolution,
    ) -> Result<DraftInspection, DraftServiceError> {
        let mut draft = self.get(slug)?;
        let mut document = ContentDocument::parse(draft.content());
        let resolved = document.resolve_quote(marker, resolution)?;

        let images = draft.images().to_vec();
        draft.apply_resolution(document.render(), images, now());
        self.repository.put(&draft)?;
        info!(slug = %slug, marker, resolved, "pull quote placeholder resolved");
        Ok(self.inspection(draft))
    }

    /// `draft -> pending_review` for records created outside the review flow.
    pub fn submit(&self, slug: &Slug) -> Result<Draft, DraftServiceError> {
        let mut draft = self.get(slug)?;
        draft.submit(now())?;
        self.repository.put(&draft)?;
        info!(slug = %slug, "draft submitted for review");
        Ok(draft)
    }

    /// Run the gate and approve when it is clear. A blocked gate is an outcome, not an error.
    pub fn approve(&self, slug: &Slug, reviewer: &str) -> Result<ApprovalOutcome, DraftServiceError> {
        let mut draft = self.get(slug)?;
        if !draft.can_approve() {
            return Err(TransitionError::InvalidTransition {
                from: draft.status(),
                action: "approve",
            }
            .into());
        }

        let reviewer = match reviewer.trim() {
            "" => DEFAULT_REVIEWER,
            trimmed => trimmed,
        };

        match self.gate.evaluate(&draft) {
            GateDecision::Clear(clearance) => {
                draft.approve(clearance, reviewer, now())?;
                self.repository.put(&draft)?;
                info!(slug = %slug, reviewer, "draft approved");
                Ok(ApprovalOutcome::Approved(draft))
            }
            GateDecision::Blocked(report) => {
                warn!(
                    slug = %slug,
                    unresolved = report.count(),
                    "approval blocked by unresolved placeholders"
                );
                Ok(ApprovalOutcome::Blocked(report))
            }
        }
    }

    /// Send the review notification again. Unlike creation, failures are returned.
    pub fn resend_notification(&self, slug: &Slug) -> Result<Delivery, DraftServiceError> {
        let draft = self.get(slug)?;
        let notice = ReviewNotice::for_draft(&draft, &self.links);
        Ok(self.notifier.notify(&notice)?)
    }

    pub fn delete(&self, slug: &Slug) -> Result<(), DraftServiceError> {
        if !self.repository.delete(slug)? {
            return Err(RepositoryError::NotFound.into());
        }
        info!(slug = %slug, "draft deleted");
        Ok(())
    }

    fn inspection(&self, draft: Draft) -> DraftInspection {
        let report = self.gate.scan(&draft);
        DraftInspection { draft, report }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DraftServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl DraftServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repository(RepositoryError::NotFound))
    }
}
