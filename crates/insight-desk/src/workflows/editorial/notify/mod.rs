//! Reviewer notifications sent when a draft enters review.
//!
//! Delivery is best-effort. Callers log failures and carry on; a notification never rolls
//! back the operation that triggered it.

mod resend;
mod template;

use serde::Serialize;
use tracing::info;
use url::Url;

use super::drafts::{Draft, Slug};

pub use resend::{ResendNotifier, RESEND_ENDPOINT};
pub use template::{html_body, subject, text_body};

/// Builds reviewer-facing links from the site base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewLinks {
    base: Url,
}

impl ReviewLinks {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn review_url(&self, slug: &Slug) -> String {
        format!(
            "{}/admin/insights/{}",
            self.base.as_str().trim_end_matches('/'),
            slug
        )
    }
}

/// What a reviewer needs to find and open the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewNotice {
    pub title: String,
    pub slug: Slug,
    pub category: String,
    pub author: Option<String>,
    pub review_url: String,
}

impl ReviewNotice {
    pub fn for_draft(draft: &Draft, links: &ReviewLinks) -> Self {
        Self {
            title: draft.title().to_string(),
            slug: draft.slug().clone(),
            category: draft.category().to_string(),
            author: draft.author().map(str::to_string),
            review_url: links.review_url(draft.slug()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "delivery", rename_all = "snake_case")]
pub enum Delivery {
    Sent { message_id: Option<String> },
    Skipped { reason: String },
}

/// Outbound reviewer channel (e-mail, chat hook, ...).
pub trait ReviewNotifier: Send + Sync {
    fn notify(&self, notice: &ReviewNotice) -> Result<Delivery, NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("notifier misconfigured: {0}")]
    Build(String),
}

/// Used when no provider credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledNotifier;

impl ReviewNotifier for DisabledNotifier {
    fn notify(&self, notice: &ReviewNotice) -> Result<Delivery, NotifyError> {
        info!(slug = %notice.slug, "review notifications not configured; skipping");
        Ok(Delivery::Skipped {
            reason: "notifications not configured".to_string(),
        })
    }
}
