use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::gate::GateClearance;

/// Timestamps keep whatever offset they were recorded with.
pub type Timestamp = DateTime<FixedOffset>;

pub fn now() -> Timestamp {
    Utc::now().into()
}

/// Stable draft identity. Doubles as the record's file name, so only ASCII alphanumerics,
/// `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingFields(vec!["slug"]));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ValidationError::InvalidSlug {
                slug: raw.clone(),
                reason: format!("character '{bad}' is not allowed"),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Draft,
    PendingReview,
    Approved,
    Published,
}

impl DraftStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Published => "published",
        }
    }

    /// Statuses the publish pipeline snapshots.
    pub fn is_publishable(self) -> bool {
        matches!(self, Self::Approved | Self::Published)
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status plus the review fields that only exist in later states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lifecycle {
    Draft,
    PendingReview,
    Approved {
        #[serde(rename = "reviewedBy", default, skip_serializing_if = "Option::is_none")]
        reviewed_by: Option<String>,
        #[serde(rename = "reviewedAt", default, skip_serializing_if = "Option::is_none")]
        reviewed_at: Option<Timestamp>,
    },
    Published {
        #[serde(rename = "reviewedBy", default, skip_serializing_if = "Option::is_none")]
        reviewed_by: Option<String>,
        #[serde(rename = "reviewedAt", default, skip_serializing_if = "Option::is_none")]
        reviewed_at: Option<Timestamp>,
        #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
        published_at: Option<Timestamp>,
    },
}

impl Lifecycle {
    pub fn status(&self) -> DraftStatus {
        match self {
            Self::Draft => DraftStatus::Draft,
            Self::PendingReview => DraftStatus::PendingReview,
            Self::Approved { .. } => DraftStatus::Approved,
            Self::Published { .. } => DraftStatus::Published,
        }
    }
}

/// Mutable pre-publication record for one insights article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    slug: Slug,
    title: String,
    summary: String,
    category: String,
    content: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(flatten)]
    lifecycle: Lifecycle,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Draft {
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn status(&self) -> DraftStatus {
        self.lifecycle.status()
    }

    pub fn reviewed_by(&self) -> Option<&str> {
        match &self.lifecycle {
            Lifecycle::Approved { reviewed_by, .. } | Lifecycle::Published { reviewed_by, .. } => {
                reviewed_by.as_deref()
            }
            _ => None,
        }
    }

    pub fn reviewed_at(&self) -> Option<Timestamp> {
        match &self.lifecycle {
            Lifecycle::Approved { reviewed_at, .. } | Lifecycle::Published { reviewed_at, .. } => {
                *reviewed_at
            }
            _ => None,
        }
    }

    pub fn published_at(&self) -> Option<Timestamp> {
        match &self.lifecycle {
            Lifecycle::Published { published_at, .. } => *published_at,
            _ => None,
        }
    }

    /// Whether the human-gated approval step applies to the current status.
    pub fn can_approve(&self) -> bool {
        self.status() == DraftStatus::PendingReview
    }

    /// `draft -> pending_review`.
    pub fn submit(&mut self, now: Timestamp) -> Result<(), TransitionError> {
        match self.lifecycle {
            Lifecycle::Draft => {
                self.lifecycle = Lifecycle::PendingReview;
                self.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("submit")),
        }
    }

    /// `pending_review -> approved`. The clearance must have been issued for this draft in
    /// its current form.
    pub fn approve(
        &mut self,
        clearance: GateClearance,
        reviewer: &str,
        now: Timestamp,
    ) -> Result<(), TransitionError> {
        self.check_clearance(&clearance)?;
        match self.lifecycle {
            Lifecycle::PendingReview => {
                self.lifecycle = Lifecycle::Approved {
                    reviewed_by: Some(reviewer.to_string()),
                    reviewed_at: Some(now),
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("approve")),
        }
    }

    /// `approved -> published`. Returns `false` when the record is already published with
    /// a publication time, which is left untouched.
    pub(crate) fn mark_published(
        &mut self,
        clearance: GateClearance,
        now: Timestamp,
    ) -> Result<bool, TransitionError> {
        self.check_clearance(&clearance)?;
        match &mut self.lifecycle {
            Lifecycle::Approved {
                reviewed_by,
                reviewed_at,
            } => {
                self.lifecycle = Lifecycle::Published {
                    reviewed_by: reviewed_by.take(),
                    reviewed_at: reviewed_at.take(),
                    published_at: Some(now),
                };
                self.updated_at = now;
                Ok(true)
            }
            Lifecycle::Published { published_at, .. } => {
                if published_at.is_some() {
                    return Ok(false);
                }
                *published_at = Some(now);
                self.updated_at = now;
                Ok(true)
            }
            _ => Err(self.invalid("publish")),
        }
    }

    /// Apply editorial changes. The slug never changes. Returns whether anything changed.
    pub fn revise(&mut self, revision: DraftRevision, now: Timestamp) -> Result<bool, ValidationError> {
        let DraftRevision {
            title,
            summary,
            category,
            content,
            images,
            author,
        } = revision;

        for (name, value) in [
            ("title", &title),
            ("summary", &summary),
            ("category", &category),
            ("content", &content),
        ] {
            if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
                return Err(ValidationError::BlankField(name));
            }
        }

        let mut changed = false;
        changed |= replace_if_changed(&mut self.title, title);
        changed |= replace_if_changed(&mut self.summary, summary);
        changed |= replace_if_changed(&mut self.category, category);
        changed |= replace_if_changed(&mut self.content, content);
        changed |= replace_if_changed(&mut self.images, images.map(normalise_images));
        if let Some(author) = author {
            let author = normalise_author(Some(author));
            if author != self.author {
                self.author = author;
                changed = true;
            }
        }

        if changed {
            self.updated_at = now;
        }
        Ok(changed)
    }

    pub(crate) fn apply_resolution(&mut self, content: String, images: Vec<String>, now: Timestamp) {
        self.content = content;
        self.images = images;
        self.updated_at = now;
    }

    fn check_clearance(&self, clearance: &GateClearance) -> Result<(), TransitionError> {
        if clearance.slug() != &self.slug {
            return Err(TransitionError::ForeignClearance {
                issued_for: clearance.slug().clone(),
                slug: self.slug.clone(),
            });
        }
        if !clearance.covers(self) {
            return Err(TransitionError::StaleClearance {
                slug: self.slug.clone(),
            });
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::InvalidTransition {
            from: self.status(),
            action,
        }
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

fn normalise_author(author: Option<String>) -> Option<String> {
    author
        .map(|author| author.trim().to_string())
        .filter(|author| !author.is_empty())
}

fn normalise_images(images: Vec<String>) -> Vec<String> {
    images
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Author-supplied fields for a new draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDraft {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewDraft {
    pub fn validate(&self) -> Result<Slug, ValidationError> {
        let missing: Vec<&'static str> = [
            ("slug", &self.slug),
            ("title", &self.title),
            ("summary", &self.summary),
            ("category", &self.category),
            ("content", &self.content),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        Slug::parse(self.slug.as_str())
    }

    /// Validate and build the record. New drafts enter review immediately.
    pub fn into_draft(self, now: Timestamp) -> Result<Draft, ValidationError> {
        let slug = self.validate()?;
        Ok(Draft {
            slug,
            title: self.title,
            summary: self.summary,
            category: self.category,
            content: self.content,
            images: normalise_images(self.images),
            author: normalise_author(self.author),
            lifecycle: Lifecycle::PendingReview,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a draft's editorial fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DraftRevision {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    /// An empty string clears the author.
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("invalid slug '{slug}': {reason}")]
    InvalidSlug { slug: String, reason: String },
    #[error("{0} must not be blank")]
    BlankField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a draft in status {from}")]
    InvalidTransition {
        from: DraftStatus,
        action: &'static str,
    },
    #[error("gate clearance issued for '{issued_for}' cannot be used for '{slug}'")]
    ForeignClearance { issued_for: Slug, slug: Slug },
    #[error("gate clearance for '{slug}' was issued before its content changed")]
    StaleClearance { slug: Slug },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::editorial::drafts::gate::{GateDecision, GateEvaluator};
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 2, 20, hour, 0, 0)
            .single()
            .expect("valid time")
            .into()
    }

    fn new_draft(slug: &str, content: &str) -> NewDraft {
        NewDraft {
            slug: slug.to_string(),
            title: "Choosing a school".to_string(),
            summary: "What to look for".to_string(),
            category: "guides".to_string(),
            content: content.to_string(),
            author: Some("   ".to_string()),
            images: vec![" https://cdn.example.com/a.jpg ".to_string(), "  ".to_string()],
        }
    }

    fn clearance_for(draft: &Draft) -> GateClearance {
        match GateEvaluator::default().evaluate(draft) {
            GateDecision::Clear(clearance) => clearance,
            GateDecision::Blocked(report) => panic!("expected clear gate, got {report:?}"),
        }
    }

    #[test]
    fn new_drafts_enter_review_with_normalised_fields() {
        let draft = new_draft("choosing-a-school", "<p>Body</p>")
            .into_draft(at(9))
            .expect("valid draft");
        assert_eq!(draft.status(), DraftStatus::PendingReview);
        assert_eq!(draft.author(), None);
        assert_eq!(draft.images(), ["https://cdn.example.com/a.jpg"]);
        assert_eq!(draft.created_at(), draft.updated_at());
        assert!(draft.reviewed_by().is_none());
    }

    #[test]
    fn validation_lists_every_missing_field() {
        let err = NewDraft {
            slug: "x".to_string(),
            title: " ".to_string(),
            ..NewDraft::default()
        }
        .into_draft(at(9))
        .expect_err("missing fields");
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["title", "summary", "category", "content"])
        );
    }

    #[test]
    fn slugs_reject_path_characters() {
        let err = Slug::parse("../etc").expect_err("invalid slug");
        assert!(matches!(err, ValidationError::InvalidSlug { .. }));
        assert_eq!(Slug::parse(" ok_slug-1 ").expect("valid").as_str(), "ok_slug-1");
    }

    #[test]
    fn approval_stamps_review_fields() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let clearance = clearance_for(&draft);
        draft.approve(clearance, "editor@school.id", at(10)).expect("approves");

        assert_eq!(draft.status(), DraftStatus::Approved);
        assert_eq!(draft.reviewed_by(), Some("editor@school.id"));
        assert_eq!(draft.reviewed_at(), Some(at(10)));
        assert_eq!(draft.updated_at(), at(10));
        assert_eq!(draft.published_at(), None);
    }

    #[test]
    fn approval_out_of_order_is_rejected() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let clearance = clearance_for(&draft);
        draft.approve(clearance, "editor", at(10)).expect("approves");

        let err = draft
            .approve(clearance_for(&draft), "editor", at(11))
            .expect_err("already approved");
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: DraftStatus::Approved,
                action: "approve"
            }
        );
        assert!(draft.submit(at(11)).is_err());
    }

    #[test]
    fn clearance_is_bound_to_its_draft() {
        let other = new_draft("other", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let err = draft
            .approve(clearance_for(&other), "editor", at(10))
            .expect_err("foreign clearance");
        assert!(matches!(err, TransitionError::ForeignClearance { .. }));
        assert_eq!(draft.status(), DraftStatus::PendingReview);
    }

    #[test]
    fn publishing_keeps_the_first_publication_time() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        draft
            .approve(clearance_for(&draft), "editor", at(10))
            .expect("approves");

        assert!(draft
            .mark_published(clearance_for(&draft), at(11))
            .expect("publishes"));
        assert!(!draft
            .mark_published(clearance_for(&draft), at(12))
            .expect("no-op"));
        assert_eq!(draft.published_at(), Some(at(11)));
        assert_eq!(draft.reviewed_by(), Some("editor"));
        assert_eq!(draft.updated_at(), at(11));
    }

    #[test]
    fn pending_drafts_cannot_be_published() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let clearance = clearance_for(&draft);
        assert!(draft.mark_published(clearance, at(10)).is_err());
    }

    #[test]
    fn clearance_goes_stale_when_content_changes() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let clearance = clearance_for(&draft);
        draft
            .revise(
                DraftRevision {
                    content: Some("<p>[IMAGE NEEDED: hero]</p>".to_string()),
                    ..DraftRevision::default()
                },
                at(10),
            )
            .expect("valid revision");

        let err = draft
            .approve(clearance, "editor", at(11))
            .expect_err("stale clearance");
        assert!(matches!(err, TransitionError::StaleClearance { .. }));
        assert_eq!(draft.status(), DraftStatus::PendingReview);
        assert!(!GateEvaluator::default().evaluate(&draft).is_clear());
    }

    #[test]
    fn clearance_goes_stale_when_images_change() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let clearance = clearance_for(&draft);
        draft
            .approve(clearance_for(&draft), "editor", at(10))
            .expect("approves");
        draft.apply_resolution(
            draft.content().to_string(),
            vec!["[IMAGE NEEDED: hero]".to_string()],
            at(11),
        );

        let err = draft
            .mark_published(clearance, at(12))
            .expect_err("stale clearance");
        assert!(matches!(err, TransitionError::StaleClearance { .. }));
        assert_eq!(draft.status(), DraftStatus::Approved);
    }

    #[test]
    fn revise_rejects_blank_fields_and_tracks_changes() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let err = draft
            .revise(
                DraftRevision {
                    title: Some("".to_string()),
                    ..DraftRevision::default()
                },
                at(10),
            )
            .expect_err("blank title");
        assert_eq!(err, ValidationError::BlankField("title"));

        let unchanged = draft
            .revise(
                DraftRevision {
                    title: Some("Choosing a school".to_string()),
                    ..DraftRevision::default()
                },
                at(10),
            )
            .expect("valid revision");
        assert!(!unchanged);
        assert_eq!(draft.updated_at(), at(9));

        let changed = draft
            .revise(
                DraftRevision {
                    author: Some("Rina".to_string()),
                    ..DraftRevision::default()
                },
                at(11),
            )
            .expect("valid revision");
        assert!(changed);
        assert_eq!(draft.author(), Some("Rina"));
        assert_eq!(draft.updated_at(), at(11));
    }

    #[test]
    fn records_use_the_camel_case_shape() {
        let mut draft = new_draft("a", "<p>Body</p>").into_draft(at(9)).expect("valid");
        let clearance = clearance_for(&draft);
        draft.approve(clearance, "editor", at(10)).expect("approves");

        let value = serde_json::to_value(&draft).expect("serialises");
        assert_eq!(value["status"], "approved");
        assert_eq!(value["reviewedBy"], "editor");
        assert!(value["createdAt"]
            .as_str()
            .is_some_and(|stamp| stamp.starts_with("2026-02-20T09:00:00")));
        assert!(value.get("publishedAt").is_none());
        assert!(value.get("author").is_none());

        let parsed: Draft = serde_json::from_value(value).expect("parses");
        assert_eq!(parsed, draft);
    }

    #[test]
    fn legacy_records_without_review_fields_parse() {
        let draft: Draft = serde_json::from_value(json!({
            "slug": "legacy",
            "title": "Legacy",
            "summary": "Old record",
            "category": "news",
            "content": "<p>Hi</p>",
            "status": "published",
            "createdAt": "2025-11-01T08:00:00.000Z",
            "updatedAt": "2025-11-02T08:00:00.000Z"
        }))
        .expect("parses");
        assert_eq!(draft.status(), DraftStatus::Published);
        assert_eq!(draft.published_at(), None);
        assert!(draft.images().is_empty());
    }
}
