use super::common::*;
use std::sync::Arc;

use crate::workflows::editorial::content::{ContentError, ImageResolution, QuoteResolution};
use crate::workflows::editorial::drafts::{
    ApprovalOutcome, DraftRepository, DraftService, DraftServiceError, DraftStatus,
    GateEvaluator, NewDraft, NotificationOutcome, RepositoryError, TransitionError,
    ValidationError,
};
use crate::workflows::editorial::placeholders::MarkerClass;
use crate::workflows::editorial::storage::MemoryStore;

#[test]
fn create_stores_pending_draft_and_notifies_reviewer() {
    let (service, repository, notifier) = build_service();

    let created = service
        .create(new_draft("jakarta-schools", "<p>Body</p>"))
        .expect("draft created");

    assert_eq!(created.draft.status(), DraftStatus::PendingReview);
    assert_eq!(created.notification, NotificationOutcome::Sent);
    assert_eq!(
        created.review_url,
        "https://guide.example.com/admin/insights/jakarta-schools"
    );

    let stored = repository
        .get(&slug("jakarta-schools"))
        .expect("get succeeds")
        .expect("draft present");
    assert_eq!(stored, created.draft);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].slug.as_str(), "jakarta-schools");
    assert_eq!(notices[0].author.as_deref(), Some("Rina"));
    assert_eq!(notices[0].category, "guides");
}

#[test]
fn create_rejects_missing_fields_without_writing() {
    let (service, repository, notifier) = build_service();

    let result = service.create(NewDraft {
        slug: "incomplete".to_string(),
        title: "Only a title".to_string(),
        ..NewDraft::default()
    });

    match result {
        Err(DraftServiceError::Validation(ValidationError::MissingFields(fields))) => {
            assert_eq!(fields, ["summary", "category", "content"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repository.list().expect("list").drafts.is_empty());
    assert!(notifier.notices().is_empty());
}

#[test]
fn create_conflicts_on_existing_slug() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("dup", "<p>Body</p>"))
        .expect("first create");

    match service.create(new_draft("dup", "<p>Other</p>")) {
        Err(DraftServiceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn notifier_failure_does_not_fail_creation() {
    let repository = Arc::new(MemoryStore::new());
    let service = DraftService::new(
        repository.clone(),
        Arc::new(FailingNotifier),
        GateEvaluator::default(),
        links(),
    );

    let created = service
        .create(new_draft("offline", "<p>Body</p>"))
        .expect("creation survives notifier failure");

    assert!(matches!(created.notification, NotificationOutcome::Failed(_)));
    assert!(repository
        .get(&slug("offline"))
        .expect("get succeeds")
        .is_some());

    match service.resend_notification(&slug("offline")) {
        Err(DraftServiceError::Notify(_)) => {}
        other => panic!("expected notify error on resend, got {other:?}"),
    }
}

#[test]
fn resend_requires_an_existing_draft() {
    let (service, _, _) = build_service();
    let err = service
        .resend_notification(&slug("missing"))
        .expect_err("unknown slug");
    assert!(err.is_not_found());
}

#[test]
fn get_propagates_repository_failures() {
    let service = DraftService::new(
        Arc::new(UnavailableRepository),
        Arc::new(RecordingNotifier::default()),
        GateEvaluator::default(),
        links(),
    );

    match service.get(&slug("any")) {
        Err(DraftServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable repository, got {other:?}"),
    }
}

#[test]
fn approval_is_gated_until_the_image_is_resolved() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("a", &format!("Hello {HERO_MARKER}")))
        .expect("draft created");

    let inspection = service.inspect(&slug("a")).expect("inspect");
    assert_eq!(inspection.report.count(), 1);
    assert_eq!(inspection.report.markers()[0].class, MarkerClass::Image);
    assert_eq!(inspection.report.markers()[0].hint, "hero shot");

    match service.approve(&slug("a"), "editor").expect("approve runs") {
        ApprovalOutcome::Blocked(report) => assert_eq!(report.count(), 1),
        ApprovalOutcome::Approved(_) => panic!("gate should block approval"),
    }
    assert_eq!(
        service.get(&slug("a")).expect("get").status(),
        DraftStatus::PendingReview
    );

    let resolved = service
        .resolve_image(
            &slug("a"),
            HERO_MARKER,
            &ImageResolution {
                image_url: "https://cdn.example.com/hero.jpg".to_string(),
                caption: Some("Morning assembly".to_string()),
                photo_credit: None,
            },
        )
        .expect("image resolved");
    assert_eq!(resolved.report.count(), 0);

    match service.approve(&slug("a"), "  ").expect("approve runs") {
        ApprovalOutcome::Approved(draft) => {
            assert_eq!(draft.status(), DraftStatus::Approved);
            assert_eq!(draft.reviewed_by(), Some("editor"));
            assert!(draft.reviewed_at().is_some());
        }
        ApprovalOutcome::Blocked(report) => panic!("expected approval, got {report:?}"),
    }
}

#[test]
fn resolving_an_image_entry_in_the_list_clears_it() {
    let (service, _, _) = build_service();
    let mut draft = new_draft("gallery", "<p>Body</p>");
    draft.images = vec![HERO_MARKER.to_string()];
    service.create(draft).expect("draft created");

    let inspection = service
        .resolve_image(
            &slug("gallery"),
            HERO_MARKER,
            &ImageResolution {
                image_url: "https://cdn.example.com/hero.jpg".to_string(),
                caption: None,
                photo_credit: None,
            },
        )
        .expect("image entry resolved");

    assert!(inspection.report.is_clear());
    assert_eq!(
        inspection.draft.images(),
        ["https://cdn.example.com/hero.jpg"]
    );
    assert_eq!(inspection.draft.content(), "<p>Body</p>");
}

#[test]
fn marker_split_by_inline_markup_can_be_resolved() {
    let (service, _, _) = build_service();
    service
        .create(new_draft(
            "campus",
            "<p>Tour</p><p>[IMAGE NEEDED: <em>campus</em> gate]</p>",
        ))
        .expect("draft created");

    let before = service.inspect(&slug("campus")).expect("inspect");
    assert_eq!(before.report.count(), 1);
    let reported = before.report.markers()[0].raw.clone();

    let after = service
        .resolve_image(
            &slug("campus"),
            &reported,
            &ImageResolution {
                image_url: "https://cdn.example.com/gate.jpg".to_string(),
                caption: Some("Main gate".to_string()),
                photo_credit: None,
            },
        )
        .expect("split marker resolved");
    assert!(after.report.is_clear());

    match service.approve(&slug("campus"), "editor").expect("approve runs") {
        ApprovalOutcome::Approved(draft) => assert_eq!(draft.status(), DraftStatus::Approved),
        ApprovalOutcome::Blocked(report) => panic!("unexpected block: {report:?}"),
    }
}

#[test]
fn resolving_an_unknown_marker_fails() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("q", "<p>[PULL QUOTE NEEDED: parent view]</p>"))
        .expect("draft created");

    match service.resolve_quote(
        &slug("q"),
        "[PULL QUOTE NEEDED: principal view]",
        &QuoteResolution {
            quote: "It feels like home.".to_string(),
            source: None,
        },
    ) {
        Err(DraftServiceError::Content(ContentError::MarkerNotFound(marker))) => {
            assert_eq!(marker, "[PULL QUOTE NEEDED: principal view]");
        }
        other => panic!("expected marker not found, got {other:?}"),
    }

    let resolved = service
        .resolve_quote(
            &slug("q"),
            "[PULL QUOTE NEEDED: parent view]",
            &QuoteResolution {
                quote: "It feels like home.".to_string(),
                source: Some("Parent, Year 4".to_string()),
            },
        )
        .expect("quote resolved");
    assert!(resolved.report.is_clear());
    assert!(resolved.draft.content().contains("It feels like home."));
}

#[test]
fn approving_twice_is_an_invalid_transition() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("twice", "<p>Clean body</p>"))
        .expect("draft created");
    service.approve(&slug("twice"), "editor").expect("first approval");

    match service.approve(&slug("twice"), "editor") {
        Err(DraftServiceError::Transition(TransitionError::InvalidTransition { from, .. })) => {
            assert_eq!(from, DraftStatus::Approved);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn submit_moves_unsubmitted_records_into_review() {
    let (service, repository, _) = build_service();
    repository
        .insert_raw(
            "legacy",
            r#"{"slug":"legacy","title":"Legacy","summary":"S","category":"news","content":"<p>x</p>","status":"draft","createdAt":"2026-01-05T08:00:00Z","updatedAt":"2026-01-05T08:00:00Z"}"#,
        )
        .expect("seed");

    let submitted = service.submit(&slug("legacy")).expect("submit succeeds");
    assert_eq!(submitted.status(), DraftStatus::PendingReview);
    assert!(service.submit(&slug("legacy")).is_err());
}

#[test]
fn revision_rescans_content() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("rev", "<p>Body</p>"))
        .expect("draft created");

    let inspection = service
        .revise(
            &slug("rev"),
            crate::workflows::editorial::drafts::DraftRevision {
                content: Some("<p>[RESEARCH NEEDED: 2026 fee table]</p>".to_string()),
                ..Default::default()
            },
        )
        .expect("revision applied");
    assert_eq!(inspection.report.count(), 1);
    assert_eq!(inspection.report.markers()[0].to_string(), "Research: 2026 fee table");
}

#[test]
fn delete_reports_missing_records() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("temp", "<p>Body</p>"))
        .expect("draft created");
    service.delete(&slug("temp")).expect("delete succeeds");
    assert!(service.delete(&slug("temp")).expect_err("already gone").is_not_found());
}
