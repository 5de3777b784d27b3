use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::editorial::drafts::router::{approve_handler, inspect_handler, ApproveRequest};
use crate::workflows::editorial::drafts::{
    review_router, DraftRepository, DraftService, GateEvaluator, ReviewState,
};
use crate::workflows::editorial::publish::PublishPipeline;
use crate::workflows::editorial::storage::{FileStore, MemoryStore};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn inspect_handler_returns_not_found_for_unknown_slug() {
    let service = DraftService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::default()),
        GateEvaluator::default(),
        links(),
    );
    let state = ReviewState {
        service: Arc::new(service),
        articles: Arc::new(MemoryStore::new()),
    };

    let response = inspect_handler::<MemoryStore, RecordingNotifier, MemoryStore>(
        State(state),
        Path("missing".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_slug_is_treated_as_missing() {
    let (service, _, _) = build_service();
    let state = ReviewState {
        service: Arc::new(service),
        articles: Arc::new(MemoryStore::new()),
    };

    let response = approve_handler::<MemoryStore, RecordingNotifier, MemoryStore>(
        State(state),
        Path("Not A Slug".to_string()),
        axum::Json(ApproveRequest::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["slug"], "Not A Slug");
}

#[tokio::test]
async fn create_route_returns_created_with_review_url() {
    let (service, _, notifier) = build_service();
    let router = review_router_with_service(service, Arc::new(MemoryStore::new()));

    let payload = serde_json::to_value(new_draft("bali-villas", "<p>Body</p>")).expect("json");
    let response = router
        .oneshot(json_request("POST", "/api/v1/insights/drafts", payload))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["draft"]["status"], "pending_review");
    assert_eq!(
        body["reviewUrl"],
        "https://guide.example.com/admin/insights/bali-villas"
    );
    assert_eq!(body["notification"]["outcome"], "sent");
    assert_eq!(notifier.notices().len(), 1);
}

#[tokio::test]
async fn create_route_rejects_incomplete_payloads() {
    let (service, repository, _) = build_service();
    let router = review_router_with_service(service, Arc::new(MemoryStore::new()));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/insights/drafts",
            json!({ "slug": "half", "title": "Half a draft" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(repository.list().expect("list").drafts.is_empty());
}

#[tokio::test]
async fn approve_route_reports_unresolved_placeholders_until_resolved() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("a", &format!("<p>Hello {HERO_MARKER}</p>")))
        .expect("draft created");
    let router = review_router_with_service(service, Arc::new(MemoryStore::new()));

    let blocked = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/insights/drafts/a/approve",
            json!({}),
        ))
        .await
        .expect("router responds");
    assert_eq!(blocked.status(), StatusCode::CONFLICT);
    let body = read_json_body(blocked).await;
    assert_eq!(body["unresolved"], 1);
    assert_eq!(body["markers"][0]["hint"], "hero shot");

    let resolved = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/insights/drafts/a/images",
            json!({
                "marker": HERO_MARKER,
                "image_url": "https://cdn.example.com/hero.jpg",
            }),
        ))
        .await
        .expect("router responds");
    assert_eq!(resolved.status(), StatusCode::OK);

    let approved = router
        .oneshot(json_request(
            "POST",
            "/api/v1/insights/drafts/a/approve",
            json!({ "reviewer": "maya" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(approved.status(), StatusCode::OK);
    let body = read_json_body(approved).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["reviewedBy"], "maya");
}

#[tokio::test]
async fn list_route_summarises_unresolved_counts() {
    let (service, _, _) = build_service();
    service
        .create(new_draft("clean", "<p>Ready</p>"))
        .expect("draft created");
    service
        .create(new_draft(
            "rough",
            "<p>[RESEARCH NEEDED: fees]</p><p>[PULL QUOTE NEEDED: parent]</p>",
        ))
        .expect("draft created");
    let router = review_router_with_service(service, Arc::new(MemoryStore::new()));

    let response = router
        .oneshot(
            Request::get("/api/v1/insights/drafts")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let drafts = body["drafts"].as_array().expect("drafts array");
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0]["slug"], "clean");
    assert_eq!(drafts[0]["unresolved"], 0);
    assert_eq!(drafts[1]["slug"], "rough");
    assert_eq!(drafts[1]["unresolved"], 2);
    assert_eq!(body["rejected"], json!([]));
}

#[tokio::test]
async fn registry_route_serves_published_articles() {
    let (service, repository, _) = build_service();
    service
        .create(new_draft("published-one", "<p>Ready to go</p>"))
        .expect("draft created");
    service
        .approve(&slug("published-one"), "editor")
        .expect("approval runs");

    let articles = Arc::new(MemoryStore::new());
    PublishPipeline::new(repository.clone(), articles.clone(), GateEvaluator::default())
        .run()
        .expect("pipeline runs");

    let router = review_router_with_service(service, articles);
    let response = router
        .oneshot(
            Request::get("/api/v1/insights/registry")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let entries = body.as_array().expect("registry array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["slug"], "published-one");
    assert_eq!(entries[0]["readTime"], "1 min read");
}

#[tokio::test]
async fn notify_route_surfaces_delivery() {
    let (service, _, notifier) = build_service();
    service
        .create(new_draft("again", "<p>Body</p>"))
        .expect("draft created");
    let router = review_router_with_service(service, Arc::new(MemoryStore::new()));

    let response = router
        .oneshot(
            Request::post("/api/v1/insights/drafts/again/notify")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    assert_eq!(body["delivery"], "sent");
    assert_eq!(body["message_id"], "msg-1");
    assert_eq!(notifier.notices().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_backed_routes_round_trip_on_the_blocking_pool() {
    let root = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileStore::new(
        root.path().join("drafts"),
        root.path().join("published"),
        root.path().join("registry.json"),
    ));
    let service = DraftService::new(
        store.clone(),
        Arc::new(RecordingNotifier::default()),
        GateEvaluator::default(),
        links(),
    );
    let router = review_router(ReviewState {
        service: Arc::new(service),
        articles: store.clone(),
    });

    let payload = serde_json::to_value(new_draft("ubud", "<p>Body</p>")).expect("json");
    let created = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/insights/drafts", payload))
        .await
        .expect("router responds");
    assert_eq!(created.status(), StatusCode::CREATED);
    assert!(root.path().join("drafts/ubud.json").is_file());

    let fetched = router
        .oneshot(
            Request::get("/api/v1/insights/drafts/ubud")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(fetched.status(), StatusCode::OK);
    let body = read_json_body(fetched).await;
    assert_eq!(body["draft"]["slug"], "ubud");
    assert_eq!(body["report"]["markers"], json!([]));
}
