use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{DraftRevision, DraftStatus, NewDraft, Slug, Timestamp};
use super::repository::{DraftRepository, RepositoryError};
use super::service::{ApprovalOutcome, DraftService, DraftServiceError};
use crate::workflows::editorial::content::{ImageResolution, QuoteResolution};
use crate::workflows::editorial::notify::ReviewNotifier;
use crate::workflows::editorial::publish::ArticleStore;

/// Shared state for the review endpoints.
pub struct ReviewState<R, N, A> {
    pub service: Arc<DraftService<R, N>>,
    pub articles: Arc<A>,
}

impl<R, N, A> Clone for ReviewState<R, N, A> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            articles: Arc::clone(&self.articles),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DraftSummary {
    slug: Slug,
    title: String,
    category: String,
    status: DraftStatus,
    unresolved: usize,
    updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageRequest {
    marker: String,
    #[serde(flatten)]
    resolution: ImageResolution,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteRequest {
    marker: String,
    #[serde(flatten)]
    resolution: QuoteResolution,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApproveRequest {
    #[serde(default)]
    reviewer: String,
}

/// Router exposing draft review and the published registry.
pub fn review_router<R, N, A>(state: ReviewState<R, N, A>) -> Router
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/insights/drafts",
            get(list_handler::<R, N, A>).post(create_handler::<R, N, A>),
        )
        .route(
            "/api/v1/insights/drafts/:slug",
            get(inspect_handler::<R, N, A>)
                .put(revise_handler::<R, N, A>)
                .delete(delete_handler::<R, N, A>),
        )
        .route(
            "/api/v1/insights/drafts/:slug/images",
            post(image_handler::<R, N, A>),
        )
        .route(
            "/api/v1/insights/drafts/:slug/quotes",
            post(quote_handler::<R, N, A>),
        )
        .route(
            "/api/v1/insights/drafts/:slug/submit",
            post(submit_handler::<R, N, A>),
        )
        .route(
            "/api/v1/insights/drafts/:slug/approve",
            post(approve_handler::<R, N, A>),
        )
        .route(
            "/api/v1/insights/drafts/:slug/notify",
            post(notify_handler::<R, N, A>),
        )
        .route("/api/v1/insights/registry", get(registry_handler::<R, N, A>))
        .with_state(state)
}

fn parse_slug(raw: &str) -> Result<Slug, Response> {
    Slug::parse(raw).map_err(|_| {
        let payload = json!({ "error": "draft not found", "slug": raw });
        (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
    })
}

/// Run synchronous store work on the blocking pool so file I/O stays off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        let payload = json!({ "error": format!("review task failed: {err}") });
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
    })
}

fn error_response(error: DraftServiceError) -> Response {
    let status = match &error {
        DraftServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DraftServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        DraftServiceError::Validation(_)
        | DraftServiceError::Transition(_)
        | DraftServiceError::Content(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DraftServiceError::Notify(_) => StatusCode::BAD_GATEWAY,
        DraftServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn list_handler<R, N, A>(State(state): State<ReviewState<R, N, A>>) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let service = Arc::clone(&state.service);
    let listed = blocking(move || {
        service.list().map(|listing| {
            let gate = service.gate();
            let drafts: Vec<DraftSummary> = listing
                .drafts
                .iter()
                .map(|draft| DraftSummary {
                    slug: draft.slug().clone(),
                    title: draft.title().to_string(),
                    category: draft.category().to_string(),
                    status: draft.status(),
                    unresolved: gate.scan(draft).count(),
                    updated_at: draft.updated_at(),
                })
                .collect();
            (drafts, listing.rejected)
        })
    })
    .await;
    match listed {
        Ok(Ok((drafts, rejected))) => {
            let payload = json!({ "drafts": drafts, "rejected": rejected });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(Err(error)) => error_response(error),
        Err(response) => response,
    }
}

pub(crate) async fn create_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    axum::Json(new_draft): axum::Json<NewDraft>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || service.create(new_draft)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(created) => {
            let payload = json!({
                "draft": created.draft,
                "reviewUrl": created.review_url,
                "notification": created.notification,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn inspect_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || service.inspect(&slug)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(inspection) => (StatusCode::OK, axum::Json(inspection)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn revise_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
    axum::Json(revision): axum::Json<DraftRevision>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || service.revise(&slug, revision)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(inspection) => (StatusCode::OK, axum::Json(inspection)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || service.delete(&slug)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn image_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
    axum::Json(request): axum::Json<ImageRequest>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || {
        service.resolve_image(&slug, &request.marker, &request.resolution)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(inspection) => (StatusCode::OK, axum::Json(inspection)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn quote_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || {
        service.resolve_quote(&slug, &request.marker, &request.resolution)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(inspection) => (StatusCode::OK, axum::Json(inspection)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || service.submit(&slug)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(draft) => (StatusCode::OK, axum::Json(draft)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
    axum::Json(request): axum::Json<ApproveRequest>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || service.approve(&slug, &request.reviewer)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(ApprovalOutcome::Approved(draft)) => (StatusCode::OK, axum::Json(draft)).into_response(),
        Ok(ApprovalOutcome::Blocked(report)) => {
            let payload = json!({
                "error": format!("{} unresolved placeholder(s) remain", report.count()),
                "unresolved": report.count(),
                "markers": report.markers(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn notify_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
    Path(slug): Path<String>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let slug = match parse_slug(&slug) {
        Ok(slug) => slug,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let outcome = match blocking(move || service.resend_notification(&slug)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(delivery) => (StatusCode::ACCEPTED, axum::Json(delivery)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn registry_handler<R, N, A>(
    State(state): State<ReviewState<R, N, A>>,
) -> Response
where
    R: DraftRepository + 'static,
    N: ReviewNotifier + 'static,
    A: ArticleStore + 'static,
{
    let articles = Arc::clone(&state.articles);
    let registry = match blocking(move || articles.registry()).await {
        Ok(registry) => registry,
        Err(response) => return response,
    };
    match registry {
        Ok(articles) => (StatusCode::OK, axum::Json(articles)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
