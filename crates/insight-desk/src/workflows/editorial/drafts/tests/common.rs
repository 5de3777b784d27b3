use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;
use url::Url;

use crate::workflows::editorial::drafts::{
    review_router, DraftListing, DraftRepository, DraftService, GateEvaluator, NewDraft,
    RepositoryError, ReviewState, Slug,
};
use crate::workflows::editorial::notify::{
    Delivery, NotifyError, ReviewLinks, ReviewNotice, ReviewNotifier,
};
use crate::workflows::editorial::storage::MemoryStore;
use crate::workflows::editorial::Draft;

pub(super) const HERO_MARKER: &str = "[IMAGE NEEDED: hero shot]";

pub(super) fn links() -> ReviewLinks {
    ReviewLinks::new(Url::parse("https://guide.example.com").expect("valid url"))
}

pub(super) fn slug(raw: &str) -> Slug {
    Slug::parse(raw).expect("valid slug")
}

pub(super) fn new_draft(slug: &str, content: &str) -> NewDraft {
    NewDraft {
        slug: slug.to_string(),
        title: "Choosing an international school in Jakarta".to_string(),
        summary: "Fees, curricula and commute times compared".to_string(),
        category: "guides".to_string(),
        content: content.to_string(),
        author: Some("Rina".to_string()),
        images: Vec::new(),
    }
}

pub(super) fn build_service() -> (
    DraftService<MemoryStore, RecordingNotifier>,
    Arc<MemoryStore>,
    Arc<RecordingNotifier>,
) {
    let repository = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = DraftService::new(
        repository.clone(),
        notifier.clone(),
        GateEvaluator::default(),
        links(),
    );
    (service, repository, notifier)
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notices: Mutex<Vec<ReviewNotice>>,
}

impl RecordingNotifier {
    pub(super) fn notices(&self) -> Vec<ReviewNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl ReviewNotifier for RecordingNotifier {
    fn notify(&self, notice: &ReviewNotice) -> Result<Delivery, NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice.clone());
        Ok(Delivery::Sent {
            message_id: Some("msg-1".to_string()),
        })
    }
}

pub(super) struct FailingNotifier;

impl ReviewNotifier for FailingNotifier {
    fn notify(&self, _notice: &ReviewNotice) -> Result<Delivery, NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl DraftRepository for UnavailableRepository {
    fn get(&self, _slug: &Slug) -> Result<Option<Draft>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<DraftListing, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn put(&self, _draft: &Draft) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _slug: &Slug) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn review_router_with_service(
    service: DraftService<MemoryStore, RecordingNotifier>,
    articles: Arc<MemoryStore>,
) -> axum::Router {
    review_router(ReviewState {
        service: Arc::new(service),
        articles,
    })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
