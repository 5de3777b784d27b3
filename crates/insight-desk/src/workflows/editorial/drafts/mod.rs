//! Draft records, their review state machine, and the placeholder gate.

pub mod domain;
pub mod gate;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    now, Draft, DraftRevision, DraftStatus, Lifecycle, NewDraft, Slug, Timestamp,
    TransitionError, ValidationError,
};
pub use gate::{GateClearance, GateDecision, GateEvaluator};
pub use repository::{DraftListing, DraftRepository, RejectedRecord, RepositoryError};
pub use router::{review_router, ReviewState};
pub use service::{
    ApprovalOutcome, DraftCreation, DraftInspection, DraftService, DraftServiceError,
    NotificationOutcome, DEFAULT_REVIEWER,
};
