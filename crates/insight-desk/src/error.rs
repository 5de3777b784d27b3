use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::editorial::drafts::DraftServiceError;
use crate::workflows::editorial::publish::PipelineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Drafts(DraftServiceError),
    Pipeline(PipelineError),
    /// A command ran but its outcome is a failure for the caller (e.g. a blocked approval).
    Rejected(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Drafts(err) => write!(f, "draft error: {}", err),
            AppError::Pipeline(err) => write!(f, "publish pipeline error: {}", err),
            AppError::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Drafts(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Rejected(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Drafts(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Drafts(DraftServiceError::Validation(_))
            | AppError::Drafts(DraftServiceError::Transition(_))
            | AppError::Drafts(DraftServiceError::Content(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Rejected(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Drafts(_)
            | AppError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DraftServiceError> for AppError {
    fn from(value: DraftServiceError) -> Self {
        Self::Drafts(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::editorial::drafts::{RepositoryError, ValidationError};

    #[test]
    fn draft_errors_map_to_client_statuses() {
        let missing = AppError::from(DraftServiceError::from(RepositoryError::NotFound));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(DraftServiceError::from(ValidationError::BlankField(
            "title",
        )));
        assert_eq!(
            invalid.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn io_errors_are_internal() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(err.to_string().contains("disk"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
