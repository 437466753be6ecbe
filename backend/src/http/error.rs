//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::meetings::MeetingServiceError;
use crate::services::slot_validator::{SlotSubmission, SubmissionRejection};

const STORAGE_FAILURE: &str = "The meeting store is unavailable, please try again later.";

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// 1-based position of the refused slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<usize>,
    /// The submission as received, so the client can redisplay it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<SlotSubmission>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            ordinal: None,
            form: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Missing or unreadable caller identity
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Malformed request body or path
    BadRequest(String),
    /// A submission refused by the slot rules
    Validation {
        rejection: SubmissionRejection,
        form: Option<SlotSubmission>,
    },
    Repository(RepositoryError),
}

impl AppError {
    /// Attach the submitted form to a validation error.
    pub fn with_form(self, submission: SlotSubmission) -> Self {
        match self {
            AppError::Validation { rejection, .. } => AppError::Validation {
                rejection,
                form: Some(submission),
            },
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", msg))
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Validation { rejection, form } => {
                let mut error = ApiError::new(rejection.reason.code(), rejection.message);
                error.ordinal = rejection.ordinal;
                error.form = form;
                (StatusCode::BAD_REQUEST, error)
            }
            AppError::Repository(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", e.to_string()))
            }
            AppError::Repository(e) => {
                tracing::error!(error = %e, context = %e.context(), "repository failure");
                let mut error = ApiError::new("REPOSITORY_ERROR", STORAGE_FAILURE);
                if let Some(details) = storage_details(&e) {
                    error = error.with_details(details);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, error)
            }
        };

        (status, Json(error)).into_response()
    }
}

/// Client-safe summary of a storage failure: the failing operation and
/// whether a retry may help. The underlying message stays in the logs.
fn storage_details(err: &RepositoryError) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(op) = &err.context().operation {
        parts.push(format!("operation={}", op));
    }
    if err.is_retryable() {
        parts.push("retryable=true".to_string());
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<MeetingServiceError> for AppError {
    fn from(err: MeetingServiceError) -> Self {
        match err {
            MeetingServiceError::Rejected(rejection) => AppError::Validation {
                rejection,
                form: None,
            },
            MeetingServiceError::Forbidden(msg) => AppError::Forbidden(msg),
            MeetingServiceError::NotFound(id) => {
                AppError::NotFound(format!("Meeting {} not found", id))
            }
            MeetingServiceError::Repository(e) => AppError::Repository(e),
        }
    }
}
