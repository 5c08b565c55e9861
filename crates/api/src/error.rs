use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use opsportal_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `opsportal_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error onto an HTTP status, error code, and message.
///
/// - validation problems map to 400
/// - unknown entities, blockers and employees map to 404
/// - conflicts and illegal transitions map to 409
/// - an unreachable store or directory maps to 503 and may be retried
/// - everything else maps to 500 with a sanitized message
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::InvalidAttachmentReference(_) => (
            StatusCode::BAD_REQUEST,
            "INVALID_ATTACHMENT_REFERENCE",
            err.to_string(),
        ),
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        CoreError::BlockerNotFound { .. } => {
            (StatusCode::NOT_FOUND, "BLOCKER_NOT_FOUND", err.to_string())
        }
        CoreError::DirectoryLookupFailed { .. } => (
            StatusCode::NOT_FOUND,
            "DIRECTORY_LOOKUP_FAILED",
            err.to_string(),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::IllegalTransition { .. } => {
            (StatusCode::CONFLICT, "ILLEGAL_TRANSITION", err.to_string())
        }
        CoreError::DependencyUnavailable(msg) => {
            tracing::warn!(error = %msg, "Dependency unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "DEPENDENCY_UNAVAILABLE",
                "A required service is unavailable, try again".to_string(),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
