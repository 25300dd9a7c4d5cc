//! Error types for the feed service.
//!
//! `FeedError` is raised by the ranking pipeline; `AppError` is what handlers
//! return and is rendered as a JSON error body.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for handler operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Pipeline failures. Both variants come from collaborators; the pipeline
/// never retries.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("user profile store failed: {0:#}")]
    ProfileStore(#[source] anyhow::Error),

    #[error("candidate source failed: {0:#}")]
    CandidateSource(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Detail is logged, never returned to the client.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        tracing::error!(error = %err, "Feed pipeline failed");
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_internal_errors_are_opaque() {
        let err: AppError = FeedError::CandidateSource(anyhow::anyhow!("connection reset")).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["status"], 500);
        assert!(!body.windows(5).any(|w| w == b"reset"));
    }

    #[actix_web::test]
    async fn test_client_errors_carry_message() {
        let err = AppError::BadRequest("limit must be between 1 and 100".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Bad request: limit must be between 1 and 100");
        assert_eq!(json["status"], 400);

        assert_eq!(
            AppError::Unauthorized("missing x-user-id".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
