use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::lifecycle::InvalidTransition;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    /// A storage call failed; `context` names the operation, e.g.
    /// "Error fetching campaigns".
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Failed to parse AI-generated content: {0}")]
    AiParse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("External service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Coarse classification callers use to decide between retrying,
/// fixing input, or giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::AiParse(_) => {
                ErrorKind::Validation
            }
            AppError::Conflict(_) | AppError::InvalidTransition(_) => ErrorKind::Conflict,
            AppError::Storage { source, .. } => match source {
                sqlx::Error::RowNotFound => ErrorKind::NotFound,
                sqlx::Error::Database(db) if db.is_unique_violation() => ErrorKind::Conflict,
                _ => ErrorKind::Transport,
            },
            AppError::RateLimited
            | AppError::Request(_)
            | AppError::AiProvider(_)
            | AppError::ServiceUnavailable(_) => ErrorKind::Transport,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Attach a human-readable operation description to a storage error.
pub trait StorageContext<T> {
    fn context(self, context: &str) -> AppResult<T>;
}

impl<T> StorageContext<T> for Result<T, sqlx::Error> {
    fn context(self, context: &str) -> AppResult<T> {
        self.map_err(|source| AppError::Storage {
            context: context.to_string(),
            source,
        })
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                self.to_string(),
            ),
            AppError::InvalidTransition(e) => {
                tracing::debug!("Rejected campaign transition: {}", e);
                (StatusCode::CONFLICT, "INVALID_TRANSITION", e.to_string())
            }
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            AppError::Storage { context, source } => {
                tracing::error!("{}: {:?}", context, source);
                match kind {
                    ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", context.clone()),
                    ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT", context.clone()),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        self.to_string(),
                    ),
                }
            }
            AppError::Request(e) => {
                tracing::error!("HTTP request error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "EXTERNAL_REQUEST_FAILED",
                    "Failed to communicate with external service".to_string(),
                )
            }
            AppError::AiProvider(msg) => {
                tracing::error!("AI provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, "AI_PROVIDER_ERROR", msg.clone())
            }
            AppError::AiParse(msg) => {
                tracing::warn!("AI content parse failure: {}", msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "AI_PARSE_ERROR",
                    self.to_string(),
                )
            }
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details: Some(serde_json::json!({
                    "kind": kind,
                    "retryable": kind.is_retryable(),
                })),
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lifecycle::{CampaignEvent, CampaignStatus};

    #[test]
    fn storage_context_prefixes_message() {
        let res: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        let err = res.context("Error fetching campaigns").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Error fetching campaigns: "), "{}", msg);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.kind().is_retryable());
    }

    #[test]
    fn row_not_found_classifies_as_not_found() {
        let res: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = res.context("Error fetching segment").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn parse_failures_are_not_retryable() {
        let err = AppError::AiParse("expected value".to_string());
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.kind().is_retryable());

        let transition = CampaignStatus::Completed
            .apply(&CampaignEvent::Pause)
            .unwrap_err();
        assert_eq!(AppError::from(transition).kind(), ErrorKind::Conflict);
    }

    #[test]
    fn error_response_carries_status_and_kind() {
        let resp = AppError::NotFound("Campaign not found".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::AiParse("eof".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
