//! Shared pieces of the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use carebell_accounts::AccountError;
use carebell_assistant::AssistantError;
use carebell_db::DbPool;
use carebell_meds::MedsError;
use carebell_voice::VoiceError;
use rusqlite::Connection;
use thiserror::Error;

/// API error type mapping to HTTP status codes. The message becomes the
/// `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("payment required: {0}")]
    PaymentRequired(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Database(e) => ApiError::InternalServerError(e.to_string()),
            AccountError::Invalid(msg) => ApiError::BadRequest(msg),
            AccountError::EmailTaken => ApiError::Conflict(err.to_string()),
            AccountError::InvalidCredentials | AccountError::SessionNotFound => {
                ApiError::Unauthorized(err.to_string())
            }
            AccountError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

impl From<MedsError> for ApiError {
    fn from(err: MedsError) -> Self {
        match err {
            MedsError::Database(e) => ApiError::InternalServerError(e.to_string()),
            MedsError::Invalid(msg) => ApiError::BadRequest(msg),
            MedsError::NotFound(what) => ApiError::NotFound(what),
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::RateLimited => {
                ApiError::TooManyRequests("Rate limit exceeded. Please try again later.".to_string())
            }
            AssistantError::QuotaExceeded => ApiError::PaymentRequired(
                "Payment required. Please add funds to continue.".to_string(),
            ),
            AssistantError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::warn!(error = %other, "assistant request failed");
                ApiError::BadGateway(other.to_string())
            }
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Config(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

/// Runs blocking database work on the blocking thread pool.
pub(crate) async fn with_conn<T, F>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("database pool: {e}")))?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("blocking task failed: {e}")))?
}
