use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Errors surfaced on the HTTP side (webhook and health endpoints).
#[derive(Debug)]
pub enum AppError {
    Unauthorized(String),
    BadRequest(String),
    ServiceUnavailable(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg, "SERVICE_UNAVAILABLE")
            }
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR",
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::ServiceUnavailable(format!("database unavailable: {}", err))
    }
}

/// Content or state policy that rejected a user action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("links are not allowed in chat")]
    LinkBlocked,
    #[error("media is locked for another {remaining_secs}s")]
    MediaLocked { remaining_secs: u64 },
    #[error("this feature requires premium")]
    PremiumRequired,
    #[error("action not allowed while in an active chat")]
    InActiveChat,
    #[error("user is banned")]
    Banned,
}

/// Domain errors raised by the chat core.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("report ticket expired")]
    ExpiredTicket,

    #[error("partner is unreachable")]
    PartnerUnreachable,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("admin privileges required")]
    Forbidden,

    #[error("{0} is not configured")]
    Configuration(&'static str),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl ChatError {
    /// Normal negative results the caller answers with fallback UX.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatError::NotFound(_) | ChatError::ExpiredTicket)
    }
}
