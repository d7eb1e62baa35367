use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("already subscribed to this plan")]
    AlreadyOnPlan,

    #[error("no pending plan change to cancel")]
    NoPendingChange,

    #[error("an active subscription already exists")]
    AlreadySubscribed,

    #[error("email is already registered")]
    EmailTaken,

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Time parse error: {0}")]
    TimeParse(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl MembershipError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MembershipError::AlreadyOnPlan
            | MembershipError::NoPendingChange
            | MembershipError::AlreadySubscribed
            | MembershipError::EmailTaken => StatusCode::CONFLICT,
            MembershipError::Validation(_) => StatusCode::BAD_REQUEST,
            MembershipError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MembershipError::Forbidden(_) => StatusCode::FORBIDDEN,
            MembershipError::NotFound(_) => StatusCode::NOT_FOUND,
            MembershipError::Checkout(_) | MembershipError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MembershipError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (code, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MembershipError>;
