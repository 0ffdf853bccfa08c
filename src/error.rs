use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid driver id: {0}")]
    InvalidDriver(u64),

    #[error("no driver available")]
    NoAvailableDriver,

    #[error("transfer failed: {0}")]
    TransferFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::InvalidAmount(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidDriver(id) => {
                (StatusCode::BAD_REQUEST, format!("invalid driver id: {id}"))
            }
            AppError::NoAvailableDriver => (
                StatusCode::SERVICE_UNAVAILABLE,
                "no driver available".to_string(),
            ),
            AppError::TransferFailure(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
