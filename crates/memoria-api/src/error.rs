//! API error type and its HTTP mapping.
//!
//! Every error serializes as `{"detail": <message>}`, the shape the clients
//! already consume for validation and not-found failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request failed client-side validation.
    #[error("{0}")]
    Validation(String),

    /// Resource does not exist (or is hidden from the caller).
    #[error("{0}")]
    NotFound(String),

    /// Caller is authenticated but not allowed to touch the resource.
    #[error("{0}")]
    Forbidden(String),

    /// Missing, expired or invalid credentials.
    #[error("Credenciales inválidas")]
    Unauthorized,

    /// Unique-constraint style rejection (duplicate email).
    #[error("{0}")]
    Duplicate(String),

    /// Anything unexpected from the db or services.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Duplicate(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!("internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The 404 every slug lookup shares.
pub fn memorial_not_found() -> ApiError {
    ApiError::NotFound("Memorial no encontrado".to_string())
}
