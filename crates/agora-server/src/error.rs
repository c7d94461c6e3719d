use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use agora_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or empty identity header")]
    MissingIdentity,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingIdentity => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Store(e) => match e {
                StoreError::SelfReference => StatusCode::BAD_REQUEST,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Unauthorized(_) => StatusCode::FORBIDDEN,
                StoreError::InvalidState(_) | StoreError::Conflict(_) => StatusCode::CONFLICT,
            },
        };

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
