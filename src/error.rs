use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::store::StoreError;

/// A request parameter that is malformed, out of range or not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid query param ({param})")]
pub struct ValidationError {
    pub param: &'static str,
}

impl ValidationError {
    pub fn new(param: &'static str) -> Self {
        Self { param }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => {
                tracing::debug!("rejected request: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            ApiError::Store(e) => {
                tracing::warn!("store request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
