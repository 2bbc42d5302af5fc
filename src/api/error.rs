use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::model::UrlState;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// HTTP-facing error, separate from [`crate::error::CoreError`]: the core
/// never errors on a "conflicting" submission (it just returns the existing
/// task), so the request layer is what decides a conflict deserves a 409.
pub enum ApiError {
    NotFound,
    Conflict(UrlState),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "no url with that id".to_string()),
            ApiError::Conflict(state) => (
                StatusCode::CONFLICT,
                format!("url is already in state {state:?}"),
            ),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
