//! HTTP mapping of service errors.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tervis_core::{AppError, ThrottleDecision};
use tracing::error;

/// Error returned by the HTTP handlers.
///
/// Every variant renders as a JSON object with an `error` field. Internal
/// errors are logged and replaced by a generic message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    TooManyRequests(ThrottleDecision),
    Internal(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.user_message())
        } else {
            ApiError::Internal(err)
        }
    }
}

/// Malformed bodies, wrong field types and missing content types all
/// answer 400 with the usual `{ "error" }` payload.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::TooManyRequests(decision) => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Daily search limit reached",
                    "used": decision.used,
                    "limit": decision.limit,
                })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!("Internal error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
