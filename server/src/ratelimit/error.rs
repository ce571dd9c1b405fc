//! Rate limiting error types for HTTP responses.

use axum::http::header::HeaderValue;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the throttle pipeline.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Redis is unreachable during an operator action. Gate checks never
    /// produce this; they fail open instead.
    #[error("rate limit store unavailable")]
    RedisUnavailable,

    /// Request rejected by the throttle.
    #[error("{message}")]
    Throttled { retry_after: u64, message: String },
}

/// JSON body for throttled responses.
#[derive(Serialize)]
struct ThrottledBody {
    success: bool,
    error: String,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        match self {
            Self::RedisUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ThrottledBody {
                    success: false,
                    error: "Service unavailable. Please try again shortly.".to_string(),
                }),
            )
                .into_response(),
            Self::Throttled {
                retry_after,
                message,
            } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ThrottledBody {
                        success: false,
                        error: message,
                    }),
                )
                    .into_response();
                if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert("Retry-After", v);
                }
                response
            }
        }
    }
}
