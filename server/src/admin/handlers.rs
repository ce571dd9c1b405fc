//! Operator actions against the throttle.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::AppState;
use crate::authz::CurrentUser;
use crate::ratelimit::RateLimitError;

/// Request body for the unblock action.
#[derive(Debug, Deserialize)]
pub struct ClearThrottleRequest {
    /// Normalized client identifier (IPv4 address or IPv6 /64 prefix).
    pub client: String,
    /// Route path whose attempt counter should also be removed.
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearThrottleResponse {
    pub success: bool,
}

/// POST /api/admin/ratelimit/clear
///
/// Removes a client's block and, when a path is given, the matching attempt
/// counter. Bypasses the throttle state machine entirely; idempotent.
#[tracing::instrument(skip(state, body))]
pub async fn clear_throttle(
    State(state): State<AppState>,
    operator: CurrentUser,
    Json(body): Json<ClearThrottleRequest>,
) -> Result<Json<ClearThrottleResponse>, RateLimitError> {
    if let Some(ref limiter) = state.rate_limiter {
        limiter.clear(&body.client, body.path.as_deref()).await?;
    }

    info!(
        client = %body.client,
        path = ?body.path,
        operator_role = ?operator.role,
        "Throttle state cleared by operator"
    );
    Ok(Json(ClearThrottleResponse { success: true }))
}
