//! Axum middleware for the abusive-request throttle.
//!
//! Runs before any route-specific work so throttled requests incur minimal
//! cost, and before the authorization gate in the standard pipeline.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::AppState;
use crate::ratelimit::{client_identifier, ClientId, Outcome, RateLimitError};

/// Throttles requests by normalized client IP and route path.
///
/// # Behavior
///
/// - If the throttle is not configured (`state.rate_limiter` is `None`),
///   requests pass through.
/// - Redis trouble inside the limiter fails open; this layer only ever
///   rejects with `429 Too Many Requests` plus a `Retry-After` header.
/// - Stores [`ClientId`] in request extensions for downstream handlers.
pub async fn throttle_by_ip(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let Some(ref limiter) = state.rate_limiter else {
        return Ok(next.run(request).await);
    };

    let client = client_identifier(
        request.headers(),
        connect_info.as_ref(),
        limiter.config().trust_proxy,
    );
    request.extensions_mut().insert(ClientId(client.clone()));

    let path = request.uri().path().to_string();
    debug!(client = %client, path = %path, "Checking throttle");

    match limiter.check(&client, &path).await {
        Outcome::Proceed => Ok(next.run(request).await),
        Outcome::Throttled {
            retry_after,
            message,
        } => {
            debug!(client = %client, retry_after, "Request throttled");
            Err(RateLimitError::Throttled {
                retry_after,
                message,
            })
        }
    }
}
