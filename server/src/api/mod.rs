//! API Router and Application State
//!
//! Central routing configuration and shared state. Every protected route
//! sits behind the same pipeline: throttle first, so abusive requests incur
//! minimal cost, then the session layer, then the authorization gate.

pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    admin,
    authz::{authorize, require_roles, AuthorizationGate},
    config::Config,
    ratelimit::{throttle_by_ip, RateLimiter},
    session::{session_layer, SessionStore},
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Redis client
    pub redis: fred::clients::Client,
    /// Server configuration
    pub config: Arc<Config>,
    /// Session service
    pub sessions: SessionStore,
    /// Authorization gate with the role hierarchy baked in
    pub gate: AuthorizationGate,
    /// Abuse throttle (optional, uses Redis)
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        redis: fred::clients::Client,
        config: Config,
        sessions: SessionStore,
        gate: AuthorizationGate,
        rate_limiter: Option<RateLimiter>,
    ) -> Self {
        Self {
            redis,
            config: Arc::new(config),
            sessions,
            gate,
            rate_limiter,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let hierarchy = state.gate.hierarchy().clone();

    // Any authenticated session.
    let account_routes = Router::new()
        .route("/api/me", get(handlers::me))
        .layer(from_fn_with_state(state.clone(), authorize));

    // Management reports: listed roles, or anyone outranking them.
    let report_routes = Router::new()
        .route("/api/reports", get(handlers::reports))
        .layer(from_fn_with_state(state.clone(), authorize))
        .layer(from_fn(require_roles(&hierarchy, "manager,auditor")));

    // Operator surface.
    let admin_routes = Router::new()
        .route(
            "/api/admin/ratelimit/clear",
            post(admin::clear_throttle),
        )
        .layer(from_fn_with_state(state.clone(), authorize))
        .layer(from_fn(require_roles(&hierarchy, "admin")));

    Router::new()
        .route("/login", get(handlers::login))
        .route("/logout", post(handlers::logout))
        .merge(account_routes)
        .merge(report_routes)
        .merge(admin_routes)
        .layer(from_fn_with_state(state.clone(), session_layer))
        .layer(from_fn_with_state(state.clone(), throttle_by_ip))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
