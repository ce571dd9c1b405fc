//! Handlers for the gatekeeper's own routes.
//!
//! Presentation is deliberately thin: the login route is the redirect target
//! for every denial and surfaces the one-shot flash data; the rest are
//! minimal probes behind the gates.

use axum::{
    extract::State,
    response::Redirect,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::authz::{CurrentUser, FLASH_ERROR, FLASH_INTENDED_URL};
use crate::session::Session;

/// Login view payload: whatever the previous request flashed.
#[derive(Debug, Serialize)]
pub struct LoginView {
    pub error: Option<String>,
    pub intended_url: Option<String>,
}

/// GET /login
///
/// Redirect target for unauthenticated, denied, and expired sessions.
pub async fn login(Extension(session): Extension<Session>) -> Json<LoginView> {
    Json(LoginView {
        error: session
            .flash(FLASH_ERROR)
            .and_then(|v| v.as_str().map(str::to_string)),
        intended_url: session
            .flash(FLASH_INTENDED_URL)
            .and_then(|v| v.as_str().map(str::to_string)),
    })
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Redirect {
    state.sessions.invalidate(&session).await;
    Redirect::to(&state.config.login_path)
}

/// Identity snapshot returned by the `/api/me` probe.
#[derive(Debug, Serialize)]
pub struct IdentityView {
    pub role: Option<String>,
    pub role_level: Option<i64>,
}

/// GET /api/me
pub async fn me(user: CurrentUser) -> Json<IdentityView> {
    Json(IdentityView {
        role: user.role,
        role_level: user.role_level,
    })
}

/// GET /api/reports
pub async fn reports(user: CurrentUser) -> Json<Value> {
    Json(json!({
        "success": true,
        "viewer_role": user.role,
    }))
}
