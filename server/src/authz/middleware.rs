//! Axum middleware for the authorization gate.
//!
//! [`require_roles`] declares a route's allow-list; [`authorize`] reads the
//! session identity, runs the gate, and turns its decision into a response.
//! Denials redirect to the login route with a one-shot flash message rather
//! than answering 403, so gated dashboards cannot become redirect loops and
//! route existence is not leaked.

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::authz::gate::{Decision, DenialReason, SessionIdentity};
use crate::authz::hierarchy::RoleHierarchy;
use crate::authz::roles::normalize_roles;
use crate::session::Session;

/// Session keys carrying the identity written at login time.
pub const SESSION_LOGGED_IN: &str = "logged_in";
pub const SESSION_ROLE: &str = "role";
pub const SESSION_ROLE_LEVEL: &str = "role_level";

/// Flash key for the user-facing denial message.
pub const FLASH_ERROR: &str = "error";
/// Flash key stashing the originally requested URL across the login redirect.
pub const FLASH_INTENDED_URL: &str = "intended_url";

/// Route allow-list set by [`require_roles`] for downstream [`authorize`].
#[derive(Debug, Clone, Default)]
pub struct RequiredRoles(pub Vec<String>);

/// Identity of an authorized request, injected into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub role: Option<String>,
    pub role_level: Option<i64>,
}

impl SessionIdentity {
    /// Reads the identity snapshot out of the session record.
    pub fn from_session(session: &Session) -> Self {
        Self {
            is_logged_in: session
                .get(SESSION_LOGGED_IN)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            role: session
                .get(SESSION_ROLE)
                .and_then(|v| v.as_str().map(str::to_string)),
            role_level: session.get(SESSION_ROLE_LEVEL),
        }
    }
}

/// Declares the roles accepted by the routes behind this layer.
///
/// Accepts any of the loosely-typed allow-list shapes (see
/// [`crate::authz::roles`]); normalization happens here, once, so the gate
/// only sees canonical lists. Role names absent from the hierarchy are
/// reported at router construction time; at request time they can still
/// match a session role exactly but contribute no level.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/reports", get(reports_handler))
///     .layer(from_fn_with_state(state.clone(), authorize))
///     .layer(from_fn(require_roles(&hierarchy, "manager,auditor")))
/// ```
pub fn require_roles(
    hierarchy: &RoleHierarchy,
    spec: &str,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>>
       + Clone
       + Send
       + 'static {
    let required = normalize_roles([spec]);
    for role in &required {
        if !hierarchy.is_known(role) {
            warn!(
                role = %role,
                "Route allow-list names a role missing from the hierarchy; only exact matches can satisfy it"
            );
        }
    }

    move |mut request: Request, next: Next| {
        let required = RequiredRoles(required.clone());
        Box::pin(async move {
            request.extensions_mut().insert(required);
            next.run(request).await
        })
    }
}

/// Runs the authorization gate for the current request.
///
/// Routes without a [`require_roles`] layer are open to any authenticated
/// session. Must run inside the session layer.
#[tracing::instrument(skip(state, request, next))]
pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let required = request
        .extensions()
        .get::<RequiredRoles>()
        .cloned()
        .unwrap_or_default();

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        warn!("Authorization gate invoked without a session layer");
        return Redirect::to(&state.config.login_path).into_response();
    };

    let identity = SessionIdentity::from_session(&session);

    match state.gate.evaluate(&identity, &required.0) {
        Decision::Allow => {
            let role_level = identity.coerced_level();
            request.extensions_mut().insert(CurrentUser {
                role: identity.role,
                role_level,
            });
            next.run(request).await
        }
        Decision::RedirectToLogin(reason) => {
            debug!(?reason, path = %request.uri().path(), "Request denied");
            if reason == DenialReason::NotAuthenticated {
                // Remember where the client was headed so the login flow can
                // send them back.
                let intended = request
                    .uri()
                    .path_and_query()
                    .map_or_else(|| request.uri().path().to_string(), |pq| pq.as_str().to_string());
                session.set_flash(FLASH_INTENDED_URL, Value::String(intended));
            }
            session.set_flash(
                FLASH_ERROR,
                Value::String(reason.user_message().to_string()),
            );
            Redirect::to(&state.config.login_path).into_response()
        }
        Decision::DestroySessionAndRedirect(reason) => {
            warn!(?reason, "Invalidating inconsistent session");
            state.sessions.invalidate(&session).await;
            session.set_flash(
                FLASH_ERROR,
                Value::String(reason.user_message().to_string()),
            );
            Redirect::to(&state.config.login_path).into_response()
        }
    }
}

impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
