//! Authorization decision algorithm.
//!
//! The gate reads the session identity and a route's normalized allow-list
//! and produces a [`Decision`]. It performs no I/O of its own; session
//! mutation and redirects are carried out by the middleware layer.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::authz::hierarchy::{RoleHierarchy, ADMIN_LEVEL};

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No authenticated session.
    NotAuthenticated,
    /// Logged in but role data is missing or unusable.
    InconsistentSession,
    /// Authenticated with a role below the route's requirement.
    InsufficientRole,
}

impl DenialReason {
    /// User-facing message flashed to the next rendered page.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "Please log in to continue.",
            Self::InconsistentSession => "Your session has expired. Please log in again.",
            Self::InsufficientRole => "You do not have permission to access this page.",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed to the handler.
    Allow,
    /// Send the client to the login route with a flash message.
    RedirectToLogin(DenialReason),
    /// Invalidate the session, then send the client to the login route.
    DestroySessionAndRedirect(DenialReason),
}

/// Identity snapshot read from the session record.
///
/// `role_level` is kept as raw JSON because stored sessions are allowed to
/// carry the level as either a number or a numeric string.
#[derive(Debug, Clone, Default)]
pub struct SessionIdentity {
    pub is_logged_in: bool,
    pub role: Option<String>,
    pub role_level: Option<Value>,
}

impl SessionIdentity {
    /// The role level as an integer, when the stored value is usable.
    pub fn coerced_level(&self) -> Option<i64> {
        self.role_level.as_ref().and_then(coerce_level)
    }
}

/// Session-based role authorization gate.
#[derive(Clone)]
pub struct AuthorizationGate {
    hierarchy: Arc<RoleHierarchy>,
}

impl AuthorizationGate {
    pub fn new(hierarchy: Arc<RoleHierarchy>) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Decides whether a session may access a route.
    ///
    /// `required` must already be normalized (see [`crate::authz::roles`]).
    /// Decision order short-circuits: authentication, open routes, session
    /// consistency, admin bypass, exact role match, then hierarchical rank.
    pub fn evaluate(&self, identity: &SessionIdentity, required: &[String]) -> Decision {
        if !identity.is_logged_in {
            return Decision::RedirectToLogin(DenialReason::NotAuthenticated);
        }

        if required.is_empty() {
            return Decision::Allow;
        }

        // A logged-in session without usable role data is corrupted or stale.
        // It must be invalidated, not merely rejected, so the client cannot
        // retry the inconsistent state transparently.
        let role = identity
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let level = identity.coerced_level().filter(|l| *l != 0);
        let (Some(role), Some(level)) = (role, level) else {
            debug!(
                role = ?identity.role,
                role_level = ?identity.role_level,
                "Session carries a restriction but no usable role data"
            );
            return Decision::DestroySessionAndRedirect(DenialReason::InconsistentSession);
        };

        // Admin rank grants access regardless of the allow-list contents.
        if level >= ADMIN_LEVEL {
            return Decision::Allow;
        }

        if required.iter().any(|r| r == role) {
            return Decision::Allow;
        }

        // Hierarchy is additive upward: outranking the least-privileged role
        // explicitly allowed on the route grants access.
        let min_required = self.hierarchy.min_level(required.iter().map(String::as_str));
        debug!(
            role = %role,
            level,
            ?min_required,
            required = ?required,
            "Hierarchical access check"
        );
        if let Some(min_required) = min_required {
            if level >= min_required {
                return Decision::Allow;
            }
        }

        Decision::RedirectToLogin(DenialReason::InsufficientRole)
    }
}

/// Coerces a stored role level to an integer, tolerating numeric strings.
fn coerce_level(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
