//! Session-based hierarchical role authorization.
//!
//! The gate decides allow / redirect-to-login / destroy-session for every
//! protected route from the session identity and the route's allow-list.
//! Higher-ranked roles are additive upward: outranking the least-privileged
//! listed role grants access, and the admin level bypasses lists entirely.

pub mod gate;
pub mod hierarchy;
pub mod middleware;
pub mod roles;

pub use gate::{AuthorizationGate, Decision, DenialReason, SessionIdentity};
pub use hierarchy::{RoleHierarchy, ADMIN_LEVEL};
pub use middleware::{
    authorize, require_roles, CurrentUser, RequiredRoles, FLASH_ERROR, FLASH_INTENDED_URL,
    SESSION_LOGGED_IN, SESSION_ROLE, SESSION_ROLE_LEVEL,
};
pub use roles::normalize_roles;
