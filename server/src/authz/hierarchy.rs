//! Role hierarchy table.
//!
//! Process-wide, immutable mapping from role name to numeric privilege level.
//! Built once at startup and injected into the authorization gate.

use std::collections::HashMap;

use tracing::warn;

/// Privilege level at or above which a session bypasses route allow-lists.
pub const ADMIN_LEVEL: i64 = 100;

/// Immutable role name to level mapping. Higher level = more privileged.
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    levels: HashMap<String, i64>,
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::new([
            ("admin", ADMIN_LEVEL),
            ("director", 80),
            ("manager", 50),
            ("executant", 20),
            ("auditor", 10),
        ])
    }
}

impl RoleHierarchy {
    /// Builds a hierarchy from (role, level) pairs.
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            levels: pairs.into_iter().map(|(r, l)| (r.into(), l)).collect(),
        }
    }

    /// Loads the hierarchy from the `ROLE_HIERARCHY` environment variable
    /// (format: `"admin:100,director:80"`), falling back to the defaults.
    pub fn from_env() -> Self {
        match std::env::var("ROLE_HIERARCHY") {
            Ok(raw) => parse_hierarchy(&raw).unwrap_or_else(|| {
                warn!(raw = %raw, "Invalid ROLE_HIERARCHY value, using default hierarchy");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Returns the level for a role name, if the role is known.
    pub fn level_of(&self, role: &str) -> Option<i64> {
        self.levels.get(role).copied()
    }

    /// Whether the role name exists in the hierarchy.
    pub fn is_known(&self, role: &str) -> bool {
        self.levels.contains_key(role)
    }

    /// Minimum level among the given roles that exist in the hierarchy.
    ///
    /// Returns `None` when no role maps to a known level, i.e. the
    /// requirement is unattainable through rank.
    pub fn min_level<'a, I>(&self, roles: I) -> Option<i64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        roles.into_iter().filter_map(|r| self.level_of(r)).min()
    }
}

/// Parses `"role:level,role:level"` into a hierarchy.
fn parse_hierarchy(raw: &str) -> Option<RoleHierarchy> {
    let mut levels = HashMap::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (role, level) = entry.split_once(':')?;
        let role = role.trim();
        let level: i64 = level.trim().parse().ok()?;
        if role.is_empty() {
            return None;
        }
        levels.insert(role.to_string(), level);
    }
    if levels.is_empty() {
        return None;
    }
    Some(RoleHierarchy { levels })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reference_levels() {
        let hierarchy = RoleHierarchy::default();
        assert_eq!(hierarchy.level_of("admin"), Some(100));
        assert_eq!(hierarchy.level_of("director"), Some(80));
        assert_eq!(hierarchy.level_of("manager"), Some(50));
        assert_eq!(hierarchy.level_of("executant"), Some(20));
        assert_eq!(hierarchy.level_of("auditor"), Some(10));
        assert_eq!(hierarchy.level_of("intern"), None);
    }

    #[test]
    fn test_min_level_picks_least_privileged() {
        let hierarchy = RoleHierarchy::default();
        assert_eq!(hierarchy.min_level(["manager", "executant"]), Some(20));
        assert_eq!(hierarchy.min_level(["director"]), Some(80));
    }

    #[test]
    fn test_min_level_ignores_unknown_roles() {
        let hierarchy = RoleHierarchy::default();
        assert_eq!(hierarchy.min_level(["typo", "manager"]), Some(50));
        assert_eq!(hierarchy.min_level(["typo", "another"]), None);
        assert_eq!(hierarchy.min_level([]), None);
    }

    #[test]
    fn test_parse_hierarchy() {
        let hierarchy = parse_hierarchy("admin:100, lead : 60,member:5").unwrap();
        assert_eq!(hierarchy.level_of("admin"), Some(100));
        assert_eq!(hierarchy.level_of("lead"), Some(60));
        assert_eq!(hierarchy.level_of("member"), Some(5));

        assert!(parse_hierarchy("").is_none());
        assert!(parse_hierarchy("admin").is_none());
        assert!(parse_hierarchy("admin:abc").is_none());
    }
}
