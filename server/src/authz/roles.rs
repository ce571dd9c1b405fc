//! Route role requirement normalization.
//!
//! Callers declare route allow-lists in several loosely-typed shapes: a single
//! comma-separated string, a list whose first element is itself a
//! comma-separated string, or a flat list of role names. All shapes funnel
//! through [`normalize_roles`] at the call boundary so the gate only ever sees
//! one canonical form: an ordered list of trimmed, non-empty role names.

/// Normalizes any accepted allow-list shape into the canonical role list.
pub fn normalize_roles<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .flat_map(|item| {
            item.as_ref()
                .split(',')
                .map(|role| role.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|role| !role.is_empty())
        .collect()
}
