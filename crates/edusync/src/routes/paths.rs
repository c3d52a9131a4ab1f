//! Path conventions and static route classification.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Fixed navigation paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePaths {
    /// Public login page.
    pub login_path: String,
    /// Shared home, where students land.
    pub student_home: String,
    /// Administrator home.
    pub admin_home: String,
    /// First segment of every administrator-only path.
    pub admin_prefix: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            student_home: "/dashboard".to_string(),
            admin_home: "/admin/dashboard".to_string(),
            admin_prefix: "/admin".to_string(),
        }
    }
}

/// Static classification of a navigable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteClass {
    /// Reachable without a session.
    Public,
    /// Any authenticated role.
    ProtectedShared,
    /// Administrator subtree.
    ProtectedRolePrefixed,
}

impl RoutePaths {
    /// Classify a path. Only the admin prefix and the login path matter;
    /// unknown paths are classified like known ones.
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize_path(path);
        if path == normalize_path(&self.login_path) {
            RouteClass::Public
        } else if self.is_admin_path(&path) {
            RouteClass::ProtectedRolePrefixed
        } else {
            RouteClass::ProtectedShared
        }
    }

    /// Whether `path` lies in the administrator subtree: any normalized path
    /// starting with the admin prefix, so `/administrator` counts too.
    pub fn is_admin_path(&self, path: &str) -> bool {
        normalize_path(path).starts_with(&normalize_path(&self.admin_prefix))
    }

    /// Landing page for a role.
    pub fn home_for(&self, role: Role) -> &str {
        match role {
            Role::Student => &self.student_home,
            Role::Admin => &self.admin_home,
        }
    }
}

/// Canonical form of a location: query and fragment dropped, leading slash
/// enforced, duplicate and trailing slashes removed.
pub fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Segment-aware prefix test: `/admin` covers `/admin` and `/admin/x`, not
/// `/administrator`. Both arguments must already be normalized.
pub fn has_path_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
