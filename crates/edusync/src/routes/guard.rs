//! Route authorization guard.

use serde::Serialize;

use crate::auth::Role;
use crate::session::SessionState;

use super::paths::{RouteClass, RoutePaths, normalize_path};

/// Why a navigation was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// No session.
    Unauthenticated,
    /// Student asked for an administrator page.
    AdminOnly,
    /// Administrator asked for a page outside the administrator area.
    OutsideAdminArea,
    /// Index path forwarding to its default child.
    Index,
}

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Redirect { to: String, reason: RedirectReason },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Decides allow / redirect for every navigation.
///
/// A pure function of `(session, path)`. Rules, first match wins:
/// 1. public path: allow
/// 2. anonymous: redirect to login
/// 3. student inside the admin subtree: redirect to the student home
/// 4. admin outside the admin subtree: redirect to the admin home
/// 5. allow
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    paths: RoutePaths,
}

impl RouteGuard {
    pub fn new(paths: RoutePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &RoutePaths {
        &self.paths
    }

    pub fn evaluate(&self, session: &SessionState, path: &str) -> GuardDecision {
        let path = normalize_path(path);
        let class = self.paths.classify(&path);

        if class == RouteClass::Public {
            return GuardDecision::Allow;
        }

        let Some(role) = session.role() else {
            return self.redirect(&self.paths.login_path, RedirectReason::Unauthenticated);
        };

        match (role, class) {
            (Role::Student, RouteClass::ProtectedRolePrefixed) => {
                self.redirect(&self.paths.student_home, RedirectReason::AdminOnly)
            }
            (Role::Admin, RouteClass::ProtectedShared) => {
                self.redirect(&self.paths.admin_home, RedirectReason::OutsideAdminArea)
            }
            _ => GuardDecision::Allow,
        }
    }

    fn redirect(&self, to: &str, reason: RedirectReason) -> GuardDecision {
        GuardDecision::Redirect {
            to: normalize_path(to),
            reason,
        }
    }
}
