//! Navigation: guard, route table and the pending destination together.

use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::session::SessionManager;

use super::guard::{GuardDecision, RedirectReason, RouteGuard};
use super::paths::{RoutePaths, normalize_path};
use super::table::{Resolution, RouteTable, View};

/// Upper bound on redirects followed for one navigation.
const MAX_REDIRECTS: usize = 8;

/// One redirect hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub reason: RedirectReason,
}

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Render { view: View },
    NotFound,
    /// Redirects did not settle; only reachable with inconsistent path config.
    RedirectLoop,
}

/// Result of [`Navigator::navigate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Path as requested (normalized).
    pub requested: String,
    /// Final location after all redirects.
    pub location: String,
    /// Redirects taken, in order.
    pub hops: Vec<Hop>,
    pub outcome: Outcome,
}

impl Navigation {
    pub fn was_redirected(&self) -> bool {
        !self.hops.is_empty()
    }
}

/// Drives navigation for one client.
///
/// Every navigation re-reads the session, runs the guard, and resolves the
/// surviving path against the route table. With `remember_destination` on, a
/// path that bounced to the login page is kept and offered once after login.
/// A later bounce replaces it.
#[derive(Debug)]
pub struct Navigator {
    sessions: Arc<SessionManager>,
    guard: RouteGuard,
    table: RouteTable,
    remember_destination: bool,
    pending: Option<String>,
    location: Option<String>,
}

impl Navigator {
    pub fn new(sessions: Arc<SessionManager>, paths: RoutePaths, remember_destination: bool) -> Self {
        let table = RouteTable::new(&paths);
        Self {
            sessions,
            guard: RouteGuard::new(paths),
            table,
            remember_destination,
            pending: None,
            location: None,
        }
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// Current location, once a navigation has happened.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Destination waiting for the next login, if any.
    pub fn pending_destination(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Navigate to `path`, following redirects until a page renders.
    pub fn navigate(&mut self, path: &str) -> Navigation {
        let requested = normalize_path(path);
        let mut current = requested.clone();
        let mut hops = Vec::new();

        let outcome = loop {
            if hops.len() >= MAX_REDIRECTS {
                break Outcome::RedirectLoop;
            }

            let state = self.sessions.state();
            let (to, reason) = match self.guard.evaluate(&state, &current) {
                GuardDecision::Redirect { to, reason } => (to, reason),
                GuardDecision::Allow => match self.table.resolve(&current) {
                    Resolution::View { view } => break Outcome::Render { view },
                    Resolution::NotFound => break Outcome::NotFound,
                    Resolution::Forward { to } => (to, RedirectReason::Index),
                },
            };

            if reason == RedirectReason::Unauthenticated && self.remember_destination {
                debug!("remembering {} until login", current);
                self.pending = Some(current.clone());
            }

            hops.push(Hop {
                from: std::mem::replace(&mut current, to.clone()),
                to,
                reason,
            });
        };

        debug!("navigated {} -> {} ({:?})", requested, current, outcome);
        self.location = Some(current.clone());
        Navigation {
            requested,
            location: current,
            hops,
            outcome,
        }
    }

    /// Where to go right after a successful login.
    ///
    /// Consumes the pending destination. It is used only if the guard lets the
    /// new session through; otherwise the role's home is returned.
    pub fn landing_after_login(&mut self) -> String {
        let state = self.sessions.state();
        let home = match state.role() {
            Some(role) => normalize_path(self.guard.paths().home_for(role)),
            None => normalize_path(&self.guard.paths().login_path),
        };

        match self.pending.take() {
            Some(pending) if state.is_authenticated() => {
                if self.guard.evaluate(&state, &pending).is_allowed() {
                    pending
                } else {
                    home
                }
            }
            _ => home,
        }
    }

    /// Forget the pending destination.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }
}
