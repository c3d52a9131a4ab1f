//! Route authorization.
//!
//! The guard decides allow/redirect for every navigation; the route table
//! resolves what survives to a view; the navigator ties both to the live session.

mod guard;
mod navigator;
mod paths;
mod table;

pub use guard::{GuardDecision, RedirectReason, RouteGuard};
pub use navigator::{Hop, Navigation, Navigator, Outcome};
pub use paths::{RouteClass, RoutePaths, has_path_prefix, normalize_path};
pub use table::{Resolution, RouteTable, View};
