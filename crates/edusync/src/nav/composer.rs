//! Role-scoped menu composition.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::auth::Role;
use crate::routes::{has_path_prefix, normalize_path};
use crate::session::SessionState;

use super::menu::{ADMIN_MENU, Icon, MenuEntry, STUDENT_MENU};

/// A menu entry as rendered for the current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub icon: Icon,
    pub active: bool,
    /// Open/closed flag; only groups carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// Projects the session's role and the current location onto a menu table.
///
/// The only state is the set of open groups. Each location change adds the
/// groups holding the active entry; nothing is ever removed except by
/// [`toggle`](Self::toggle).
#[derive(Debug, Clone)]
pub struct NavComposer {
    student: &'static [MenuEntry],
    admin: &'static [MenuEntry],
    location: String,
    open_groups: BTreeSet<String>,
}

impl Default for NavComposer {
    fn default() -> Self {
        Self::with_tables(STUDENT_MENU, ADMIN_MENU)
    }
}

impl NavComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(student: &'static [MenuEntry], admin: &'static [MenuEntry]) -> Self {
        Self {
            student,
            admin,
            location: "/".to_string(),
            open_groups: BTreeSet::new(),
        }
    }

    pub fn table_for(&self, role: Role) -> &'static [MenuEntry] {
        match role {
            Role::Student => self.student,
            Role::Admin => self.admin,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Record a location change and auto-expand groups with an active child.
    pub fn set_location(&mut self, role: Role, path: &str) {
        self.location = normalize_path(path);
        let active: Vec<String> = self
            .table_for(role)
            .iter()
            .filter(|entry| entry.is_group() && self.group_is_active(entry))
            .map(|entry| entry.label.to_string())
            .collect();
        self.open_groups.extend(active);
    }

    /// Flip a group open/closed. Returns the new state.
    pub fn toggle(&mut self, label: &str) -> bool {
        if self.open_groups.remove(label) {
            false
        } else {
            self.open_groups.insert(label.to_string());
            true
        }
    }

    pub fn is_open(&self, label: &str) -> bool {
        self.open_groups.contains(label)
    }

    /// Menu for `role` at the current location.
    pub fn compose(&self, role: Role) -> Vec<MenuItem> {
        self.table_for(role)
            .iter()
            .map(|entry| self.item(entry))
            .collect()
    }

    /// Menu for the session; an anonymous session has no menu.
    pub fn compose_for(&self, session: &SessionState) -> Vec<MenuItem> {
        session
            .role()
            .map(|role| self.compose(role))
            .unwrap_or_default()
    }

    fn item(&self, entry: &MenuEntry) -> MenuItem {
        if entry.is_group() {
            MenuItem {
                label: entry.label.to_string(),
                path: entry.path.map(str::to_string),
                icon: entry.icon,
                active: self.group_is_active(entry),
                expanded: Some(self.is_open(entry.label)),
                children: entry.children.iter().map(|child| self.item(child)).collect(),
            }
        } else {
            MenuItem {
                label: entry.label.to_string(),
                path: entry.path.map(str::to_string),
                icon: entry.icon,
                active: entry
                    .path
                    .is_some_and(|path| normalize_path(path) == self.location),
                expanded: None,
                children: Vec::new(),
            }
        }
    }

    fn group_is_active(&self, group: &MenuEntry) -> bool {
        group.children.iter().any(|child| match child.path {
            Some(path) => has_path_prefix(&self.location, &normalize_path(path)),
            None => self.group_is_active(child),
        })
    }
}
