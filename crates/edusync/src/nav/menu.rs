//! Static menu tables.

use serde::Serialize;

use crate::auth::Role;

/// Icon reference, named after the icon set the client renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    User,
    Users,
    LayoutDashboard,
    BookOpen,
    CalendarDays,
    ClipboardList,
    FileQuestion,
    CreditCard,
    #[serde(rename = "bar-chart-2")]
    BarChart2,
    Settings,
}

/// A menu entry. Entries with children are groups and have no path of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub path: Option<&'static str>,
    pub icon: Icon,
    pub children: &'static [MenuEntry],
}

impl MenuEntry {
    pub const fn link(label: &'static str, path: &'static str, icon: Icon) -> Self {
        Self {
            label,
            path: Some(path),
            icon,
            children: &[],
        }
    }

    pub const fn group(label: &'static str, icon: Icon, children: &'static [MenuEntry]) -> Self {
        Self {
            label,
            path: None,
            icon,
            children,
        }
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

pub const STUDENT_MENU: &[MenuEntry] = &[
    MenuEntry::link("Profile", "/profile", Icon::User),
    MenuEntry::link("Dashboard", "/dashboard", Icon::LayoutDashboard),
    MenuEntry::link("Courses", "/courses", Icon::BookOpen),
    MenuEntry::link("Schedule", "/schedule", Icon::CalendarDays),
    MenuEntry::link("Quizzes", "/quizzes", Icon::FileQuestion),
    MenuEntry::link("Assignments", "/assignments", Icon::ClipboardList),
    MenuEntry::link("Academic Records", "/academicRecords", Icon::BarChart2),
    MenuEntry::link("Payment", "/payment", Icon::CreditCard),
    MenuEntry::link("Community", "/community", Icon::Users),
    MenuEntry::link("Settings", "/settings", Icon::Settings),
];

pub const ADMIN_MENU: &[MenuEntry] = &[
    MenuEntry::link("Profile", "/admin/profile", Icon::User),
    MenuEntry::link("Dashboard", "/admin/dashboard", Icon::LayoutDashboard),
    MenuEntry::link("Students", "/admin/students", Icon::Users),
    MenuEntry::link("Courses", "/admin/courses", Icon::BookOpen),
    MenuEntry::link("Assignments", "/admin/assignments", Icon::ClipboardList),
    MenuEntry::link("Quizzes", "/admin/quizzes", Icon::FileQuestion),
    MenuEntry::link("Payment", "/admin/payment", Icon::CreditCard),
    MenuEntry::link("Academic Records", "/admin/academicRecords", Icon::BarChart2),
    MenuEntry::link("Community", "/admin/community", Icon::Users),
    MenuEntry::link("Settings", "/admin/settings", Icon::Settings),
];

/// The menu table for a role. Exactly one of two tables, never merged.
pub fn menu_for(role: Role) -> &'static [MenuEntry] {
    match role {
        Role::Student => STUDENT_MENU,
        Role::Admin => ADMIN_MENU,
    }
}
