//! Known views and index forwarding.

use serde::Serialize;

use super::paths::{RoutePaths, normalize_path};

/// A renderable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    StudentDashboard,
    Profile,
    Courses,
    Assignments,
    Schedule,
    AcademicRecords,
    Payment,
    Community,
    Notifications,
    Settings,
    AdminDashboard,
    AdminStudents,
    AdminCourses,
    AdminCourseForm,
    AdminAssignments,
    AdminAssignmentForm,
    AdminQuizzes,
    AdminQuizForm,
    AdminPayment,
    AdminAcademicRecords,
    AdminSettings,
    AdminCommunity,
    AdminProfile,
    AdminNotifications,
}

impl View {
    /// Page title.
    pub fn title(&self) -> &'static str {
        match self {
            View::Login => "Login",
            View::StudentDashboard | View::AdminDashboard => "Dashboard",
            View::Profile | View::AdminProfile => "Profile",
            View::Courses | View::AdminCourses => "Courses",
            View::AdminCourseForm => "New Course",
            View::Assignments | View::AdminAssignments => "Assignments",
            View::AdminAssignmentForm => "New Assignment",
            View::Schedule => "Schedule",
            View::AcademicRecords | View::AdminAcademicRecords => "Academic Records",
            View::Payment | View::AdminPayment => "Payment",
            View::Community | View::AdminCommunity => "Community",
            View::Notifications | View::AdminNotifications => "Notifications",
            View::Settings | View::AdminSettings => "Settings",
            View::AdminStudents => "Students",
            View::AdminQuizzes => "Quizzes",
            View::AdminQuizForm => "New Quiz",
        }
    }
}

const SHARED_ROUTES: &[(&str, View)] = &[
    ("dashboard", View::StudentDashboard),
    ("profile", View::Profile),
    ("courses", View::Courses),
    ("assignments", View::Assignments),
    ("schedule", View::Schedule),
    ("academicRecords", View::AcademicRecords),
    ("payment", View::Payment),
    ("community", View::Community),
    ("notifications", View::Notifications),
    ("settings", View::Settings),
];

const ADMIN_ROUTES: &[(&str, View)] = &[
    ("dashboard", View::AdminDashboard),
    ("students", View::AdminStudents),
    ("courses", View::AdminCourses),
    ("courses/new", View::AdminCourseForm),
    ("assignments", View::AdminAssignments),
    ("assignments/new", View::AdminAssignmentForm),
    ("quizzes", View::AdminQuizzes),
    ("quizzes/new", View::AdminQuizForm),
    ("payment", View::AdminPayment),
    ("academicRecords", View::AdminAcademicRecords),
    ("settings", View::AdminSettings),
    ("community", View::AdminCommunity),
    ("profile", View::AdminProfile),
    ("notifications", View::AdminNotifications),
];

/// What a guarded path resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    View { view: View },
    /// Index path forwarding to its default child.
    Forward { to: String },
    NotFound,
}

/// Static route table, built against the configured path conventions.
#[derive(Debug, Clone)]
pub struct RouteTable {
    login: String,
    root_index: String,
    admin_root: String,
    admin_index: String,
    entries: Vec<(String, View)>,
}

impl RouteTable {
    pub fn new(paths: &RoutePaths) -> Self {
        let admin_root = normalize_path(&paths.admin_prefix);

        let mut entries: Vec<(String, View)> = SHARED_ROUTES
            .iter()
            .map(|(path, view)| (normalize_path(path), *view))
            .collect();
        entries.extend(
            ADMIN_ROUTES
                .iter()
                .map(|(path, view)| (normalize_path(&format!("{admin_root}/{path}")), *view)),
        );

        Self {
            login: normalize_path(&paths.login_path),
            root_index: normalize_path(&paths.student_home),
            admin_index: normalize_path(&paths.admin_home),
            admin_root,
            entries,
        }
    }

    /// Resolve an already-authorized path.
    pub fn resolve(&self, path: &str) -> Resolution {
        let path = normalize_path(path);

        if path == self.login {
            return Resolution::View { view: View::Login };
        }
        if path == "/" {
            return Resolution::Forward {
                to: self.root_index.clone(),
            };
        }
        if path == self.admin_root {
            return Resolution::Forward {
                to: self.admin_index.clone(),
            };
        }

        self.entries
            .iter()
            .find(|(route, _)| *route == path)
            .map(|(_, view)| Resolution::View { view: *view })
            .unwrap_or(Resolution::NotFound)
    }

    /// All concrete paths, in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(&RoutePaths::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_views() {
        let table = RouteTable::default();
        assert_eq!(
            table.resolve("/dashboard"),
            Resolution::View {
                view: View::StudentDashboard
            }
        );
        assert_eq!(
            table.resolve("/admin/quizzes/new"),
            Resolution::View {
                view: View::AdminQuizForm
            }
        );
        assert_eq!(
            table.resolve("/academicRecords/"),
            Resolution::View {
                view: View::AcademicRecords
            }
        );
        assert_eq!(table.resolve("/login"), Resolution::View { view: View::Login });
    }

    #[test]
    fn test_index_forwarding() {
        let table = RouteTable::default();
        assert_eq!(
            table.resolve("/"),
            Resolution::Forward {
                to: "/dashboard".to_string()
            }
        );
        assert_eq!(
            table.resolve("/admin/"),
            Resolution::Forward {
                to: "/admin/dashboard".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_paths() {
        let table = RouteTable::default();
        // The student menu links /quizzes but no student quiz page exists.
        assert_eq!(table.resolve("/quizzes"), Resolution::NotFound);
        assert_eq!(table.resolve("/admin/schedule"), Resolution::NotFound);
    }

    #[test]
    fn test_table_size() {
        let table = RouteTable::default();
        assert_eq!(table.paths().count(), SHARED_ROUTES.len() + ADMIN_ROUTES.len());
        assert!(table.paths().all(|p| p.starts_with('/')));
    }

    #[test]
    fn test_titles() {
        assert_eq!(View::AdminAcademicRecords.title(), "Academic Records");
        assert_eq!(View::StudentDashboard.title(), "Dashboard");
    }
}
