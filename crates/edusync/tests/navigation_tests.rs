//! End-to-end authorization scenarios: decode, session, guard, menu.

use std::sync::Arc;

use edusync::auth::{Role, decode_credential};
use edusync::nav::NavComposer;
use edusync::routes::{GuardDecision, Navigator, Outcome, RedirectReason, RoutePaths, View};
use edusync::session::{Identity, SessionManager};
use serde_json::json;

mod common;
use common::{MS_ROLE_CLAIM, memory_sessions, mint};

fn login_with(sessions: &SessionManager, token: String) -> Identity {
    let claims = decode_credential(&token).unwrap();
    let identity = Identity::new("Test User", claims.role(), token);
    sessions.login(identity.clone()).unwrap();
    identity
}

fn navigator(sessions: &Arc<SessionManager>) -> Navigator {
    Navigator::new(sessions.clone(), RoutePaths::default(), true)
}

#[test]
fn test_admin_on_shared_path_goes_to_admin_dashboard() {
    let token = mint(json!({ "role": "Admin" }));
    assert_eq!(decode_credential(&token).unwrap().role(), Role::Admin);

    let (sessions, _store) = memory_sessions();
    login_with(&sessions, token);

    let navigation = navigator(&sessions).navigate("/dashboard");

    assert_eq!(navigation.location, "/admin/dashboard");
    assert_eq!(navigation.hops.len(), 1);
    assert_eq!(navigation.hops[0].reason, RedirectReason::OutsideAdminArea);
    assert_eq!(
        navigation.outcome,
        Outcome::Render {
            view: View::AdminDashboard
        }
    );
}

#[test]
fn test_student_on_admin_path_goes_to_dashboard() {
    let (sessions, _store) = memory_sessions();
    login_with(&sessions, mint(json!({ MS_ROLE_CLAIM: "student" })));

    let navigation = navigator(&sessions).navigate("/admin/students");

    assert_eq!(navigation.location, "/dashboard");
    assert_eq!(navigation.hops[0].reason, RedirectReason::AdminOnly);
    assert_eq!(
        navigation.outcome,
        Outcome::Render {
            view: View::StudentDashboard
        }
    );
}

#[test]
fn test_anonymous_on_admin_path_goes_to_login() {
    let (sessions, _store) = memory_sessions();

    let navigation = navigator(&sessions).navigate("/admin/dashboard");

    assert_eq!(navigation.location, "/login");
    assert_eq!(navigation.hops[0].reason, RedirectReason::Unauthenticated);
    assert_eq!(navigation.outcome, Outcome::Render { view: View::Login });
}

#[test]
fn test_student_menu_marks_dashboard_active_only_on_dashboard() {
    let (sessions, _store) = memory_sessions();
    login_with(&sessions, mint(json!({ "role": "student" })));
    let state = sessions.state();

    let mut composer = NavComposer::new();
    composer.set_location(Role::Student, "/dashboard");
    let items = composer.compose_for(&state);

    assert_eq!(items.len(), 10);
    assert!(items.iter().all(|item| item.children.is_empty()));
    let active: Vec<&str> = items
        .iter()
        .filter(|item| item.active)
        .map(|item| item.label.as_str())
        .collect();
    assert_eq!(active, vec!["Dashboard"]);

    composer.set_location(Role::Student, "/courses");
    let items = composer.compose_for(&state);
    let dashboard = items.iter().find(|item| item.label == "Dashboard").unwrap();
    assert!(!dashboard.active);
}

#[test]
fn test_logout_revokes_protected_access() {
    let (sessions, _store) = memory_sessions();
    login_with(&sessions, mint(json!({ "role": "student" })));
    let mut navigator = navigator(&sessions);

    assert!(!navigator.navigate("/courses").was_redirected());

    sessions.logout().unwrap();

    let navigation = navigator.navigate("/courses");
    assert_eq!(navigation.location, "/login");
    assert!(NavComposer::new().compose_for(&sessions.state()).is_empty());
}

#[test]
fn test_unrecognized_role_never_creates_a_session() {
    let token = mint(json!({ "role": "registrar" }));
    assert!(decode_credential(&token).is_err());

    let (sessions, _store) = memory_sessions();
    let navigation = navigator(&sessions).navigate("/dashboard");
    assert_eq!(navigation.location, "/login");
}

#[test]
fn test_guard_is_pure_over_session_snapshot() {
    let (sessions, _store) = memory_sessions();
    login_with(&sessions, mint(json!({ "role": "admin" })));
    let navigator = navigator(&sessions);
    let state = sessions.state();

    for path in ["/admin", "/admin/users/42", "/admin/settings?tab=2"] {
        assert_eq!(
            navigator.guard().evaluate(&state, path),
            GuardDecision::Allow,
            "{path}"
        );
    }
    assert!(navigator.guard().evaluate(&state, "/administrator").is_allowed());
}

#[test]
fn test_student_on_admin_lookalike_path_goes_to_dashboard() {
    let (sessions, _store) = memory_sessions();
    login_with(&sessions, mint(json!({ "role": "student" })));

    let navigation = navigator(&sessions).navigate("/adminpanel");

    assert_eq!(navigation.location, "/dashboard");
    assert_eq!(navigation.hops[0].reason, RedirectReason::AdminOnly);
    assert_eq!(
        navigation.outcome,
        Outcome::Render {
            view: View::StudentDashboard
        }
    );
}

#[test]
fn test_unknown_path_for_student_is_not_found() {
    let (sessions, _store) = memory_sessions();
    login_with(&sessions, mint(json!({ "role": "student" })));

    let navigation = navigator(&sessions).navigate("/quizzes");

    assert_eq!(navigation.location, "/quizzes");
    assert_eq!(navigation.outcome, Outcome::NotFound);
}
