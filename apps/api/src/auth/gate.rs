//! AuthGate — classifies a request path and decides whether the caller may
//! proceed or must be redirected.
//!
//! `decide` is a pure function of `(method, path, session)`. It never fails:
//! a missing session only ever produces a redirect to the login page.

use axum::http::Method;

use crate::auth::session::{Role, Session};

pub const LOGIN_PATH: &str = "/auth/login";
pub const ROLE_SELECTION_PATH: &str = "/auth/role-selection";
pub const EMPLOYEE_DASHBOARD_PATH: &str = "/dashboard/employee";
pub const EMPLOYER_DASHBOARD_PATH: &str = "/dashboard/employer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable by anyone: landing page, job listings, static assets,
    /// identity-provider callbacks, the public job API.
    Public,
    /// The login entry point.
    AuthEntry,
    RoleSelection,
    /// A dashboard path. `None` when the path names no known variant.
    Dashboard(Option<Role>),
    /// Requires a session, any role.
    ProtectedOther,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectTo(&'static str),
}

pub fn dashboard_for(role: Role) -> &'static str {
    match role {
        Role::Employee => EMPLOYEE_DASHBOARD_PATH,
        Role::Employer => EMPLOYER_DASHBOARD_PATH,
    }
}

/// Maps a request onto its route class. Matching is per path segment, so
/// `/dashboardx` is not a dashboard and trailing slashes are ignored.
pub fn classify(method: &Method, path: &str) -> RouteClass {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let is_read = *method == Method::GET || *method == Method::HEAD;

    match segments.as_slice() {
        [] => RouteClass::Public,
        ["auth", "login"] => RouteClass::AuthEntry,
        ["auth", "role-selection"] => RouteClass::RoleSelection,
        ["dashboard", "employee", ..] => RouteClass::Dashboard(Some(Role::Employee)),
        ["dashboard", "employer", ..] => RouteClass::Dashboard(Some(Role::Employer)),
        ["dashboard", ..] => RouteClass::Dashboard(None),
        ["jobs", "new", ..] => RouteClass::ProtectedOther,
        ["jobs", ..] => RouteClass::Public,
        ["api", "auth", "role" | "me"] => RouteClass::ProtectedOther,
        ["api", "auth", ..] => RouteClass::Public,
        ["api", "resumes", ..] => RouteClass::ProtectedOther,
        ["api", "jobs", _, "applications", ..] => RouteClass::ProtectedOther,
        ["api", "jobs"] | ["api", "jobs", _] if is_read => RouteClass::Public,
        ["api", "jobs", ..] => RouteClass::ProtectedOther,
        ["api", "applications", ..] => RouteClass::ProtectedOther,
        ["_next", ..] | ["static", ..] | ["favicon.ico"] | ["health"] => RouteClass::Public,
        _ => RouteClass::Other,
    }
}

/// Evaluates the gate. First matching rule wins.
pub fn decide(method: &Method, path: &str, session: Option<&Session>) -> GateDecision {
    match classify(method, path) {
        RouteClass::Public | RouteClass::Other => GateDecision::Allow,
        RouteClass::Dashboard(variant) => match session {
            None => GateDecision::RedirectTo(LOGIN_PATH),
            Some(Session { role: None, .. }) => GateDecision::RedirectTo(ROLE_SELECTION_PATH),
            Some(Session {
                role: Some(role), ..
            }) => {
                if variant == Some(*role) {
                    GateDecision::Allow
                } else {
                    GateDecision::RedirectTo(dashboard_for(*role))
                }
            }
        },
        RouteClass::AuthEntry => match session {
            None => GateDecision::Allow,
            Some(Session { role: None, .. }) => GateDecision::RedirectTo(ROLE_SELECTION_PATH),
            Some(Session {
                role: Some(role), ..
            }) => GateDecision::RedirectTo(dashboard_for(*role)),
        },
        RouteClass::RoleSelection => match session {
            None => GateDecision::RedirectTo(LOGIN_PATH),
            Some(Session {
                role: Some(role), ..
            }) => GateDecision::RedirectTo(dashboard_for(*role)),
            Some(Session { role: None, .. }) => GateDecision::Allow,
        },
        RouteClass::ProtectedOther => {
            if session.is_some() {
                GateDecision::Allow
            } else {
                GateDecision::RedirectTo(LOGIN_PATH)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const PUBLIC_PATHS: &[&str] = &[
        "/",
        "/jobs",
        "/jobs/",
        "/jobs/6f1c0e1e-0000-4000-8000-000000000000",
        "/api/auth/callback/google",
        "/api/auth/session",
        "/_next/static/chunks/main.js",
        "/static/logo.svg",
        "/favicon.ico",
        "/health",
        "/api/jobs",
        "/api/jobs/6f1c0e1e-0000-4000-8000-000000000000",
    ];

    fn session(role: Option<Role>) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    fn all_sessions() -> Vec<Option<Session>> {
        vec![
            None,
            Some(session(None)),
            Some(session(Some(Role::Employee))),
            Some(session(Some(Role::Employer))),
        ]
    }

    #[test]
    fn test_public_paths_always_allowed() {
        for path in PUBLIC_PATHS {
            assert_eq!(classify(&Method::GET, path), RouteClass::Public, "{path}");
            for s in all_sessions() {
                assert_eq!(
                    decide(&Method::GET, path, s.as_ref()),
                    GateDecision::Allow,
                    "{path} with {s:?}"
                );
            }
        }
    }

    #[test]
    fn test_null_role_on_dashboard_goes_to_role_selection() {
        let s = session(None);
        for path in ["/dashboard/employee", "/dashboard/employer", "/dashboard"] {
            assert_eq!(
                decide(&Method::GET, path, Some(&s)),
                GateDecision::RedirectTo(ROLE_SELECTION_PATH)
            );
        }
    }

    #[test]
    fn test_employee_dashboards() {
        let s = session(Some(Role::Employee));
        assert_eq!(
            decide(&Method::GET, "/dashboard/employer", Some(&s)),
            GateDecision::RedirectTo("/dashboard/employee")
        );
        assert_eq!(
            decide(&Method::GET, "/dashboard/employee", Some(&s)),
            GateDecision::Allow
        );
        assert_eq!(
            decide(&Method::GET, "/dashboard/employee/applications", Some(&s)),
            GateDecision::Allow
        );
    }

    #[test]
    fn test_employer_dashboards() {
        let s = session(Some(Role::Employer));
        assert_eq!(
            decide(&Method::GET, "/dashboard/employee", Some(&s)),
            GateDecision::RedirectTo("/dashboard/employer")
        );
        assert_eq!(
            decide(&Method::GET, "/dashboard/employer", Some(&s)),
            GateDecision::Allow
        );
    }

    #[test]
    fn test_unknown_dashboard_variant_goes_to_own_dashboard() {
        let s = session(Some(Role::Employer));
        assert_eq!(
            decide(&Method::GET, "/dashboard", Some(&s)),
            GateDecision::RedirectTo(EMPLOYER_DASHBOARD_PATH)
        );
        assert_eq!(
            decide(&Method::GET, "/dashboard/admin", Some(&s)),
            GateDecision::RedirectTo(EMPLOYER_DASHBOARD_PATH)
        );
    }

    #[test]
    fn test_dashboard_without_session_goes_to_login() {
        assert_eq!(
            decide(&Method::GET, "/dashboard/employee", None),
            GateDecision::RedirectTo(LOGIN_PATH)
        );
    }

    #[test]
    fn test_dashboard_prefix_is_segment_based() {
        assert_eq!(classify(&Method::GET, "/dashboardx"), RouteClass::Other);
        assert_eq!(decide(&Method::GET, "/dashboardx", None), GateDecision::Allow);
        assert_eq!(classify(&Method::GET, "/dashboard-employee"), RouteClass::Other);
        assert_eq!(
            decide(&Method::GET, "/dashboard-employee", None),
            GateDecision::Allow
        );
        // Same segment, so still a dashboard.
        assert_eq!(
            classify(&Method::GET, "/dashboard/employee/settings"),
            RouteClass::Dashboard(Some(Role::Employee))
        );
    }

    #[test]
    fn test_login_with_null_role_goes_to_role_selection() {
        let s = Session {
            user_id: Uuid::new_v4(),
            role: None,
        };
        assert_eq!(
            decide(&Method::GET, "/auth/login", Some(&s)),
            GateDecision::RedirectTo("/auth/role-selection")
        );
    }

    #[test]
    fn test_login_with_role_goes_to_dashboard() {
        let s = session(Some(Role::Employer));
        assert_eq!(
            decide(&Method::GET, "/auth/login", Some(&s)),
            GateDecision::RedirectTo(EMPLOYER_DASHBOARD_PATH)
        );
    }

    #[test]
    fn test_login_without_session_is_allowed() {
        assert_eq!(decide(&Method::GET, "/auth/login", None), GateDecision::Allow);
    }

    #[test]
    fn test_role_selection() {
        assert_eq!(
            decide(&Method::GET, ROLE_SELECTION_PATH, None),
            GateDecision::RedirectTo(LOGIN_PATH)
        );
        assert_eq!(
            decide(&Method::GET, ROLE_SELECTION_PATH, Some(&session(None))),
            GateDecision::Allow
        );
        assert_eq!(
            decide(
                &Method::GET,
                ROLE_SELECTION_PATH,
                Some(&session(Some(Role::Employee)))
            ),
            GateDecision::RedirectTo(EMPLOYEE_DASHBOARD_PATH)
        );
    }

    #[test]
    fn test_protected_paths_need_any_session() {
        let protected = [
            (Method::GET, "/jobs/new"),
            (Method::GET, "/api/resumes"),
            (Method::DELETE, "/api/resumes/6f1c0e1e-0000-4000-8000-000000000000"),
            (Method::POST, "/api/jobs"),
            (Method::GET, "/api/jobs/6f1c0e1e-0000-4000-8000-000000000000/applications"),
            (Method::POST, "/api/auth/role"),
            (Method::GET, "/api/auth/me"),
            (Method::PATCH, "/api/jobs/6f1c0e1e-0000-4000-8000-000000000000"),
            (Method::DELETE, "/api/jobs/6f1c0e1e-0000-4000-8000-000000000000"),
            (Method::GET, "/api/applications"),
            (Method::PATCH, "/api/applications/6f1c0e1e-0000-4000-8000-000000000000/status"),
        ];
        for (method, path) in protected {
            assert_eq!(classify(&method, path), RouteClass::ProtectedOther, "{path}");
            assert_eq!(
                decide(&method, path, None),
                GateDecision::RedirectTo(LOGIN_PATH)
            );
            assert_eq!(
                decide(&method, path, Some(&session(None))),
                GateDecision::Allow
            );
        }
    }

    #[test]
    fn test_unclassified_paths_are_allowed() {
        assert_eq!(classify(&Method::GET, "/about"), RouteClass::Other);
        assert_eq!(decide(&Method::GET, "/about", None), GateDecision::Allow);
    }

    #[test]
    fn test_decide_is_idempotent() {
        let paths = [
            "/",
            "/auth/login",
            "/auth/role-selection",
            "/dashboard/employee",
            "/dashboard/employer",
            "/jobs/new",
            "/elsewhere",
        ];
        for path in paths {
            for s in all_sessions() {
                let first = decide(&Method::GET, path, s.as_ref());
                let second = decide(&Method::GET, path, s.as_ref());
                assert_eq!(first, second);
            }
        }
    }
}
