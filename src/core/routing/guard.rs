//! Route authorization guard
//!
//! Pure functions of (role, path) and the static permission table. Denials
//! are values, never errors.

use serde::{Deserialize, Serialize};

use super::pattern::normalize_path;
use super::permissions::{PUBLIC_ONLY_ROUTES, PUBLIC_ROUTES, permissions_for};
use crate::core::session::{Role, SessionStatus};

/// Outcome of a route check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// What the router should do with a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Render the requested page
    Allow,
    /// Session state not settled; show a loading indicator
    Wait,
    /// Anonymous visitor on a protected page
    RedirectToLogin { intended: String },
    /// Signed in but not allowed here
    Redirect(String),
}

pub fn default_route_for(role: Role) -> &'static str {
    permissions_for(role).default_route
}

/// Whether `role` may open `path`. The role's default route is always allowed;
/// otherwise the first matching allow-list entry decides.
pub fn decide(role: Role, path: &str) -> Decision {
    let path = normalize_path(path);
    let perms = permissions_for(role);

    if path == perms.default_route || perms.allow.iter().any(|p| p.matches(&path)) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

pub fn is_public(path: &str) -> bool {
    let path = normalize_path(path);
    PUBLIC_ROUTES.iter().any(|p| p.matches(&path))
}

/// Guard for sign-in style pages: allowed without a session; with one, the
/// visitor goes to their role's landing page instead of to login.
pub fn public_only(role: Option<Role>, path: &str) -> NavigationOutcome {
    let path = normalize_path(path);
    let public_only = PUBLIC_ONLY_ROUTES.iter().any(|p| p.matches(&path));

    match role {
        Some(role) if public_only => NavigationOutcome::Redirect(default_route_for(role).to_string()),
        _ => NavigationOutcome::Allow,
    }
}

/// Guard for every navigation given the current session state
pub fn guard_navigation(
    status: SessionStatus,
    role: Option<Role>,
    path: &str,
    login_route: &str,
) -> NavigationOutcome {
    if !status.is_settled() {
        return NavigationOutcome::Wait;
    }

    let path = normalize_path(path);
    match role.filter(|_| status.is_authenticated()) {
        None if is_public(&path) => NavigationOutcome::Allow,
        None if path == normalize_path(login_route) => NavigationOutcome::Allow,
        None => NavigationOutcome::RedirectToLogin { intended: path },
        Some(role) => match public_only(Some(role), &path) {
            NavigationOutcome::Allow if decide(role, &path).is_allowed() || is_public(&path) => {
                NavigationOutcome::Allow
            }
            NavigationOutcome::Allow => {
                NavigationOutcome::Redirect(default_route_for(role).to_string())
            }
            redirect => redirect,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // decide
    // ========================================================================

    #[test]
    fn test_default_route_always_allowed() {
        for role in Role::ALL {
            assert_eq!(decide(role, default_route_for(role)), Decision::Allow);
        }
    }

    #[test]
    fn test_roles_are_confined_to_their_area() {
        assert_eq!(decide(Role::Client, "/admin/dashboard"), Decision::Deny);
        assert_eq!(decide(Role::Doctor, "/client/appointments"), Decision::Deny);
        assert_eq!(decide(Role::Secretary, "/doctor/schedule"), Decision::Deny);
        assert_eq!(decide(Role::Admin, "/superadmin/dashboard"), Decision::Deny);
    }

    #[test]
    fn test_allow_list_forms() {
        assert_eq!(decide(Role::Client, "/client/appointments/new"), Decision::Allow);
        assert_eq!(decide(Role::Client, "/client/doctors/31"), Decision::Allow);
        assert_eq!(decide(Role::Client, "/client/doctors/31/reviews"), Decision::Deny);
        assert_eq!(decide(Role::Secretary, "/secretary/calendar"), Decision::Allow);
        assert_eq!(decide(Role::SuperAdmin, "/admin/users/4"), Decision::Allow);
    }

    #[test]
    fn test_decide_normalizes_path() {
        assert_eq!(decide(Role::Doctor, "/doctor/dashboard/?tab=today"), Decision::Allow);
    }

    #[test]
    fn test_decide_is_pure() {
        let paths = ["/", "/login", "/profile", "/admin/x", "/client/doctors/1", "/nope"];
        for role in Role::ALL {
            for path in paths {
                assert_eq!(decide(role, path), decide(role, path));
            }
        }
    }

    // ========================================================================
    // public_only / guard_navigation
    // ========================================================================

    #[test]
    fn test_public_only_without_session() {
        assert_eq!(public_only(None, "/login"), NavigationOutcome::Allow);
    }

    #[test]
    fn test_public_only_with_session_goes_to_default_route() {
        assert_eq!(
            public_only(Some(Role::Doctor), "/login"),
            NavigationOutcome::Redirect("/doctor/dashboard".to_string())
        );
        assert_eq!(public_only(Some(Role::Doctor), "/"), NavigationOutcome::Allow);
    }

    #[test]
    fn test_guard_waits_while_initializing() {
        assert_eq!(
            guard_navigation(SessionStatus::Initializing, None, "/doctor/dashboard", "/login"),
            NavigationOutcome::Wait
        );
    }

    #[test]
    fn test_guard_anonymous_on_protected_page() {
        assert_eq!(
            guard_navigation(SessionStatus::Anonymous, None, "/secretary/calendar", "/login"),
            NavigationOutcome::RedirectToLogin {
                intended: "/secretary/calendar".to_string()
            }
        );
        assert_eq!(
            guard_navigation(SessionStatus::Error, None, "/login", "/login"),
            NavigationOutcome::Allow
        );
    }

    #[test]
    fn test_guard_custom_login_route_is_reachable() {
        assert_eq!(
            guard_navigation(SessionStatus::Anonymous, None, "/signin", "/signin"),
            NavigationOutcome::Allow
        );
    }

    #[test]
    fn test_guard_signed_in() {
        assert_eq!(
            guard_navigation(
                SessionStatus::Degraded,
                Some(Role::Doctor),
                "/client/appointments",
                "/login"
            ),
            NavigationOutcome::Redirect("/doctor/dashboard".to_string())
        );
        assert_eq!(
            guard_navigation(SessionStatus::Authenticated, Some(Role::Doctor), "/", "/login"),
            NavigationOutcome::Allow
        );
        assert_eq!(
            guard_navigation(
                SessionStatus::Authenticated,
                Some(Role::Doctor),
                "/doctor/schedule",
                "/login"
            ),
            NavigationOutcome::Allow
        );
    }

    #[test]
    fn test_guard_ignores_role_when_not_authenticated() {
        assert_eq!(
            guard_navigation(SessionStatus::Anonymous, Some(Role::Admin), "/admin/dashboard", "/login"),
            NavigationOutcome::RedirectToLogin {
                intended: "/admin/dashboard".to_string()
            }
        );
    }
}
