//! Role redirect controller
//!
//! Turns guard decisions into at most one navigation target per state or
//! path change. [`compute_redirect`] is the pure core; [`RedirectController`]
//! adds the destination captured when an anonymous visitor was bounced to
//! the login page.

use super::guard::{NavigationOutcome, decide, default_route_for, guard_navigation, is_public};
use super::pattern::normalize_path;
use crate::core::config::DEFAULT_LOGIN_ROUTE;
use crate::core::session::{Role, SessionStatus};

/// Where a signed-in actor should be sent, if anywhere.
///
/// 1. An allowed `intended` destination wins.
/// 2. `/` goes to the role's default route.
/// 3. A denied `current_path` goes to the role's default route.
/// 4. Otherwise stay.
///
/// A target equal to the current path is reported as `None`.
pub fn compute_redirect(role: Role, current_path: &str, intended: Option<&str>) -> Option<String> {
    let current = normalize_path(current_path);

    let target = match intended.map(normalize_path) {
        Some(intended) if decide(role, &intended).is_allowed() => Some(intended),
        _ if current == "/" => Some(default_route_for(role).to_string()),
        _ if !decide(role, &current).is_allowed() => Some(default_route_for(role).to_string()),
        _ => None,
    };

    target.filter(|t| *t != current)
}

/// Redirect state for one browsing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectController {
    intended: Option<String>,
    login_route: String,
    last_path: Option<String>,
}

impl Default for RedirectController {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_ROUTE)
    }
}

impl RedirectController {
    pub fn new(login_route: impl Into<String>) -> Self {
        Self {
            intended: None,
            login_route: normalize_path(&login_route.into()),
            last_path: None,
        }
    }

    /// Destination captured from the last bounced navigation
    pub fn intended(&self) -> Option<&str> {
        self.intended.as_deref()
    }

    pub fn capture(&mut self, path: &str) {
        self.intended = Some(normalize_path(path));
    }

    /// Whether a degraded session should be verified again. Only a move to a
    /// new protected path counts; state updates on the same page do not.
    pub fn reverify_on(&mut self, status: SessionStatus, current_path: &str) -> bool {
        let path = normalize_path(current_path);
        let moved = self.last_path.as_deref() != Some(path.as_str());
        let reverify = moved && status == SessionStatus::Degraded && !is_public(&path);
        self.last_path = Some(path);
        reverify
    }

    /// Decide the navigation for the current session state and path.
    /// Consumes the captured destination once a signed-in actor is routed,
    /// whether or not the role was allowed to open it.
    pub fn on_change(
        &mut self,
        status: SessionStatus,
        role: Option<Role>,
        current_path: &str,
    ) -> Option<String> {
        match guard_navigation(status, role, current_path, &self.login_route) {
            NavigationOutcome::Wait => None,
            NavigationOutcome::RedirectToLogin { intended } => {
                tracing::debug!(%intended, "anonymous visitor on protected route");
                self.capture(&intended);
                Some(self.login_route.clone()).filter(|login| *login != normalize_path(current_path))
            }
            NavigationOutcome::Allow | NavigationOutcome::Redirect(_) => {
                let role = role.filter(|_| status.is_authenticated())?;
                let intended = self.intended.take();
                compute_redirect(role, current_path, intended.as_deref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // compute_redirect
    // ========================================================================

    #[test]
    fn test_intended_destination_wins_when_allowed() {
        assert_eq!(
            compute_redirect(Role::Secretary, "/login", Some("/secretary/calendar")),
            Some("/secretary/calendar".to_string())
        );
    }

    #[test]
    fn test_denied_intended_destination_is_ignored() {
        assert_eq!(
            compute_redirect(Role::Client, "/login", Some("/admin/dashboard")),
            Some("/client/dashboard".to_string())
        );
    }

    #[test]
    fn test_root_goes_to_default_route() {
        assert_eq!(
            compute_redirect(Role::Admin, "/", None),
            Some("/admin/dashboard".to_string())
        );
    }

    #[test]
    fn test_denied_path_goes_to_default_route() {
        assert_eq!(
            compute_redirect(Role::Doctor, "/client/appointments", None),
            Some("/doctor/dashboard".to_string())
        );
    }

    #[test]
    fn test_allowed_path_stays() {
        assert_eq!(compute_redirect(Role::Doctor, "/doctor/schedule", None), None);
    }

    #[test]
    fn test_no_redirect_to_current_path() {
        assert_eq!(
            compute_redirect(Role::Doctor, "/doctor/schedule", Some("/doctor/schedule/")),
            None
        );
    }

    // ========================================================================
    // RedirectController
    // ========================================================================

    #[test]
    fn test_controller_waits_while_initializing() {
        let mut controller = RedirectController::new("/login");
        assert_eq!(
            controller.on_change(SessionStatus::Initializing, None, "/doctor/dashboard"),
            None
        );
        assert_eq!(controller.intended(), None);
    }

    #[test]
    fn test_controller_captures_and_replays_destination() {
        let mut controller = RedirectController::new("/login");

        let target = controller.on_change(SessionStatus::Anonymous, None, "/secretary/calendar");
        assert_eq!(target.as_deref(), Some("/login"));
        assert_eq!(controller.intended(), Some("/secretary/calendar"));

        // The login page itself causes no navigation
        assert_eq!(controller.on_change(SessionStatus::Anonymous, None, "/login"), None);

        let target =
            controller.on_change(SessionStatus::Authenticated, Some(Role::Secretary), "/login");
        assert_eq!(target.as_deref(), Some("/secretary/calendar"));
        assert_eq!(controller.intended(), None);
    }

    #[test]
    fn test_controller_discards_destination_role_cannot_open() {
        let mut controller = RedirectController::new("/login");
        controller.capture("/admin/dashboard");

        let target = controller.on_change(SessionStatus::Authenticated, Some(Role::Client), "/login");
        assert_eq!(target.as_deref(), Some("/client/dashboard"));
        assert_eq!(controller.intended(), None);
    }

    #[test]
    fn test_controller_public_pages_for_anonymous() {
        let mut controller = RedirectController::new("/login");
        assert_eq!(controller.on_change(SessionStatus::Anonymous, None, "/"), None);
        assert_eq!(controller.on_change(SessionStatus::Anonymous, None, "/register"), None);
    }

    #[test]
    fn test_reverify_only_on_new_protected_path() {
        let mut controller = RedirectController::new("/login");
        assert!(controller.reverify_on(SessionStatus::Degraded, "/doctor/schedule"));

        // Re-published state on the same page
        assert!(!controller.reverify_on(SessionStatus::Degraded, "/doctor/schedule"));
        assert!(!controller.reverify_on(SessionStatus::Degraded, "/doctor/schedule/"));

        assert!(controller.reverify_on(SessionStatus::Degraded, "/doctor/patients"));
        assert!(!controller.reverify_on(SessionStatus::Degraded, "/"));
        assert!(!controller.reverify_on(SessionStatus::Authenticated, "/doctor/schedule"));
    }

    #[test]
    fn test_reverify_skips_path_seen_during_boot() {
        let mut controller = RedirectController::new("/login");
        assert!(!controller.reverify_on(SessionStatus::Initializing, "/doctor/schedule"));
        assert!(!controller.reverify_on(SessionStatus::Degraded, "/doctor/schedule"));
    }

    #[test]
    fn test_controller_degraded_counts_as_signed_in() {
        let mut controller = RedirectController::new("/login");
        assert_eq!(
            controller.on_change(SessionStatus::Degraded, Some(Role::Doctor), "/login"),
            Some("/doctor/dashboard".to_string())
        );
    }
}
