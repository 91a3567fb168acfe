//! Role-based route authorization
//!
//! - `pattern`: the allow-list grammar and path normalization
//! - `permissions`: the static role table
//! - `guard`: pure allow/deny decisions
//! - `redirect`: turning decisions into navigation targets

pub mod guard;
pub mod pattern;
pub mod permissions;
pub mod redirect;

pub use guard::{
    Decision, NavigationOutcome, decide, default_route_for, guard_navigation, is_public,
    public_only,
};
pub use pattern::{RoutePattern, normalize_path};
pub use permissions::{RolePermissions, permissions_for};
pub use redirect::{RedirectController, compute_redirect};
