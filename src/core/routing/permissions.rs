//! Static route permission table

use super::pattern::RoutePattern;
use crate::core::session::Role;

/// Landing route and allow-list for one role
#[derive(Debug, Clone, Copy)]
pub struct RolePermissions {
    pub default_route: &'static str,
    pub allow: &'static [RoutePattern<'static>],
}

/// Routes any visitor may open, signed in or not
pub const PUBLIC_ROUTES: &[RoutePattern<'static>] = &[
    RoutePattern::new("/"),
    RoutePattern::new("/login"),
    RoutePattern::new("/register"),
    RoutePattern::new("/forgot-password"),
];

/// Public routes that make no sense with a session (sign-in forms)
pub const PUBLIC_ONLY_ROUTES: &[RoutePattern<'static>] = &[
    RoutePattern::new("/login"),
    RoutePattern::new("/register"),
    RoutePattern::new("/forgot-password"),
];

const CLIENT: RolePermissions = RolePermissions {
    default_route: "/client/dashboard",
    allow: &[
        RoutePattern::new("/client/dashboard"),
        RoutePattern::new("/client/appointments/*"),
        RoutePattern::new("/client/doctors"),
        RoutePattern::new("/client/doctors/:id"),
        RoutePattern::new("/client/profile"),
        RoutePattern::new("/profile"),
    ],
};

const DOCTOR: RolePermissions = RolePermissions {
    default_route: "/doctor/dashboard",
    allow: &[
        RoutePattern::new("/doctor/dashboard"),
        RoutePattern::new("/doctor/appointments/*"),
        RoutePattern::new("/doctor/schedule"),
        RoutePattern::new("/doctor/patients"),
        RoutePattern::new("/doctor/patients/:id"),
        RoutePattern::new("/doctor/patients/:id/history"),
        RoutePattern::new("/profile"),
    ],
};

const SECRETARY: RolePermissions = RolePermissions {
    default_route: "/secretary/dashboard",
    allow: &[
        RoutePattern::new("/secretary/dashboard"),
        RoutePattern::new("/secretary/calendar"),
        RoutePattern::new("/secretary/appointments/*"),
        RoutePattern::new("/secretary/patients/*"),
        RoutePattern::new("/secretary/doctors"),
        RoutePattern::new("/secretary/doctors/:id"),
        RoutePattern::new("/profile"),
    ],
};

const ADMIN: RolePermissions = RolePermissions {
    default_route: "/admin/dashboard",
    allow: &[RoutePattern::new("/admin/*"), RoutePattern::new("/profile")],
};

const SUPERADMIN: RolePermissions = RolePermissions {
    default_route: "/superadmin/dashboard",
    allow: &[
        RoutePattern::new("/superadmin/*"),
        RoutePattern::new("/admin/*"),
        RoutePattern::new("/profile"),
    ],
};

/// Permissions for `role`
pub const fn permissions_for(role: Role) -> &'static RolePermissions {
    match role {
        Role::Client => &CLIENT,
        Role::Doctor => &DOCTOR,
        Role::Secretary => &SECRETARY,
        Role::Admin => &ADMIN,
        Role::SuperAdmin => &SUPERADMIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_a_rooted_default_route() {
        for role in Role::ALL {
            let perms = permissions_for(role);
            assert!(perms.default_route.starts_with('/'), "{role}");
            assert!(!perms.allow.is_empty(), "{role}");
        }
    }

    #[test]
    fn test_default_routes_are_distinct() {
        let mut routes: Vec<_> = Role::ALL
            .iter()
            .map(|r| permissions_for(*r).default_route)
            .collect();
        routes.sort_unstable();
        routes.dedup();
        assert_eq!(routes.len(), Role::ALL.len());
    }

    #[test]
    fn test_public_only_routes_are_public() {
        for route in PUBLIC_ONLY_ROUTES {
            assert!(PUBLIC_ROUTES.contains(route), "{}", route.as_str());
        }
    }
}
