//! Actor, role and session types

use serde::{Deserialize, Serialize};

/// Role claim carried by every actor
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("client")]
    Client,
    #[display("doctor")]
    Doctor,
    #[display("secretary")]
    Secretary,
    #[display("admin")]
    Admin,
    #[display("superadmin")]
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Client,
        Role::Doctor,
        Role::Secretary,
        Role::Admin,
        Role::SuperAdmin,
    ];

    /// Parse a role claim as backends spell it. Case-insensitive.
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" | "patient" => Some(Role::Client),
            "doctor" => Some(Role::Doctor),
            "secretary" => Some(Role::Secretary),
            "admin" => Some(Role::Admin),
            "superadmin" | "super_admin" | "super-admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

/// The authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    /// Domain linkage such as the patient profile id
    pub profile_id: Option<String>,
}

/// Token pair plus the actor it was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub actor: Actor,
}

/// Data sent to the backend to create an account
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Partial profile update; absent fields are left untouched by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_aliases() {
        assert_eq!(Role::parse("Patient"), Some(Role::Client));
        assert_eq!(Role::parse(" DOCTOR "), Some(Role::Doctor));
        assert_eq!(Role::parse("super_admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("super-admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("janitor"), None);
    }

    #[test]
    fn test_role_display_matches_serde() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role));
        }
    }

    #[test]
    fn test_profile_update_skips_empty_fields() {
        let update = ProfileUpdate {
            name: Some("Ana".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"name":"Ana"}"#);
    }
}
