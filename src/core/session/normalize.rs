//! Backend payload normalization
//!
//! Backends in the wild spell the same attribute many ways. Every lookup in
//! this module walks an ordered list of candidate keys and takes the first one
//! that holds a usable value. These lists are the only place that knowledge
//! lives; the rest of the crate works with [`Actor`] and [`TokenPayload`].

use serde_json::{Map, Value};

use super::actor::{Actor, Role};
use super::error::PayloadError;

/// Containers that may wrap the token fields, after the root
const TOKEN_CONTAINERS: &[&str] = &["tokens"];
const ACCESS_KEYS: &[&str] = &["access", "accessToken", "access_token", "token"];
const REFRESH_KEYS: &[&str] = &["refresh", "refreshToken", "refresh_token"];

/// Containers that may hold the actor, tried before the root object
const ACTOR_CONTAINERS: &[&str] = &["user", "actor", "profile", "data"];
const ID_KEYS: &[&str] = &["id", "_id", "userId", "user_id"];
const EMAIL_KEYS: &[&str] = &["email", "mail"];
const NAME_KEYS: &[&str] = &["name", "fullName", "full_name", "displayName", "username"];
const FIRST_NAME_KEYS: &[&str] = &["first_name", "firstName"];
const LAST_NAME_KEYS: &[&str] = &["last_name", "lastName"];
const ROLE_KEYS: &[&str] = &["role", "userRole", "user_role", "type"];
const ROLES_LIST_KEY: &str = "roles";
const ACTIVE_KEYS: &[&str] = &["isActive", "is_active", "active"];
const PROFILE_ID_KEYS: &[&str] = &[
    "profileId",
    "profile_id",
    "patientId",
    "patient_id",
    "doctorId",
    "doctor_id",
    "secretaryId",
    "secretary_id",
];

const ERROR_MESSAGE_KEYS: &[&str] = &["message", "detail", "error", "msg"];
const ERROR_CODE_KEYS: &[&str] = &["code", "error_code"];

/// Tokens (and possibly an actor) extracted from a login/register/refresh body
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPayload {
    pub access_token: String,
    /// Absent when the backend does not rotate refresh tokens
    pub refresh_token: Option<String>,
    pub actor: Option<Actor>,
}

/// Extract tokens and the optional actor from an auth response
pub fn token_payload(payload: &Value) -> Result<TokenPayload, PayloadError> {
    let access_token =
        token_field(payload, ACCESS_KEYS).ok_or(PayloadError::MissingField("access token"))?;
    let refresh_token = token_field(payload, REFRESH_KEYS);

    let actor = match actor_object(payload) {
        Some(obj) if obj_has_any(obj, ID_KEYS) => Some(actor_from_object(obj, None)?),
        _ => None,
    };

    Ok(TokenPayload {
        access_token,
        refresh_token,
        actor,
    })
}

/// Normalize a profile response into an [`Actor`]
pub fn actor(payload: &Value) -> Result<Actor, PayloadError> {
    let obj = actor_object(payload).ok_or(PayloadError::MissingField("user"))?;
    actor_from_object(obj, None)
}

/// Normalize a partial profile response over `current`; fields the payload
/// omits keep their current values.
pub fn merge_actor(current: &Actor, payload: &Value) -> Result<Actor, PayloadError> {
    match actor_object(payload) {
        Some(obj) => actor_from_object(obj, Some(current)),
        None => Ok(current.clone()),
    }
}

/// Pull the human-readable message and machine code out of an error body
pub fn error_details(payload: &Value) -> (Option<String>, Option<String>) {
    let Some(obj) = payload.as_object() else {
        return (payload.as_str().map(str::to_string), None);
    };

    let message = ERROR_MESSAGE_KEYS.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // {"error": {"message": "..."}}
        Value::Object(inner) => string_field(inner, &["message"]),
        // DRF style {"detail": ["..."]}
        Value::Array(items) => items.first()?.as_str().map(str::to_string),
        _ => None,
    });
    let code = string_field(obj, ERROR_CODE_KEYS);

    (message, code)
}

fn token_field(payload: &Value, keys: &[&str]) -> Option<String> {
    let root = payload.as_object()?;
    string_field(root, keys).or_else(|| {
        TOKEN_CONTAINERS
            .iter()
            .filter_map(|c| root.get(*c)?.as_object())
            .find_map(|inner| string_field(inner, keys))
    })
}

fn actor_object(payload: &Value) -> Option<&Map<String, Value>> {
    let root = payload.as_object()?;
    ACTOR_CONTAINERS
        .iter()
        .filter_map(|c| root.get(*c)?.as_object())
        .find(|obj| obj_has_any(obj, ID_KEYS) || obj_has_any(obj, ROLE_KEYS))
        .or(Some(root))
}

fn actor_from_object(
    obj: &Map<String, Value>,
    current: Option<&Actor>,
) -> Result<Actor, PayloadError> {
    let id = string_field(obj, ID_KEYS)
        .or_else(|| current.map(|a| a.id.clone()))
        .ok_or(PayloadError::MissingField("id"))?;

    let email = string_field(obj, EMAIL_KEYS)
        .or_else(|| current.map(|a| a.email.clone()))
        .unwrap_or_default();

    let name = string_field(obj, NAME_KEYS)
        .or_else(|| joined_name(obj))
        .or_else(|| current.map(|a| a.name.clone()))
        .unwrap_or_else(|| email.clone());

    let role = match role_claim(obj) {
        Some(claim) => Role::parse(&claim).ok_or(PayloadError::UnknownRole(claim))?,
        None => current
            .map(|a| a.role)
            .ok_or(PayloadError::MissingField("role"))?,
    };

    let is_active = ACTIVE_KEYS
        .iter()
        .find_map(|key| obj.get(*key)?.as_bool())
        .or_else(|| current.map(|a| a.is_active))
        .unwrap_or(true);

    let profile_id =
        string_field(obj, PROFILE_ID_KEYS).or_else(|| current.and_then(|a| a.profile_id.clone()));

    Ok(Actor {
        id,
        email,
        name,
        role,
        is_active,
        profile_id,
    })
}

fn role_claim(obj: &Map<String, Value>) -> Option<String> {
    string_field(obj, ROLE_KEYS).or_else(|| {
        obj.get(ROLES_LIST_KEY)?
            .as_array()?
            .first()?
            .as_str()
            .map(str::to_string)
    })
}

fn joined_name(obj: &Map<String, Value>) -> Option<String> {
    let first = string_field(obj, FIRST_NAME_KEYS).unwrap_or_default();
    let last = string_field(obj, LAST_NAME_KEYS).unwrap_or_default();
    let full = format!("{first} {last}").trim().to_string();
    (!full.is_empty()).then_some(full)
}

/// First key whose value is a non-empty string or a number
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn obj_has_any(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|key| obj.get(*key).is_some_and(|v| !v.is_null()))
}
