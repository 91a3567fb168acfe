//! Credential store
//!
//! Durable key/value persistence of the token pair and a cached actor.
//! Synchronous and infallible from the caller's point of view: storage
//! failures are logged and otherwise ignored.

use std::cell::RefCell;
use std::collections::HashMap;

use super::actor::{Actor, Session};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Minimal synchronous key/value storage
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process storage used during server rendering and in tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Browser `localStorage`
#[cfg(not(feature = "ssr"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStorage;

#[cfg(not(feature = "ssr"))]
impl BrowserStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

#[cfg(not(feature = "ssr"))]
impl KeyValueStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        match Self::storage() {
            Some(storage) => {
                if storage.set_item(key, value).is_err() {
                    tracing::warn!(key, "localStorage write failed");
                }
            }
            None => tracing::warn!(key, "localStorage unavailable"),
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// Token pair and cached actor on top of a [`KeyValueStorage`]
#[derive(Debug, Default)]
pub struct CredentialStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> CredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn save(&self, access_token: &str, refresh_token: &str) {
        self.storage.set(ACCESS_TOKEN_KEY, access_token);
        self.storage.set(REFRESH_TOKEN_KEY, refresh_token);
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn save_actor(&self, actor: &Actor) {
        match serde_json::to_string(actor) {
            Ok(json) => self.storage.set(USER_KEY, &json),
            Err(err) => tracing::warn!(%err, "failed to serialize actor"),
        }
    }

    /// Cached actor. A value that does not parse means the store is corrupt:
    /// everything is cleared and `None` is returned.
    pub fn actor(&self) -> Option<Actor> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(actor) => Some(actor),
            Err(err) => {
                tracing::warn!(%err, "cached actor is malformed, clearing credentials");
                self.clear();
                None
            }
        }
    }

    /// Persist a whole session
    pub fn save_session(&self, session: &Session) {
        self.save(&session.access_token, &session.refresh_token);
        self.save_actor(&session.actor);
    }

    /// The full session, if both tokens and an actor are stored
    pub fn session(&self) -> Option<Session> {
        let actor = self.actor()?;
        Some(Session {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
            actor,
        })
    }

    pub fn has_session(&self) -> bool {
        self.session().is_some()
    }

    pub fn clear(&self) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(USER_KEY);
    }
}
