//! Scripted in-memory backend for session tests

use std::cell::{Cell, RefCell};

use serde_json::{Value, json};

use super::actor::{ProfileUpdate, RegistrationForm};
use super::backend::AuthBackend;
use super::error::BackendError;

/// Canned answer for one backend endpoint
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Err(BackendError),
    /// Never resolves
    Hang,
}

impl Reply {
    pub fn status(status: u16, message: &str) -> Self {
        Reply::Err(BackendError::Status {
            status,
            message: Some(message.to_string()),
            code: None,
        })
    }

    async fn resolve(self) -> Result<Value, BackendError> {
        // Yield once so concurrent callers observe the call as in flight.
        tokio::task::yield_now().await;
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Err(err) => Err(err),
            Reply::Hang => futures::future::pending().await,
        }
    }
}

pub fn doctor_json() -> Value {
    json!({
        "id": 7,
        "email": "house@clinic.test",
        "name": "Gregory House",
        "role": "doctor",
        "is_active": true,
        "doctor_id": "d-7"
    })
}

pub fn secretary_json() -> Value {
    json!({
        "id": 9,
        "email": "desk@clinic.test",
        "first_name": "Front",
        "last_name": "Desk",
        "role": "secretary"
    })
}

pub struct ScriptedBackend {
    login: RefCell<Reply>,
    register: RefCell<Reply>,
    refresh: RefCell<Reply>,
    profile: RefCell<Reply>,
    update_profile: RefCell<Reply>,
    logout: RefCell<Reply>,
    change_password: RefCell<Reply>,
    refresh_calls: Cell<usize>,
    logout_calls: Cell<usize>,
    profile_tokens: RefCell<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Every endpoint fails with a 500 until scripted
    pub fn new() -> Self {
        let unscripted = || RefCell::new(Reply::status(500, "unscripted"));
        Self {
            login: unscripted(),
            register: unscripted(),
            refresh: unscripted(),
            profile: unscripted(),
            update_profile: unscripted(),
            logout: RefCell::new(Reply::Ok(Value::Null)),
            change_password: unscripted(),
            refresh_calls: Cell::new(0),
            logout_calls: Cell::new(0),
            profile_tokens: RefCell::new(Vec::new()),
        }
    }

    pub fn set_login(&self, reply: Reply) {
        *self.login.borrow_mut() = reply;
    }

    pub fn set_register(&self, reply: Reply) {
        *self.register.borrow_mut() = reply;
    }

    pub fn set_refresh(&self, reply: Reply) {
        *self.refresh.borrow_mut() = reply;
    }

    pub fn set_profile(&self, reply: Reply) {
        *self.profile.borrow_mut() = reply;
    }

    pub fn set_update_profile(&self, reply: Reply) {
        *self.update_profile.borrow_mut() = reply;
    }

    pub fn set_change_password(&self, reply: Reply) {
        *self.change_password.borrow_mut() = reply;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.get()
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.get()
    }

    pub fn profile_tokens(&self) -> Vec<String> {
        self.profile_tokens.borrow().clone()
    }
}

impl AuthBackend for ScriptedBackend {
    async fn login(&self, _identifier: &str, _password: &str) -> Result<Value, BackendError> {
        let reply = self.login.borrow().clone();
        reply.resolve().await
    }

    async fn register(&self, _form: &RegistrationForm) -> Result<Value, BackendError> {
        let reply = self.register.borrow().clone();
        reply.resolve().await
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<Value, BackendError> {
        self.refresh_calls.set(self.refresh_calls.get() + 1);
        let reply = self.refresh.borrow().clone();
        reply.resolve().await
    }

    async fn get_profile(&self, access_token: &str) -> Result<Value, BackendError> {
        self.profile_tokens
            .borrow_mut()
            .push(access_token.to_string());
        let reply = self.profile.borrow().clone();
        reply.resolve().await
    }

    async fn update_profile(
        &self,
        _access_token: &str,
        _update: &ProfileUpdate,
    ) -> Result<Value, BackendError> {
        let reply = self.update_profile.borrow().clone();
        reply.resolve().await
    }

    async fn logout(&self, _refresh_token: &str) -> Result<(), BackendError> {
        self.logout_calls.set(self.logout_calls.get() + 1);
        let reply = self.logout.borrow().clone();
        reply.resolve().await.map(|_| ())
    }

    async fn change_password(
        &self,
        _access_token: &str,
        _current_password: &str,
        _new_password: &str,
    ) -> Result<(), BackendError> {
        let reply = self.change_password.borrow().clone();
        reply.resolve().await.map(|_| ())
    }
}
