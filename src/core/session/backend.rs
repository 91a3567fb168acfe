//! Backend auth service contract and its HTTP client
//!
//! Every call returns the raw JSON body; shape handling is left to
//! [`normalize`](super::normalize) so that one place knows every spelling.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use super::actor::{ProfileUpdate, RegistrationForm};
use super::error::BackendError;
use super::normalize;

/// Endpoint paths relative to the API base URL
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const REFRESH: &str = "/auth/refresh";
    pub const PROFILE: &str = "/auth/me";
    pub const LOGOUT: &str = "/auth/logout";
    pub const PASSWORD: &str = "/auth/password";
}

/// Remote authentication service
///
/// Futures are not required to be `Send`: the session layer runs on a
/// single-threaded executor (the browser event loop).
pub trait AuthBackend: 'static {
    fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> impl Future<Output = Result<Value, BackendError>>;

    fn register(&self, form: &RegistrationForm)
    -> impl Future<Output = Result<Value, BackendError>>;

    fn refresh(&self, refresh_token: &str) -> impl Future<Output = Result<Value, BackendError>>;

    fn get_profile(&self, access_token: &str)
    -> impl Future<Output = Result<Value, BackendError>>;

    fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<Value, BackendError>>;

    fn logout(&self, refresh_token: &str) -> impl Future<Output = Result<(), BackendError>>;

    fn change_password(
        &self,
        access_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<(), BackendError>>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// [`AuthBackend`] over HTTP using the browser fetch API
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(access_token: &str) -> String {
        format!("Bearer {}", access_token)
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let mut builder = gloo_net::http::Request::post(&self.url(path))
            .header("Content-Type", "application/json");
        if let Some(token) = access_token {
            builder = builder.header("Authorization", &Self::bearer(token));
        }
        let request = builder
            .json(body)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::read(response).await
    }

    async fn read(response: gloo_net::http::Response) -> Result<Value, BackendError> {
        let status = response.status();
        let ok = response.ok();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) if !ok => Value::String(text),
                Err(e) => return Err(BackendError::Decode(e.to_string())),
            }
        };

        if ok {
            Ok(body)
        } else {
            let (message, code) = normalize::error_details(&body);
            Err(BackendError::Status {
                status,
                message,
                code,
            })
        }
    }
}

impl AuthBackend for HttpAuthBackend {
    async fn login(&self, identifier: &str, password: &str) -> Result<Value, BackendError> {
        let request = LoginRequest {
            identifier,
            email: identifier,
            password,
        };
        self.post_json(endpoints::LOGIN, &request, None).await
    }

    async fn register(&self, form: &RegistrationForm) -> Result<Value, BackendError> {
        self.post_json(endpoints::REGISTER, form, None).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Value, BackendError> {
        let request = RefreshRequest {
            refresh: refresh_token,
            refresh_token,
        };
        self.post_json(endpoints::REFRESH, &request, None).await
    }

    async fn get_profile(&self, access_token: &str) -> Result<Value, BackendError> {
        let response = gloo_net::http::Request::get(&self.url(endpoints::PROFILE))
            .header("Authorization", &Self::bearer(access_token))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::read(response).await
    }

    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> Result<Value, BackendError> {
        let request = gloo_net::http::Request::patch(&self.url(endpoints::PROFILE))
            .header("Content-Type", "application/json")
            .header("Authorization", &Self::bearer(access_token))
            .json(update)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::read(response).await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), BackendError> {
        let request = RefreshRequest {
            refresh: refresh_token,
            refresh_token,
        };
        self.post_json(endpoints::LOGOUT, &request, None)
            .await
            .map(|_| ())
    }

    async fn change_password(
        &self,
        access_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), BackendError> {
        let request = ChangePasswordRequest {
            current_password,
            new_password,
        };
        self.post_json(endpoints::PASSWORD, &request, Some(access_token))
            .await
            .map(|_| ())
    }
}
