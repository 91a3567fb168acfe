//! Error types for the session layer
//!
//! Three layers, each with its own enum:
//! - [`BackendError`]: what the transport reported
//! - [`AuthError`]: the classified outcome the state machine branches on
//! - [`SessionError`]: what public operations return to the UI

use serde::{Deserialize, Serialize};

/// Generic message shown when a login attempt fails without a server message
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials and try again.";

/// Generic message shown when registration fails without a server message
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

/// Notice surfaced after a forced logout
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Shown when boot verification fails transiently and no cached actor exists
pub const VERIFY_FAILED_MESSAGE: &str =
    "Unable to verify your session. Check your connection and try again.";

/// Returned by a sign-in attempt that a later login or logout replaced
pub const ATTEMPT_SUPERSEDED_MESSAGE: &str = "Sign-in was interrupted. Please try again.";

/// Failure reported by an [`AuthBackend`](super::backend::AuthBackend) call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The server answered with a non-success status
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
        code: Option<String>,
    },

    /// The request never produced a response (offline, refused, aborted)
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be read
    #[error("Decode error: {0}")]
    Decode(String),
}

impl BackendError {
    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether the payload says the presented token is invalid or expired,
    /// regardless of the status code it came with.
    pub fn indicates_invalid_token(&self) -> bool {
        let BackendError::Status { message, code, .. } = self else {
            return false;
        };

        if code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("token_not_valid"))
        {
            return true;
        }

        message.as_deref().is_some_and(|m| {
            let m = m.to_ascii_lowercase();
            m.contains("token") && (m.contains("invalid") || m.contains("expired"))
        })
    }
}

/// A backend payload that could not be normalized into tokens or an actor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// How an [`AuthError`] must be treated by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Bad credentials or fields; shown inline, never retried
    Validation,
    /// Timeout, offline, 5xx; a cached session survives it
    NetworkTransient,
    /// Rejected or expired credentials; the session is cleared
    AuthTerminal,
}

/// Classified authentication outcome
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("The server did not respond in time")]
    NetworkTimeout,

    #[error("Invalid credentials")]
    InvalidCredentials { message: Option<String> },

    #[error("Token expired or access forbidden")]
    TokenExpiredOrForbidden,

    #[error("Unexpected error: {}", message.as_deref().unwrap_or("unknown"))]
    Unknown { message: Option<String> },
}

impl AuthError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::InvalidCredentials { .. } => ErrorClass::Validation,
            AuthError::TokenExpiredOrForbidden => ErrorClass::AuthTerminal,
            AuthError::NetworkTimeout | AuthError::Unknown { .. } => ErrorClass::NetworkTransient,
        }
    }

    /// Terminal errors invalidate the session
    pub fn is_terminal(&self) -> bool {
        self.class() == ErrorClass::AuthTerminal
    }

    /// Message suitable for display: the server's own wording when it sent
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AuthError::InvalidCredentials { message: Some(m) }
            | AuthError::Unknown { message: Some(m) } => m.clone(),
            AuthError::NetworkTimeout => {
                "The server is not responding. Please try again later.".to_string()
            }
            _ => fallback.to_string(),
        }
    }

    /// Classify a failed token refresh or profile verification
    pub fn from_refresh_failure(err: BackendError) -> Self {
        if matches!(err.status(), Some(401 | 403)) || err.indicates_invalid_token() {
            return AuthError::TokenExpiredOrForbidden;
        }
        match err {
            BackendError::Network(_) => AuthError::NetworkTimeout,
            other => AuthError::Unknown {
                message: Some(other.to_string()),
            },
        }
    }

    /// Classify a failed login, registration or other credential-bearing call
    pub fn from_credentials_failure(err: BackendError) -> Self {
        match err {
            BackendError::Status {
                status: 400 | 401 | 403 | 409 | 422,
                message,
                ..
            } => AuthError::InvalidCredentials { message },
            BackendError::Status { message, .. } => AuthError::Unknown { message },
            BackendError::Network(_) => AuthError::NetworkTimeout,
            BackendError::Decode(m) => AuthError::Unknown { message: Some(m) },
        }
    }
}

impl From<PayloadError> for AuthError {
    fn from(err: PayloadError) -> Self {
        AuthError::Unknown {
            message: Some(err.to_string()),
        }
    }
}

/// Error returned by session operations that need an active session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, message: Option<&str>) -> BackendError {
        BackendError::Status {
            status,
            message: message.map(str::to_string),
            code: None,
        }
    }

    #[test]
    fn test_refresh_401_and_403_are_terminal() {
        assert!(AuthError::from_refresh_failure(status(401, None)).is_terminal());
        assert!(AuthError::from_refresh_failure(status(403, None)).is_terminal());
    }

    #[test]
    fn test_refresh_invalid_token_payload_is_terminal() {
        let err = status(400, Some("Token is invalid or expired"));
        assert_eq!(
            AuthError::from_refresh_failure(err),
            AuthError::TokenExpiredOrForbidden
        );

        let err = BackendError::Status {
            status: 400,
            message: None,
            code: Some("token_not_valid".to_string()),
        };
        assert!(AuthError::from_refresh_failure(err).is_terminal());
    }

    #[test]
    fn test_refresh_server_and_network_failures_are_transient() {
        let err = AuthError::from_refresh_failure(status(503, Some("maintenance")));
        assert_eq!(err.class(), ErrorClass::NetworkTransient);

        let err = AuthError::from_refresh_failure(BackendError::Network("refused".into()));
        assert_eq!(err, AuthError::NetworkTimeout);
    }

    #[test]
    fn test_credentials_failure_keeps_server_message() {
        let err = AuthError::from_credentials_failure(status(401, Some("Wrong password")));
        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(err.user_message(LOGIN_FAILED_MESSAGE), "Wrong password");
    }

    #[test]
    fn test_credentials_failure_without_message_uses_fallback() {
        let err = AuthError::from_credentials_failure(status(401, None));
        assert_eq!(err.user_message(LOGIN_FAILED_MESSAGE), LOGIN_FAILED_MESSAGE);
    }

    #[test]
    fn test_payload_error_is_transient() {
        let err: AuthError = PayloadError::MissingField("id").into();
        assert!(!err.is_terminal());
    }
}
