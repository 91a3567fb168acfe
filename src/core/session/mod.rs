//! Session lifecycle
//!
//! This module decides, at any moment, whether the current actor is
//! authenticated:
//! - Credential store over browser or in-memory storage
//! - Payload normalization for the backend's many response shapes
//! - Single-flight, time-bounded token refresh with failure classification
//! - The session state machine driving login, logout and boot verification

pub mod actor;
pub mod arbiter;
pub mod backend;
pub mod error;
pub mod machine;
pub mod normalize;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use actor::{Actor, ProfileUpdate, RegistrationForm, Role, Session};
#[cfg(not(feature = "ssr"))]
pub use arbiter::BrowserTimer;
#[cfg(feature = "ssr")]
pub use arbiter::TokioTimer;
pub use arbiter::{RefreshArbiter, Timer};
pub use backend::{AuthBackend, HttpAuthBackend};
pub use error::{AuthError, BackendError, ErrorClass, PayloadError, SessionError};
pub use machine::{Flow, SessionMachine, SessionSnapshot, SessionStatus};
#[cfg(not(feature = "ssr"))]
pub use store::BrowserStorage;
pub use store::{CredentialStore, KeyValueStorage, MemoryStorage};

/// Timer for the current build target
#[cfg(feature = "ssr")]
pub type PlatformTimer = TokioTimer;
#[cfg(not(feature = "ssr"))]
pub type PlatformTimer = BrowserTimer;

/// Storage for the current build target
#[cfg(feature = "ssr")]
pub type PlatformStorage = MemoryStorage;
#[cfg(not(feature = "ssr"))]
pub type PlatformStorage = BrowserStorage;

/// The session service as wired for the running application
pub type ClientSession = SessionMachine<HttpAuthBackend, PlatformStorage, PlatformTimer>;

/// Build the application's session service
pub fn client_session(config: crate::core::config::SessionConfig) -> ClientSession {
    SessionMachine::new(
        HttpAuthBackend::new(config.api_base_url.clone()),
        CredentialStore::new(PlatformStorage::default()),
        PlatformTimer::default(),
        config,
    )
}
