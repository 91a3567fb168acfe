//! Auth context for managing user authentication state
//!
//! This module provides a reactive authentication context that:
//! - Mirrors the session service's state into signals
//! - Exposes login, logout, registration and profile flows to components
//! - Boots the session from localStorage after hydration
//! - Drives periodic re-verification when configured

use leptos::prelude::*;
#[cfg(not(feature = "ssr"))]
use leptos::task::spawn_local;

use crate::core::config::SessionConfig;
use crate::core::session::{
    Actor, AuthError, ClientSession, ProfileUpdate, RegistrationForm, Role, SessionError,
    SessionStatus,
};

const UNAVAILABLE_MESSAGE: &str = "Sign-in is not available yet. Please try again.";

// The session service is not Send, so it lives beside the browser thread
#[cfg(not(feature = "ssr"))]
thread_local! {
    static SESSION: std::cell::RefCell<Option<ClientSession>> = const { std::cell::RefCell::new(None) };
}

/// Session service for this thread (never present during server rendering)
fn current_session() -> Option<ClientSession> {
    #[cfg(not(feature = "ssr"))]
    {
        SESSION.with(|cell| cell.borrow().clone())
    }
    #[cfg(feature = "ssr")]
    {
        None
    }
}

/// Auth context providing authentication state and actions
#[derive(Clone, Copy)]
pub struct AuthContext {
    /// Current session status
    pub status: RwSignal<SessionStatus>,
    /// Current actor (if signed in, possibly from cache)
    pub actor: RwSignal<Option<Actor>>,
    /// Error message from the last credential flow, or the session-expired notice
    pub error: RwSignal<Option<String>>,
    /// Error message from the last profile update
    pub profile_error: RwSignal<Option<String>>,
    config: StoredValue<SessionConfig>,
}

impl AuthContext {
    /// Check if user is authenticated (confirmed or from cache)
    pub fn is_authenticated(&self) -> bool {
        self.status.get().is_authenticated() && self.actor.with(Option::is_some)
    }

    /// Whether the session is still being resolved
    pub fn is_loading(&self) -> bool {
        self.status.get() == SessionStatus::Initializing
    }

    /// Role of the current actor (if authenticated)
    pub fn role(&self) -> Option<Role> {
        if !self.status.get().is_authenticated() {
            return None;
        }
        self.actor.with(|a| a.as_ref().map(|a| a.role))
    }

    pub fn config(&self) -> SessionConfig {
        self.config.get_value()
    }

    /// Session service handle
    pub fn session(&self) -> Option<ClientSession> {
        current_session()
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<Actor, AuthError> {
        match current_session() {
            Some(session) => session.login(identifier, password).await,
            None => Err(unavailable()),
        }
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<Actor, AuthError> {
        match current_session() {
            Some(session) => session.register(form).await,
            None => Err(unavailable()),
        }
    }

    pub async fn logout(&self) {
        if let Some(session) = current_session() {
            session.logout().await;
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Actor, SessionError> {
        match current_session() {
            Some(session) => session.update_profile(update).await,
            None => Err(SessionError::NotAuthenticated),
        }
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), SessionError> {
        match current_session() {
            Some(session) => session.change_password(current, new).await,
            None => Err(SessionError::NotAuthenticated),
        }
    }

    pub async fn refresh_user_profile(&self) -> Result<Actor, SessionError> {
        match current_session() {
            Some(session) => session.refresh_user_profile().await,
            None => Err(SessionError::NotAuthenticated),
        }
    }

    /// Clear error messages
    pub fn clear_error(&self) {
        match current_session() {
            Some(session) => session.clear_error(),
            None => {
                self.error.set(None);
                self.profile_error.set(None);
            }
        }
    }

    /// Re-verify a degraded session in the background
    pub fn ensure_verified(&self) {
        #[cfg(not(feature = "ssr"))]
        if let Some(flow) = current_session().and_then(|s| s.ensure_verified()) {
            spawn_local(flow);
        }
    }
}

fn unavailable() -> AuthError {
    AuthError::Unknown {
        message: Some(UNAVAILABLE_MESSAGE.to_string()),
    }
}

/// Provide auth context to the component tree
pub fn provide_auth_context(config: SessionConfig) -> AuthContext {
    // Unsettled on both server and client until the stored session is read
    let ctx = AuthContext {
        status: RwSignal::new(SessionStatus::Initializing),
        actor: RwSignal::new(None::<Actor>),
        error: RwSignal::new(None::<String>),
        profile_error: RwSignal::new(None::<String>),
        config: StoredValue::new(config),
    };

    #[cfg(not(feature = "ssr"))]
    {
        let session = crate::core::session::client_session(ctx.config());
        session.subscribe(move |snapshot| {
            ctx.status.set(snapshot.status);
            ctx.actor.set(snapshot.actor.clone());
            ctx.error.set(snapshot.error.clone());
            ctx.profile_error.set(snapshot.profile_error.clone());
        });
        if let Some(previous) = SESSION.with(|cell| cell.borrow_mut().replace(session)) {
            previous.dispose();
        }

        // Restore the session after hydration
        Effect::new(move |_| {
            if let Some(session) = current_session() {
                spawn_local(session.init());
            }
        });

        if let crate::core::config::ReverifyPolicy::Interval(period) = ctx.config().reverify {
            let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
            let interval = gloo_timers::callback::Interval::new(millis, move || {
                ctx.ensure_verified();
            });
            // Keep interval alive for the lifetime of the app
            std::mem::forget(interval);
        }

        on_cleanup(|| {
            if let Some(session) = SESSION.with(|cell| cell.borrow_mut().take()) {
                session.dispose();
            }
        });
    }

    provide_context(ctx);
    ctx
}

/// Get auth context from the component tree
pub fn use_auth_context() -> AuthContext {
    expect_context::<AuthContext>()
}
