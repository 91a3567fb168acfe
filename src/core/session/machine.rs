//! Session state machine
//!
//! Single writer of the credential store. Every transition replaces the
//! [`SessionSnapshot`] and notifies subscribers, which is how the UI layer
//! learns about changes.
//!
//! Flows that suspend (boot verification, login, refresh) capture the current
//! epoch when they start. Logout and every successful login bump it, so a flow
//! that resolves after the session was replaced drops its result instead of
//! resurrecting the old session.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use tracing::{debug, info, warn};

use super::actor::{Actor, ProfileUpdate, RegistrationForm, Role, Session};
use super::arbiter::{RefreshArbiter, Timer, resolve_session, with_deadline};
use super::backend::AuthBackend;
use super::error::{
    ATTEMPT_SUPERSEDED_MESSAGE, AuthError, LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE, SESSION_EXPIRED_MESSAGE,
    SessionError, VERIFY_FAILED_MESSAGE,
};
use super::normalize;
use super::store::{CredentialStore, KeyValueStorage};
use crate::core::config::SessionConfig;

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum SessionStatus {
    /// No session
    #[default]
    #[display("anonymous")]
    Anonymous,
    /// Waiting on the backend with nothing cached to show
    #[display("initializing")]
    Initializing,
    /// Confirmed by the backend
    #[display("authenticated")]
    Authenticated,
    /// Authenticated from the cached actor, pending confirmation
    #[display("degraded")]
    Degraded,
    /// Last attempt failed; not authenticated
    #[display("error")]
    Error,
}

impl SessionStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, SessionStatus::Authenticated | SessionStatus::Degraded)
    }

    /// Whether route decisions can be trusted yet
    pub fn is_settled(self) -> bool {
        self != SessionStatus::Initializing
    }
}

/// Observable session state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub actor: Option<Actor>,
    /// Error from the last login/register/verification, or the
    /// session-expired notice after a forced logout
    pub error: Option<String>,
    /// Error from the last profile update
    pub profile_error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated() && self.actor.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Initializing
    }

    pub fn role(&self) -> Option<Role> {
        self.is_authenticated()
            .then(|| self.actor.as_ref().map(|a| a.role))
            .flatten()
    }
}

/// Shared handle to a boot or verification flow. Awaiting it from several
/// places runs the flow once.
pub type Flow = Shared<LocalBoxFuture<'static, ()>>;

type Listener = Rc<dyn Fn(&SessionSnapshot)>;

struct RunningFlow {
    id: u64,
    flow: Flow,
}

struct Inner<B, S, T> {
    backend: Rc<B>,
    timer: Rc<T>,
    store: CredentialStore<S>,
    arbiter: RefreshArbiter<B, T>,
    config: SessionConfig,
    snapshot: RefCell<SessionSnapshot>,
    listeners: RefCell<Vec<Listener>>,
    boot: RefCell<Option<Flow>>,
    verification: RefCell<Option<RunningFlow>>,
    next_flow_id: Cell<u64>,
    epoch: Cell<u64>,
    disposed: Cell<bool>,
}

/// Session service. Cheap to clone; clones share state.
pub struct SessionMachine<B, S, T> {
    inner: Rc<Inner<B, S, T>>,
}

impl<B, S, T> Clone for SessionMachine<B, S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B, S, T> SessionMachine<B, S, T>
where
    B: AuthBackend,
    S: KeyValueStorage + 'static,
    T: Timer,
{
    pub fn new(backend: B, store: CredentialStore<S>, timer: T, config: SessionConfig) -> Self {
        let backend = Rc::new(backend);
        let timer = Rc::new(timer);
        let arbiter =
            RefreshArbiter::new(Rc::clone(&backend), Rc::clone(&timer), config.refresh_timeout);

        Self {
            inner: Rc::new(Inner {
                backend,
                timer,
                store,
                arbiter,
                config,
                // Nothing has been read from the store yet
                snapshot: RefCell::new(SessionSnapshot {
                    status: SessionStatus::Initializing,
                    ..Default::default()
                }),
                listeners: RefCell::new(Vec::new()),
                boot: RefCell::new(None),
                verification: RefCell::new(None),
                next_flow_id: Cell::new(0),
                epoch: Cell::new(0),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.snapshot.borrow().status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &CredentialStore<S> {
        &self.inner.store
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn arbiter(&self) -> &RefreshArbiter<B, T> {
        &self.inner.arbiter
    }

    /// Register a listener. It is called right away with the current
    /// snapshot and then after every transition.
    pub fn subscribe(&self, listener: impl Fn(&SessionSnapshot) + 'static) {
        let listener: Listener = Rc::new(listener);
        listener(&self.snapshot());
        self.inner.listeners.borrow_mut().push(listener);
    }

    // ========================================================================
    // Boot and background verification
    // ========================================================================

    /// Restore the session from the store.
    ///
    /// The status is updated before this returns: `Anonymous` unless both
    /// tokens are stored, `Degraded` with both tokens and a cached actor,
    /// `Initializing` with tokens only. A lone token is discarded. The returned flow completes when background verification does.
    /// Only the first call does any work; later calls get the same flow.
    pub fn init(&self) -> Flow {
        if let Some(flow) = self.inner.boot.borrow().as_ref() {
            debug!("boot already started, joining");
            return flow.clone();
        }

        // Read the actor first: a corrupt cache clears the tokens too.
        let cached = self.inner.store.actor();
        let has_tokens =
            self.inner.store.access_token().is_some() && self.inner.store.refresh_token().is_some();

        let flow = match (has_tokens, cached) {
            (false, _) => {
                self.inner.store.clear();
                info!("boot: no complete stored session");
                self.publish(|s| *s = SessionSnapshot::default());
                future::ready(()).boxed_local().shared()
            }
            (true, Some(actor)) => {
                info!(role = %actor.role, "boot: restoring cached session, verifying in background");
                self.publish(|s| {
                    *s = SessionSnapshot {
                        status: SessionStatus::Degraded,
                        actor: Some(actor),
                        ..Default::default()
                    }
                });
                self.verification_flow()
            }
            (true, None) => {
                info!("boot: tokens without cached actor, verifying");
                self.publish(|s| {
                    *s = SessionSnapshot {
                        status: SessionStatus::Initializing,
                        ..Default::default()
                    }
                });
                self.verification_flow()
            }
        };

        *self.inner.boot.borrow_mut() = Some(flow.clone());
        flow
    }

    /// Re-verify a degraded session. Called on protected navigation and by the
    /// interval policy. Joins a verification that is already running.
    pub fn ensure_verified(&self) -> Option<Flow> {
        if self.status() != SessionStatus::Degraded {
            return None;
        }
        Some(self.verification_flow())
    }

    fn verification_flow(&self) -> Flow {
        if let Some(running) = self.inner.verification.borrow().as_ref() {
            return running.flow.clone();
        }

        let id = self.inner.next_flow_id.get();
        self.inner.next_flow_id.set(id + 1);

        let machine = self.clone();
        let epoch = self.inner.epoch.get();
        let flow = async move {
            machine.verify(epoch).await;
            let mut slot = machine.inner.verification.borrow_mut();
            if slot.as_ref().is_some_and(|r| r.id == id) {
                *slot = None;
            }
        }
        .boxed_local()
        .shared();

        *self.inner.verification.borrow_mut() = Some(RunningFlow {
            id,
            flow: flow.clone(),
        });
        flow
    }

    async fn verify(&self, epoch: u64) {
        let inner = &self.inner;

        if let Some(access) = inner.store.access_token() {
            let profile = with_deadline(
                &*inner.timer,
                inner.config.refresh_timeout,
                inner.backend.get_profile(&access),
            )
            .await;

            match profile {
                Some(Ok(payload)) => match normalize::actor(&payload) {
                    Ok(actor) => {
                        if self.is_current(epoch) {
                            debug!(role = %actor.role, "session verified");
                            inner.store.save_actor(&actor);
                            self.publish(|s| {
                                *s = SessionSnapshot {
                                    status: SessionStatus::Authenticated,
                                    actor: Some(actor),
                                    ..Default::default()
                                }
                            });
                        }
                        return;
                    }
                    Err(err) => warn!(%err, "profile response unusable, trying refresh"),
                },
                Some(Err(err)) => debug!(%err, "profile verification failed, trying refresh"),
                None => debug!("profile verification timed out, trying refresh"),
            }
        }

        if !self.is_current(epoch) {
            return;
        }

        let Some(refresh) = inner.store.refresh_token() else {
            warn!("no refresh token, session cannot be renewed");
            self.expire();
            return;
        };

        let outcome = inner.arbiter.attempt_refresh(&refresh).await;
        if !self.is_current(epoch) {
            debug!("discarding refresh outcome for a replaced session");
            return;
        }

        match outcome {
            Ok(session) => {
                info!(role = %session.actor.role, "session renewed");
                inner.store.save_session(&session);
                self.publish(|s| {
                    *s = SessionSnapshot {
                        status: SessionStatus::Authenticated,
                        actor: Some(session.actor),
                        ..Default::default()
                    }
                });
            }
            Err(err) if err.is_terminal() => self.expire(),
            Err(err) => self.hold_after_transient(&err),
        }
    }

    /// Transient failure: keep whatever the store has
    fn hold_after_transient(&self, err: &AuthError) {
        match self.inner.store.actor() {
            Some(actor) => {
                info!(error = %err, "verification failed transiently, keeping cached session");
                self.publish(|s| {
                    s.status = SessionStatus::Degraded;
                    s.actor = Some(actor);
                });
            }
            None => {
                warn!(error = %err, "verification failed transiently with nothing cached");
                self.publish(|s| {
                    *s = SessionSnapshot {
                        status: SessionStatus::Error,
                        error: Some(VERIFY_FAILED_MESSAGE.to_string()),
                        ..Default::default()
                    }
                });
            }
        }
    }

    /// Forced logout after a terminal failure
    fn expire(&self) {
        warn!("session expired, signing out");
        self.reset(Some(SESSION_EXPIRED_MESSAGE.to_string()));
    }

    // ========================================================================
    // Credential flows
    // ========================================================================

    /// Sign in. Any existing session is replaced as soon as the attempt
    /// starts. Failures land in `error` and are returned; nothing is retried.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Actor, AuthError> {
        let epoch = self.begin_attempt();
        let backend = &*self.inner.backend;

        let result = match backend.login(identifier, password).await {
            Ok(payload) => {
                resolve_session(backend, &payload, None, AuthError::from_credentials_failure).await
            }
            Err(err) => Err(AuthError::from_credentials_failure(err)),
        };

        self.finish_attempt(epoch, result, LOGIN_FAILED_MESSAGE)
    }

    /// Create an account and sign in with it
    pub async fn register(&self, form: &RegistrationForm) -> Result<Actor, AuthError> {
        let epoch = self.begin_attempt();
        let backend = &*self.inner.backend;

        let result = match backend.register(form).await {
            Ok(payload) => {
                resolve_session(backend, &payload, None, AuthError::from_credentials_failure).await
            }
            Err(err) => Err(AuthError::from_credentials_failure(err)),
        };

        self.finish_attempt(epoch, result, REGISTER_FAILED_MESSAGE)
    }

    fn begin_attempt(&self) -> u64 {
        let epoch = self.bump_epoch();
        self.inner.store.clear();
        self.publish(|s| {
            *s = SessionSnapshot {
                status: SessionStatus::Initializing,
                ..Default::default()
            }
        });
        epoch
    }

    fn finish_attempt(
        &self,
        epoch: u64,
        result: Result<Session, AuthError>,
        fallback: &str,
    ) -> Result<Actor, AuthError> {
        if !self.is_current(epoch) {
            debug!("credential attempt superseded, ignoring its result");
            return Err(AuthError::Unknown {
                message: Some(ATTEMPT_SUPERSEDED_MESSAGE.to_string()),
            });
        }

        match result {
            Ok(session) => {
                info!(role = %session.actor.role, "signed in");
                self.inner.store.save_session(&session);
                let actor = session.actor;
                self.publish(|s| {
                    *s = SessionSnapshot {
                        status: SessionStatus::Authenticated,
                        actor: Some(actor.clone()),
                        ..Default::default()
                    }
                });
                Ok(actor)
            }
            Err(err) => {
                warn!(error = %err, class = ?err.class(), "credential attempt failed");
                let message = err.user_message(fallback);
                self.publish(|s| {
                    *s = SessionSnapshot {
                        status: SessionStatus::Error,
                        error: Some(message),
                        ..Default::default()
                    }
                });
                Err(err)
            }
        }
    }

    /// Sign out. Local state is cleared first and unconditionally; the
    /// backend is told afterwards on a best-effort basis.
    pub async fn logout(&self) {
        let refresh = self.inner.store.refresh_token();
        self.reset(None);

        if let Some(refresh) = refresh {
            if let Err(err) = self.inner.backend.logout(&refresh).await {
                debug!(%err, "backend logout failed, local session already cleared");
            }
        }
    }

    fn reset(&self, notice: Option<String>) {
        self.bump_epoch();
        self.inner.store.clear();
        self.publish(|s| {
            *s = SessionSnapshot {
                error: notice,
                ..Default::default()
            }
        });
    }

    // ========================================================================
    // Operations on an active session
    // ========================================================================

    fn active_access_token(&self) -> Result<String, SessionError> {
        if !self.inner.snapshot.borrow().is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.inner
            .store
            .access_token()
            .ok_or(SessionError::NotAuthenticated)
    }

    /// Update the profile. The returned fields are merged over the current
    /// actor; the status does not change. Failures go to `profile_error`.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Actor, SessionError> {
        let access = self.active_access_token()?;
        let epoch = self.inner.epoch.get();
        self.publish(|s| s.profile_error = None);

        let result = match self.inner.backend.update_profile(&access, update).await {
            Ok(payload) => {
                let current = self.inner.snapshot.borrow().actor.clone();
                match current {
                    Some(current) => normalize::merge_actor(&current, &payload).map_err(AuthError::from),
                    None => normalize::actor(&payload).map_err(AuthError::from),
                }
            }
            Err(err) => Err(AuthError::from_credentials_failure(err)),
        };

        if !self.is_current(epoch) {
            return Err(SessionError::NotAuthenticated);
        }

        match result {
            Ok(actor) => {
                self.inner.store.save_actor(&actor);
                self.publish(|s| s.actor = Some(actor.clone()));
                Ok(actor)
            }
            Err(err) => {
                warn!(error = %err, "profile update failed");
                let message = err.user_message("Could not update your profile.");
                self.publish(|s| s.profile_error = Some(message));
                Err(err.into())
            }
        }
    }

    /// Change the password. Errors are returned to the caller as-is.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        let access = self.active_access_token()?;
        self.inner
            .backend
            .change_password(&access, current_password, new_password)
            .await
            .map_err(|err| SessionError::Auth(AuthError::from_credentials_failure(err)))
    }

    /// Verify the session now and return the fresh actor
    pub async fn refresh_user_profile(&self) -> Result<Actor, SessionError> {
        if !self.status().is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.verification_flow().await;

        let snapshot = self.snapshot();
        match snapshot.actor {
            Some(actor) if snapshot.status.is_authenticated() => Ok(actor),
            _ => Err(SessionError::NotAuthenticated),
        }
    }

    pub fn clear_error(&self) {
        self.publish(|s| {
            s.error = None;
            s.profile_error = None;
        });
    }

    /// Stop publishing and drop in-flight flows. Results that arrive later
    /// are discarded.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.bump_epoch();
        self.inner.listeners.borrow_mut().clear();
        self.inner.boot.borrow_mut().take();
        self.inner.verification.borrow_mut().take();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn bump_epoch(&self) -> u64 {
        let epoch = self.inner.epoch.get() + 1;
        self.inner.epoch.set(epoch);
        // A running verification belongs to the previous session
        self.inner.verification.borrow_mut().take();
        epoch
    }

    fn is_current(&self, epoch: u64) -> bool {
        !self.inner.disposed.get() && self.inner.epoch.get() == epoch
    }

    fn publish(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        if self.inner.disposed.get() {
            return;
        }

        let snapshot = {
            let mut current = self.inner.snapshot.borrow_mut();
            update(&mut current);
            current.clone()
        };
        debug!(status = %snapshot.status, "session state published");

        let listeners: Vec<Listener> = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}
