//! Token refresh arbiter
//!
//! Renews an access token with bounded latency and classifies the outcome.
//! Callers presenting the same refresh token while an attempt is running join
//! that attempt instead of starting another network exchange.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{self, Either, FutureExt, LocalBoxFuture, Shared};
use tracing::{debug, warn};

use super::actor::Session;
use super::backend::AuthBackend;
use super::error::{AuthError, BackendError};
use super::normalize;

/// Source of delays for timeouts
pub trait Timer: 'static {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Timer backed by the tokio runtime
#[cfg(feature = "ssr")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

#[cfg(feature = "ssr")]
impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed_local()
    }
}

/// Timer backed by `setTimeout`
#[cfg(not(feature = "ssr"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserTimer;

#[cfg(not(feature = "ssr"))]
impl Timer for BrowserTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).boxed_local()
    }
}

/// Run `fut` until it completes or `timeout` elapses, whichever comes first.
/// On timeout the pending future is dropped and `None` is returned.
pub async fn with_deadline<T, F>(timer: &impl Timer, timeout: Duration, fut: F) -> Option<T>
where
    F: Future<Output = T>,
{
    let fut = std::pin::pin!(fut);
    match future::select(fut, timer.sleep(timeout)).await {
        Either::Left((value, _)) => Some(value),
        Either::Right(((), _)) => None,
    }
}

/// Build a [`Session`] from a login/register/refresh body. When the body has
/// no actor, the profile is fetched with the new access token. A missing
/// rotated refresh token falls back to `previous_refresh`.
pub async fn resolve_session<B: AuthBackend>(
    backend: &B,
    payload: &serde_json::Value,
    previous_refresh: Option<&str>,
    classify: fn(BackendError) -> AuthError,
) -> Result<Session, AuthError> {
    let tokens = normalize::token_payload(payload)?;

    let refresh_token = tokens
        .refresh_token
        .or_else(|| previous_refresh.map(str::to_string))
        .ok_or_else(|| AuthError::Unknown {
            message: Some("Response did not include a refresh token".to_string()),
        })?;

    let actor = match tokens.actor {
        Some(actor) => actor,
        None => {
            let profile = backend
                .get_profile(&tokens.access_token)
                .await
                .map_err(classify)?;
            normalize::actor(&profile)?
        }
    };

    Ok(Session {
        access_token: tokens.access_token,
        refresh_token,
        actor,
    })
}

type RefreshFuture = Shared<LocalBoxFuture<'static, Result<Session, AuthError>>>;

struct InFlight {
    id: u64,
    refresh_token: String,
    future: RefreshFuture,
}

/// Single-flight, time-bounded token renewal
pub struct RefreshArbiter<B, T> {
    backend: Rc<B>,
    timer: Rc<T>,
    timeout: Duration,
    in_flight: Rc<RefCell<Option<InFlight>>>,
    next_id: Cell<u64>,
}

impl<B: AuthBackend, T: Timer> RefreshArbiter<B, T> {
    pub fn new(backend: Rc<B>, timer: Rc<T>, timeout: Duration) -> Self {
        Self {
            backend,
            timer,
            timeout,
            in_flight: Rc::new(RefCell::new(None)),
            next_id: Cell::new(0),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a refresh exchange is currently running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.borrow().is_some()
    }

    /// Renew the session behind `refresh_token`.
    ///
    /// `TokenExpiredOrForbidden` is the only terminal outcome; everything
    /// else (timeouts, server errors, malformed bodies) is transient.
    pub async fn attempt_refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.join_or_start(refresh_token).await
    }

    fn join_or_start(&self, refresh_token: &str) -> RefreshFuture {
        let mut slot = self.in_flight.borrow_mut();
        if let Some(running) = slot.as_ref().filter(|f| f.refresh_token == refresh_token) {
            debug!(attempt = running.id, "joining in-flight token refresh");
            return running.future.clone();
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let backend = Rc::clone(&self.backend);
        let timer = Rc::clone(&self.timer);
        let timeout = self.timeout;
        let token = refresh_token.to_string();
        let in_flight = Rc::clone(&self.in_flight);

        let future = async move {
            let outcome = run_exchange(&*backend, &*timer, timeout, &token).await;

            let mut slot = in_flight.borrow_mut();
            if slot.as_ref().is_some_and(|f| f.id == id) {
                *slot = None;
            }
            outcome
        }
        .boxed_local()
        .shared();

        debug!(attempt = id, "starting token refresh");
        *slot = Some(InFlight {
            id,
            refresh_token: refresh_token.to_string(),
            future: future.clone(),
        });
        future
    }
}

async fn run_exchange<B: AuthBackend, T: Timer>(
    backend: &B,
    timer: &T,
    timeout: Duration,
    refresh_token: &str,
) -> Result<Session, AuthError> {
    let exchange = async {
        let payload = backend
            .refresh(refresh_token)
            .await
            .map_err(AuthError::from_refresh_failure)?;
        resolve_session(
            backend,
            &payload,
            Some(refresh_token),
            AuthError::from_refresh_failure,
        )
        .await
    };

    match with_deadline(timer, timeout, exchange).await {
        Some(Ok(session)) => {
            debug!(role = %session.actor.role, "token refresh succeeded");
            Ok(session)
        }
        Some(Err(err)) => {
            warn!(error = %err, terminal = err.is_terminal(), "token refresh failed");
            Err(err)
        }
        None => {
            warn!(timeout_ms = timeout.as_millis() as u64, "token refresh timed out");
            Err(AuthError::NetworkTimeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::testing::{Reply, ScriptedBackend, doctor_json};
    use serde_json::json;

    fn arbiter(backend: &Rc<ScriptedBackend>, timeout_ms: u64) -> RefreshArbiter<ScriptedBackend, TokioTimer> {
        RefreshArbiter::new(
            Rc::clone(backend),
            Rc::new(TokioTimer),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn test_refresh_success_with_actor() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::Ok(json!({
            "access": "a2", "refresh": "r2", "user": doctor_json()
        })));

        let session = arbiter(&backend, 1000).attempt_refresh("r1").await.unwrap();
        assert_eq!(session.access_token, "a2");
        assert_eq!(session.refresh_token, "r2");
        assert_eq!(session.actor.name, "Gregory House");
        assert_eq!(backend.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_actor_fetches_profile() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::Ok(json!({"access": "a2"})));
        backend.set_profile(Reply::Ok(doctor_json()));

        let session = arbiter(&backend, 1000).attempt_refresh("r1").await.unwrap();
        assert_eq!(session.refresh_token, "r1");
        assert_eq!(backend.profile_tokens(), vec!["a2".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_401_is_terminal() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::status(401, "Unauthorized"));

        let err = arbiter(&backend, 1000).attempt_refresh("r1").await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpiredOrForbidden);
    }

    #[tokio::test]
    async fn test_refresh_invalid_token_payload_is_terminal() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::status(400, "Refresh token expired"));

        let err = arbiter(&backend, 1000).attempt_refresh("r1").await.unwrap_err();
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn test_refresh_server_error_is_transient() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::status(502, "Bad gateway"));

        let err = arbiter(&backend, 1000).attempt_refresh("r1").await.unwrap_err();
        assert!(!err.is_terminal());
    }

    #[tokio::test]
    async fn test_refresh_timeout_is_network_timeout() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::Hang);

        let arbiter = arbiter(&backend, 20);
        let err = arbiter.attempt_refresh("r1").await.unwrap_err();
        assert_eq!(err, AuthError::NetworkTimeout);
        assert!(!arbiter.is_in_flight());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::Ok(json!({
            "access": "a2", "refresh": "r2", "user": doctor_json()
        })));

        let arbiter = arbiter(&backend, 1000);
        let (first, second) = futures::join!(
            arbiter.attempt_refresh("r1"),
            arbiter.attempt_refresh("r1")
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(backend.refresh_calls(), 1);
        assert!(!arbiter.is_in_flight());
    }

    #[tokio::test]
    async fn test_sequential_attempts_are_not_coalesced() {
        let backend = Rc::new(ScriptedBackend::new());
        backend.set_refresh(Reply::status(503, "busy"));

        let arbiter = arbiter(&backend, 1000);
        let _ = arbiter.attempt_refresh("r1").await;
        let _ = arbiter.attempt_refresh("r1").await;
        assert_eq!(backend.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn test_with_deadline_returns_value_when_fast() {
        let value = with_deadline(&TokioTimer, Duration::from_secs(1), async { 7 }).await;
        assert_eq!(value, Some(7));
    }
}
