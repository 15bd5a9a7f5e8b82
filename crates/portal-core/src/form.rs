//! The booking-ID login form.
//!
//! [`LoginForm`] owns the field value, the submission state machine and the
//! verified-email banner. It is a cheap handle: clones share state, so the
//! banner timer task and the caller see the same form.
//!
//! ```text
//!   Idle ──submit(valid)──▶ Submitting ──success──▶ Succeeded (navigates)
//!    ▲  └─submit(invalid)─▶ Failed ◀──failure/transport──┘
//!    └──────input────────────┘
//! ```
//!
//! A form also carries a lifetime. [`LoginForm::teardown`] ends it: the
//! banner timer is cancelled and a login still in flight is abandoned, so
//! nothing writes to a form that is gone.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use portal_storage::StorageBackend;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{LoginResult, PortalApi};
use crate::booking::{self, BookingId};
use crate::error::{LoginError, LoginKind};
use crate::navigation::{DASHBOARD_PATH, Navigator};
use crate::session;

/// How long the verified-email banner stays up.
pub const VERIFIED_BANNER_TTL: Duration = Duration::from_secs(10);

/// Submit button label while idle.
pub const SUBMIT_LABEL: &str = "Access Account";

/// Submit button label while a login is in flight.
pub const SUBMITTING_LABEL: &str = "Authenticating...";

/// Title of the error alert.
pub const ERROR_TITLE: &str = "Login Failed";

/// Title of the verified-email banner.
pub const BANNER_TITLE: &str = "Email Verified";

/// Body of the verified-email banner.
pub const BANNER_TEXT: &str = "Your email was verified successfully. You can now log in.";

/// Where a login attempt stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginPhase {
    /// Waiting for input or a submit.
    #[default]
    Idle,
    /// One login request is in flight.
    Submitting,
    /// Logged in and navigated away. Terminal.
    Succeeded,
    /// The last attempt failed. Accepts input and resubmission like `Idle`.
    Failed(LoginError),
}

impl LoginPhase {
    /// True exactly while a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Whether a submit would be accepted now.
    #[must_use]
    pub fn accepts_submit(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&LoginError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// What a call to submit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Logged in; navigation to the dashboard happened.
    Redirected,
    /// The attempt failed; the form now shows this error.
    Rejected(LoginError),
    /// Ignored because a login is in flight or already succeeded.
    Busy,
    /// The form was torn down first; the response, if any, was discarded.
    Abandoned,
}

/// What a renderer needs to draw the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginView {
    pub booking_id: String,
    pub loading: bool,
    pub submit_label: &'static str,
    pub submit_disabled: bool,
    pub error: Option<String>,
    pub banner_visible: bool,
}

#[derive(Debug, Default)]
struct FormState {
    booking_id: String,
    phase: LoginPhase,
    banner_visible: bool,
    banner_generation: u64,
    bootstrapped: bool,
}

struct Inner {
    api: Arc<dyn PortalApi>,
    durable: Arc<dyn StorageBackend>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<FormState>,
    lifetime: watch::Sender<bool>,
}

/// The login form controller.
#[derive(Clone)]
pub struct LoginForm {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    /// Create an idle, empty form.
    ///
    /// `durable` receives the client record on success; `navigator` performs
    /// the redirect.
    #[must_use]
    pub fn new(
        api: Arc<dyn PortalApi>,
        durable: Arc<dyn StorageBackend>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (lifetime, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                api,
                durable,
                navigator,
                state: Mutex::new(FormState::default()),
                lifetime,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FormState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed the field's new raw value through the normalizer.
    ///
    /// Returns `false` when the update was dropped for being too long. An
    /// accepted update clears a displayed error. Input is ignored while a
    /// login is in flight or after success.
    pub fn input(&self, raw: &str) -> bool {
        let mut state = self.state();
        if !state.phase.accepts_submit() {
            return false;
        }
        let Some(value) = booking::accept_input(raw) else {
            debug!(len = raw.len(), "dropped overlong booking id input");
            return false;
        };
        state.booking_id = value;
        state.phase = LoginPhase::Idle;
        true
    }

    /// The current field value.
    pub fn booking_id(&self) -> String {
        self.state().booking_id.clone()
    }

    pub fn phase(&self) -> LoginPhase {
        self.state().phase.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().phase.is_loading()
    }

    /// The message in the error alert, if one is showing.
    pub fn error_message(&self) -> Option<String> {
        self.state().phase.error().map(ToString::to_string)
    }

    pub fn banner_visible(&self) -> bool {
        self.state().banner_visible
    }

    /// A snapshot for rendering.
    pub fn view(&self) -> LoginView {
        let state = self.state();
        let loading = state.phase.is_loading();
        LoginView {
            booking_id: state.booking_id.clone(),
            loading,
            submit_label: if loading { SUBMITTING_LABEL } else { SUBMIT_LABEL },
            submit_disabled: !state.phase.accepts_submit(),
            error: state.phase.error().map(ToString::to_string),
            banner_visible: state.banner_visible,
        }
    }

    /// Submit the field value.
    ///
    /// Validation failures never reach the API. A valid identifier issues
    /// exactly one login request.
    pub async fn submit(&self) -> SubmitOutcome {
        if self.is_torn_down() {
            return SubmitOutcome::Abandoned;
        }
        let booking_id = {
            let mut state = self.state();
            if !state.phase.accepts_submit() {
                debug!(phase = ?state.phase, "submit ignored");
                return SubmitOutcome::Busy;
            }
            match BookingId::parse(&state.booking_id) {
                Ok(id) => {
                    state.phase = LoginPhase::Submitting;
                    id
                }
                Err(err) => {
                    debug!(error = %err, "booking id failed validation");
                    state.phase = LoginPhase::Failed(err.clone());
                    return SubmitOutcome::Rejected(err);
                }
            }
        };

        info!(booking_id = %booking_id, "submitting login");
        self.authenticate(booking_id.as_str(), None, LoginKind::Standard)
            .await
    }

    /// Log in on a client's behalf with an administrator's token.
    ///
    /// The identifier is sent as given; it never passes through the field.
    pub async fn submit_impersonated(&self, booking_id: &str, token: &str) -> SubmitOutcome {
        if self.is_torn_down() {
            return SubmitOutcome::Abandoned;
        }
        {
            let mut state = self.state();
            if !state.phase.accepts_submit() {
                debug!(phase = ?state.phase, "impersonated submit ignored");
                return SubmitOutcome::Busy;
            }
            state.phase = LoginPhase::Submitting;
        }

        info!(booking_id, "submitting impersonated login");
        self.authenticate(booking_id, Some(token), LoginKind::Impersonated)
            .await
    }

    async fn authenticate(
        &self,
        booking_id: &str,
        token: Option<&str>,
        kind: LoginKind,
    ) -> SubmitOutcome {
        let mut lifetime = self.inner.lifetime.subscribe();
        let response = tokio::select! {
            biased;
            () = lifetime_ended(&mut lifetime) => {
                info!(booking_id, "form torn down with login in flight; discarding response");
                return SubmitOutcome::Abandoned;
            }
            response = self.inner.api.login(booking_id, token) => response,
        };

        match response.map(LoginResult::from) {
            Ok(LoginResult::Success { client }) => {
                session::persist_client(self.inner.durable.as_ref(), client.as_ref()).await;
                self.state().phase = LoginPhase::Succeeded;
                info!(booking_id, ?kind, "login succeeded; redirecting");
                self.inner.navigator.navigate(DASHBOARD_PATH);
                SubmitOutcome::Redirected
            }
            Ok(LoginResult::Failure { message }) => {
                let err = LoginError::rejected(kind, message);
                info!(booking_id, error = %err, "login refused");
                self.fail(err)
            }
            Err(e) => {
                warn!(booking_id, error = %e, "login request failed");
                self.fail(LoginError::TransportFailure { kind })
            }
        }
    }

    fn fail(&self, err: LoginError) -> SubmitOutcome {
        self.state().phase = LoginPhase::Failed(err.clone());
        SubmitOutcome::Rejected(err)
    }

    /// Show the verified-email banner and pre-fill the field.
    ///
    /// The banner hides itself [`VERIFIED_BANNER_TTL`] after the most recent
    /// call unless the form is torn down first. Must be called inside a Tokio
    /// runtime.
    pub fn show_verified_banner(&self, booking_id: &str) {
        let generation = {
            let mut state = self.state();
            state.banner_visible = true;
            state.banner_generation += 1;
            if let Some(value) = booking::accept_input(booking_id) {
                state.booking_id = value;
            }
            state.banner_generation
        };

        let form = self.clone();
        let mut lifetime = self.inner.lifetime.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(VERIFIED_BANNER_TTL) => {
                    let mut state = form.state();
                    // A later show owns the banner now.
                    if state.banner_generation == generation {
                        state.banner_visible = false;
                        debug!("verified banner dismissed");
                    }
                }
                () = lifetime_ended(&mut lifetime) => {
                    debug!("verified banner timer cancelled");
                }
            }
        });
    }

    /// Mark the page-load bootstrap as done. Returns `false` if it already ran.
    pub(crate) fn begin_bootstrap(&self) -> bool {
        let mut state = self.state();
        !std::mem::replace(&mut state.bootstrapped, true)
    }

    /// End the form's lifetime: cancel timers and abandon in-flight logins.
    pub fn teardown(&self) {
        self.inner.lifetime.send_replace(true);
        debug!("login form torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        *self.inner.lifetime.borrow()
    }
}

/// Resolves once the form is torn down (or its sender is gone).
async fn lifetime_ended(lifetime: &mut watch::Receiver<bool>) {
    let _ = lifetime.wait_for(|closed| *closed).await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::LoginResponse;
    use crate::error::ApiError;
    use crate::navigation::RecordingNavigator;
    use crate::session::USER_DATA_KEY;
    use crate::testing::{CountingStorage, FailingStorage, LoginCall, ScriptedApi};

    struct Fixture {
        api: Arc<ScriptedApi>,
        storage: Arc<CountingStorage>,
        nav: Arc<RecordingNavigator>,
        form: LoginForm,
    }

    fn fixture(api: ScriptedApi) -> Fixture {
        let api = Arc::new(api);
        let storage = Arc::new(CountingStorage::new());
        let nav = Arc::new(RecordingNavigator::new());
        let form = LoginForm::new(api.clone(), storage.clone(), nav.clone());
        Fixture {
            api,
            storage,
            nav,
            form,
        }
    }

    #[test]
    fn input_normalizes_and_drops_overlong_updates() {
        let f = fixture(ScriptedApi::new());
        assert!(f.form.input("wme-1234x"));
        assert_eq!(f.form.booking_id(), "WME1234X");

        assert!(!f.form.input("WME1234XY"));
        assert_eq!(f.form.booking_id(), "WME1234X");
    }

    #[tokio::test]
    async fn empty_submit_never_calls_api() {
        let f = fixture(ScriptedApi::new());
        let outcome = f.form.submit().await;

        assert_eq!(outcome, SubmitOutcome::Rejected(LoginError::EmptyInput));
        assert_eq!(
            f.form.error_message().as_deref(),
            Some("Please enter your Booking ID")
        );
        assert!(f.api.login_calls().is_empty());
    }

    #[tokio::test]
    async fn short_submit_is_invalid_shape() {
        let f = fixture(ScriptedApi::new());
        f.form.input("abc123");
        let outcome = f.form.submit().await;

        assert_eq!(outcome, SubmitOutcome::Rejected(LoginError::InvalidShape));
        assert!(f.api.login_calls().is_empty());
        assert_eq!(f.form.phase(), LoginPhase::Failed(LoginError::InvalidShape));
    }

    #[tokio::test]
    async fn input_clears_displayed_error() {
        let f = fixture(ScriptedApi::new());
        f.form.submit().await;
        assert!(f.form.error_message().is_some());

        f.form.input("a");
        assert_eq!(f.form.error_message(), None);
        assert_eq!(f.form.phase(), LoginPhase::Idle);
    }

    #[tokio::test]
    async fn valid_submit_sends_normalized_id_once() {
        let client = json!({ "bookingId": "WME1234X", "name": "Ada" });
        let f = fixture(ScriptedApi::new().with_login(Ok(LoginResponse::accepted(client.clone()))));

        f.form.input("wme1234X");
        let outcome = f.form.submit().await;

        assert_eq!(outcome, SubmitOutcome::Redirected);
        assert_eq!(
            f.api.login_calls(),
            vec![LoginCall {
                booking_id: "WME1234X".to_owned(),
                token: None,
            }]
        );
        assert_eq!(f.storage.puts(), 1);
        assert_eq!(
            f.storage.get(USER_DATA_KEY).await.unwrap(),
            Some(client.to_string())
        );
        assert_eq!(f.nav.visited(), vec![DASHBOARD_PATH.to_owned()]);
        assert_eq!(f.form.phase(), LoginPhase::Succeeded);
    }

    #[tokio::test]
    async fn success_is_terminal() {
        let f = fixture(ScriptedApi::new().with_login(Ok(LoginResponse::accepted(json!({})))));
        f.form.input("ABCD1234");
        f.form.submit().await;

        assert_eq!(f.form.submit().await, SubmitOutcome::Busy);
        assert!(!f.form.input("X"));
        assert_eq!(f.api.login_calls().len(), 1);
        assert_eq!(f.nav.visited().len(), 1);
    }

    #[tokio::test]
    async fn refusal_uses_server_reason_or_fallback() {
        let f = fixture(
            ScriptedApi::new()
                .with_login(Ok(LoginResponse::refused(Some("Booking not found"))))
                .with_login(Ok(LoginResponse::refused(None))),
        );
        f.form.input("ABCD1234");

        assert_eq!(
            f.form.submit().await,
            SubmitOutcome::Rejected(LoginError::RemoteRejection("Booking not found".to_owned()))
        );
        // Failed returns to an idle-like state; resubmission is allowed.
        assert_eq!(
            f.form.submit().await,
            SubmitOutcome::Rejected(LoginError::RemoteRejection("Login failed".to_owned()))
        );
        assert_eq!(f.api.login_calls().len(), 2);
        assert!(f.nav.visited().is_empty());
        assert_eq!(f.storage.puts(), 0);
    }

    #[tokio::test]
    async fn transport_error_is_generic() {
        let f = fixture(ScriptedApi::new().with_login(Err(ApiError::Timeout)));
        f.form.input("ABCD1234");

        f.form.submit().await;
        assert_eq!(
            f.form.error_message().as_deref(),
            Some("An unexpected error occurred")
        );
        assert!(!f.form.is_loading());
    }

    #[tokio::test]
    async fn storage_failure_does_not_block_redirect() {
        let api = Arc::new(ScriptedApi::new().with_login(Ok(LoginResponse::accepted(json!({})))));
        let nav = Arc::new(RecordingNavigator::new());
        let form = LoginForm::new(api, Arc::new(FailingStorage::new()), nav.clone());

        form.input("ABCD1234");
        assert_eq!(form.submit().await, SubmitOutcome::Redirected);
        assert_eq!(nav.last().as_deref(), Some(DASHBOARD_PATH));
    }

    #[tokio::test]
    async fn double_submit_keeps_one_request_outstanding() {
        let f = fixture(
            ScriptedApi::new()
                .holding_logins()
                .with_login(Ok(LoginResponse::refused(Some("nope")))),
        );
        f.form.input("ABCD1234");

        let first = tokio::spawn({
            let form = f.form.clone();
            async move { form.submit().await }
        });
        while f.api.login_calls().is_empty() {
            tokio::task::yield_now().await;
        }

        let view = f.form.view();
        assert!(view.loading);
        assert!(view.submit_disabled);
        assert_eq!(view.submit_label, SUBMITTING_LABEL);

        assert_eq!(f.form.submit().await, SubmitOutcome::Busy);
        assert_eq!(f.api.login_calls().len(), 1);

        f.api.release_login();
        assert!(matches!(
            first.await.unwrap(),
            SubmitOutcome::Rejected(LoginError::RemoteRejection(_))
        ));
        assert_eq!(f.form.view().submit_label, SUBMIT_LABEL);
        assert_eq!(f.api.login_calls().len(), 1);
    }

    #[tokio::test]
    async fn teardown_abandons_in_flight_login() {
        let f = fixture(
            ScriptedApi::new()
                .holding_logins()
                .with_login(Ok(LoginResponse::accepted(json!({})))),
        );
        f.form.input("ABCD1234");

        let pending = tokio::spawn({
            let form = f.form.clone();
            async move { form.submit().await }
        });
        while f.api.login_calls().is_empty() {
            tokio::task::yield_now().await;
        }

        f.form.teardown();
        assert_eq!(pending.await.unwrap(), SubmitOutcome::Abandoned);
        assert_eq!(f.storage.puts(), 0);
        assert!(f.nav.visited().is_empty());
    }

    #[tokio::test]
    async fn impersonated_login_carries_token_and_own_messages() {
        let f = fixture(
            ScriptedApi::new()
                .with_login(Ok(LoginResponse::refused(Some("expired"))))
                .with_login(Err(ApiError::Transport {
                    reason: "connection reset".to_owned(),
                })),
        );

        f.form.submit_impersonated("abc12345", "tok-1").await;
        assert_eq!(
            f.form.error_message().as_deref(),
            Some("Impersonation login failed.")
        );

        f.form.submit_impersonated("abc12345", "tok-1").await;
        assert_eq!(
            f.form.error_message().as_deref(),
            Some("An error occurred during impersonation login.")
        );

        let calls = f.api.login_calls();
        assert_eq!(calls[0].booking_id, "abc12345");
        assert_eq!(calls[0].token.as_deref(), Some("tok-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn banner_dismisses_after_ten_seconds() {
        let f = fixture(ScriptedApi::new());
        f.form.show_verified_banner("ABC12345");
        assert!(f.form.banner_visible());
        assert_eq!(f.form.booking_id(), "ABC12345");

        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert!(f.form.banner_visible());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!f.form.banner_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_banner_restarts_the_countdown() {
        let f = fixture(ScriptedApi::new());
        f.form.show_verified_banner("ABC12345");

        tokio::time::sleep(Duration::from_secs(8)).await;
        f.form.show_verified_banner("ABC12345");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(f.form.banner_visible());

        tokio::time::sleep(Duration::from_millis(7_100)).await;
        assert!(!f.form.banner_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_banner_timer() {
        let f = fixture(ScriptedApi::new());
        f.form.show_verified_banner("ABC12345");

        tokio::time::sleep(Duration::from_secs(5)).await;
        f.form.teardown();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(f.form.banner_visible());
        assert!(f.form.is_torn_down());
    }

    #[tokio::test]
    async fn teardown_wins_over_a_ready_response() {
        let f = fixture(ScriptedApi::new().with_login(Ok(LoginResponse::accepted(json!({})))));
        f.form.teardown();

        let outcome = f
            .form
            .authenticate("ABCD1234", None, LoginKind::Standard)
            .await;
        assert_eq!(outcome, SubmitOutcome::Abandoned);
        assert_eq!(f.storage.puts(), 0);
        assert!(f.nav.visited().is_empty());
    }

    #[tokio::test]
    async fn input_is_ignored_while_submitting() {
        let f = fixture(
            ScriptedApi::new()
                .holding_logins()
                .with_login(Ok(LoginResponse::refused(Some("nope")))),
        );
        f.form.input("ABCD1234");

        let pending = tokio::spawn({
            let form = f.form.clone();
            async move { form.submit().await }
        });
        while f.api.login_calls().is_empty() {
            tokio::task::yield_now().await;
        }

        assert!(!f.form.input("WXYZ9876"));
        assert_eq!(f.form.booking_id(), "ABCD1234");
        assert!(f.form.is_loading());

        f.api.release_login();
        pending.await.unwrap();
        assert!(f.form.input("WXYZ9876"));
    }

    #[tokio::test]
    async fn submit_after_teardown_is_abandoned() {
        let f = fixture(ScriptedApi::new());
        f.form.input("ABCD1234");
        f.form.teardown();
        assert_eq!(f.form.submit().await, SubmitOutcome::Abandoned);
        assert!(f.api.login_calls().is_empty());
        assert_eq!(f.form.phase(), LoginPhase::Idle);
    }
}
