//! The session controller
//!
//! Detects a previous session from a readable cookie flag, silently refreshes
//! the access token, re-refreshes it on a timer, checks token expiry locally,
//! confirms the session with the backend once per fresh login, and performs
//! logout. Background failures are absorbed; only the user's own actions may
//! surface errors.

mod scheduler;
mod state;
mod token;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Client;
use serde::Deserialize;

use crate::config::SessionOptions;
use crate::cookie::{self, CookieSource};
use crate::error::Error;
use crate::fetch::Fetch;

pub use state::SessionState;

use scheduler::RefreshTimer;
use state::Store;
use token::TokenCheck;

/// Notifications delivered to the embedding application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stored token cannot be decoded and the user has to sign in again.
    /// Emitted once per corrupt credential; transient refresh failures stay
    /// silent.
    InvalidToken,

    /// Logout finished locally. `backend_notified` reports whether the
    /// backend answered the logout request at all.
    LoggedOut {
        /// Whether the logout request reached the backend
        backend_notified: bool,
    },
}

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Body of a successful refresh response
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Client-side authentication session controller.
///
/// Construct one per application root and share clones of it; all state
/// lives behind the controller and is read through snapshot getters.
/// Methods must be called from within a Tokio runtime.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use session_keeper::{MemoryCookies, SessionController};
///
/// let cookies = Arc::new(MemoryCookies::new("app_refresh_token=1"));
/// let controller = SessionController::new("https://api.example.com", cookies).unwrap();
/// assert!(!controller.session_checked());
/// ```
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    base_url: String,
    http_client: Client,
    cookies: Arc<dyn CookieSource>,
    options: SessionOptions,
    store: Store,
    timer: RefreshTimer,
    /// Latch marking a validate-session request as in flight. Lives outside
    /// the state store and is taken before the request task is spawned.
    validate_in_flight: AtomicBool,
    /// Whether the invalid-token notice went out for the current credential
    invalid_token_notified: AtomicBool,
    listeners: Mutex<Vec<Listener>>,
}

impl SessionController {
    /// Create a controller with default options
    pub fn new(base_url: &str, cookies: Arc<dyn CookieSource>) -> Result<Self, Error> {
        Self::new_with_options(base_url, cookies, SessionOptions::default())
    }

    /// Create a controller with custom options.
    ///
    /// Fails when `base_url` is empty or unparseable: a missing backend
    /// address is a broken deployment, not a runtime condition.
    pub fn new_with_options(
        base_url: &str,
        cookies: Arc<dyn CookieSource>,
        options: SessionOptions,
    ) -> Result<Self, Error> {
        if base_url.trim().is_empty() {
            return Err(Error::configuration("backend base URL is required"));
        }
        url::Url::parse(base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                base_url: base_url.trim_end_matches('/').to_string(),
                http_client,
                cookies,
                options,
                store: Store::default(),
                timer: RefreshTimer::default(),
                validate_in_flight: AtomicBool::new(false),
                invalid_token_notified: AtomicBool::new(false),
                listeners: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Detect and restore a previous session.
    ///
    /// Runs once; later calls return immediately. When the session-refresh
    /// cookie is present, a silent token refresh is attempted with the
    /// ambient cookie credential; its failure is logged and absorbed.
    /// [`session_checked`](Self::session_checked) is `true` afterwards no
    /// matter what happened.
    pub async fn start(&self) {
        let inner = &self.inner;
        if inner.store.snapshot().checked {
            return;
        }

        let header = inner.cookies.cookie_header();
        if cookie::has_marker(&header, &inner.options.cookie_marker) {
            match inner.fetch_refresh().await {
                Ok(token) => inner.store.update(|s| s.token = token),
                Err(err) => log::warn!("silent session refresh failed: {}", err),
            }
        } else {
            log::debug!("no session cookie found, skipping silent refresh");
        }

        // The checked milestone is reached on every path.
        inner.store.update(|s| s.checked = true);
        inner.react();
    }

    /// Stop background work. The controller stays usable;
    /// [`toggle_refresh`](Self::toggle_refresh) can re-arm the timer.
    /// Dropping the last controller clone also cancels the timer.
    pub fn stop(&self) {
        self.inner.timer.stop();
    }

    /// Current access token; empty when unauthenticated
    pub fn token(&self) -> String {
        self.inner.store.snapshot().token
    }

    /// Install a new access token, e.g. right after the user signed in
    pub fn set_token(&self, token: impl Into<String>) {
        self.inner.store.update(|s| s.token = token.into());
        self.inner.react();
    }

    /// Whether the startup session check has completed
    pub fn session_checked(&self) -> bool {
        self.inner.store.snapshot().checked
    }

    /// Whether the session came from the user signing in here
    pub fn explicit_login(&self) -> bool {
        self.inner.store.snapshot().explicit_login
    }

    /// Record whether the session came from the user signing in here.
    ///
    /// Passing `true` marks a fresh login and arms the one-shot server-side
    /// session validation.
    pub fn set_explicit_login(&self, value: bool) {
        self.inner.store.update(|s| {
            s.explicit_login = value;
            if value {
                s.just_logged_in = true;
            }
        });
        self.inner.react();
    }

    /// Whether the backend confirmed the session after the last fresh login
    pub fn session_valid(&self) -> bool {
        self.inner.store.snapshot().session_valid
    }

    /// Whether the current token passes the local expiry check
    pub fn token_valid(&self) -> bool {
        self.inner.store.snapshot().token_valid
    }

    /// Start (`true`) or stop (`false`) the recurring background refresh.
    ///
    /// Only an explicitly authenticated session may poll: when
    /// `explicit_login` is `false` at call time, starting is a no-op, so a
    /// passively restored session never arms background polling. Repeated
    /// starts cancel the previous timer first and never stack.
    pub fn toggle_refresh(&self, active: bool) {
        if !active {
            self.inner.timer.stop();
            return;
        }

        if !self.inner.store.snapshot().explicit_login {
            log::debug!("background refresh requested without explicit login, ignoring");
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        self.inner
            .timer
            .start(self.inner.options.refresh_interval, move || {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(inner) => {
                            inner.refresh_once().await;
                            true
                        }
                        None => false,
                    }
                }
            });
    }

    /// Log out.
    ///
    /// The backend is notified on a best-effort basis; whatever the outcome,
    /// the refresh timer stops, local state resets to unauthenticated (with
    /// `checked` still `true`), and a [`SessionEvent::LoggedOut`] is emitted.
    pub async fn log_out(&self) {
        let inner = &self.inner;
        inner.timer.stop();

        let url = inner.endpoint("/logout");
        let backend_notified = match Fetch::get(&inner.http_client, &url)
            .cookie_header(&inner.cookies.cookie_header())
            .execute_raw()
            .await
        {
            Ok(_) => true,
            Err(err) => {
                log::warn!("logout request failed: {}", err);
                false
            }
        };

        inner.store.update(|s| {
            *s = SessionState {
                checked: true,
                ..SessionState::default()
            };
        });
        inner.emit(&SessionEvent::LoggedOut { backend_notified });
    }

    /// Register a listener for [`SessionEvent`] notifications
    pub fn on_event<F>(&self, listener: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.lock().unwrap().push(Arc::new(listener));
    }
}

impl Inner {
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run the reactions that follow every state mutation: re-evaluate the
    /// token locally, then see whether the validation guard should fire.
    fn react(self: &Arc<Self>) {
        self.evaluate_token();
        self.maybe_validate();
    }

    fn evaluate_token(&self) {
        let snapshot = self.store.snapshot();
        if !snapshot.checked || snapshot.token.is_empty() {
            return;
        }

        match token::evaluate(&snapshot.token, token::now_millis()) {
            TokenCheck::Valid => {
                self.invalid_token_notified.store(false, Ordering::SeqCst);
                self.store.update(|s| s.token_valid = true);
            }
            TokenCheck::Expired | TokenCheck::WrongShape => {
                self.store.update(|s| s.token_valid = false);
            }
            TokenCheck::Undecodable => {
                self.store.update(|s| s.token_valid = false);
                if !self.invalid_token_notified.swap(true, Ordering::SeqCst) {
                    self.emit(&SessionEvent::InvalidToken);
                }
            }
        }
    }

    /// Fire the server-side validation when a fresh login has fully settled.
    ///
    /// The latch is taken in the synchronous mutation path, before the
    /// request task is spawned, so triggers that land while a validation is
    /// in flight collapse into that one request.
    fn maybe_validate(self: &Arc<Self>) {
        let snapshot = self.store.snapshot();
        let armed = snapshot.just_logged_in
            && snapshot.checked
            && !snapshot.token.is_empty()
            && snapshot.token_valid;
        if !armed {
            return;
        }

        if self
            .validate_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.validate_session().await;
        });
    }

    async fn validate_session(self: Arc<Self>) {
        // Read the token at send time, not at trigger time.
        let bearer = self.store.snapshot().token;
        let url = self.endpoint("/validatesession");
        let result = Fetch::post(&self.http_client, &url)
            .bearer_auth(&bearer)
            .cookie_header(&self.cookies.cookie_header())
            .execute_raw()
            .await;

        match result {
            Ok(response) => {
                let valid = response.status().is_success();
                self.store.update(|s| {
                    s.session_valid = valid;
                    s.just_logged_in = false;
                });
            }
            Err(err) => {
                log::warn!("session validation failed: {}", err);
                self.store.update(|s| {
                    s.session_valid = false;
                    s.just_logged_in = false;
                });
            }
        }

        // Released on every exit path.
        self.validate_in_flight.store(false, Ordering::SeqCst);
    }

    /// One scheduled refresh pass. Failures are logged and absorbed; a missed
    /// background refresh must never interrupt the user.
    async fn refresh_once(self: &Arc<Self>) {
        match self.fetch_refresh().await {
            Ok(token) => {
                self.store.update(|s| s.token = token);
                self.react();
            }
            Err(err) => log::warn!("background token refresh failed: {}", err),
        }
    }

    /// Exchange the ambient cookie credential for a fresh access token
    async fn fetch_refresh(&self) -> Result<String, Error> {
        let url = self.endpoint("/refresh");
        let body: RefreshResponse = Fetch::get(&self.http_client, &url)
            .cookie_header(&self.cookies.cookie_header())
            .execute()
            .await?;
        Ok(body.access_token)
    }

    fn emit(&self, event: &SessionEvent) {
        let listeners: Vec<Listener> = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener(event);
        }
    }
}
