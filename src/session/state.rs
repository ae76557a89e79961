//! Session state owned by the controller

use std::sync::RwLock;

/// The authoritative session fields
///
/// Handed out to callers only as a snapshot copy; all writes go through the
/// controller's operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current access token; empty when unauthenticated
    pub token: String,

    /// Whether the session came from the user actively signing in here,
    /// as opposed to being silently restored from a cookie
    pub explicit_login: bool,

    /// Whether the startup session check has completed. Flips to `true` once
    /// and never reverts, including after logout.
    pub checked: bool,

    /// Whether the backend confirmed the session after a fresh login
    pub session_valid: bool,

    /// Whether the current token passes the local expiry check
    pub token_valid: bool,

    /// Raised by a fresh explicit login, consumed by the validation guard
    pub just_logged_in: bool,
}

/// State store with copy-out reads and merge-style updates
#[derive(Debug, Default)]
pub(crate) struct Store {
    state: RwLock<SessionState>,
}

impl Store {
    /// A copy of the current state.
    ///
    /// Asynchronous continuations must call this again after an `.await`
    /// instead of reusing a copy taken before the suspension.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    /// Apply `f` to the state under the write lock. Fields `f` does not touch
    /// keep their values.
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let mut guard = self.state.write().unwrap();
        f(&mut guard);
    }
}
