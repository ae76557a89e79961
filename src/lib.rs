//! Client-side authentication session controller
//!
//! `session-keeper` keeps an application's login session alive: it detects a
//! previous session through a readable cookie flag, silently refreshes the
//! access token, re-refreshes it on a timer, checks token expiry locally,
//! confirms the session with the backend once per fresh login, and performs
//! logout.
//!
//! The local expiry check decodes the token without verifying its signature.
//! It is a UX short-circuit, not a security control: every protected backend
//! endpoint must verify the token on its own.

pub mod config;
pub mod cookie;
pub mod error;
pub mod fetch;
pub mod session;

pub use config::SessionOptions;
pub use cookie::{CookieSource, MemoryCookies};
pub use error::Error;
pub use session::{SessionController, SessionEvent, SessionState};

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::SessionOptions;
    pub use crate::cookie::{CookieSource, MemoryCookies};
    pub use crate::error::Error;
    pub use crate::session::{SessionController, SessionEvent};
}
