//! Client-readable cookie access
//!
//! The session-refresh cookie is a flag that a login was previously
//! established; it carries no credential itself. Embedders supply whatever
//! cookie jar their platform has through the [`CookieSource`] trait.

use std::sync::RwLock;

/// Source of the cookie header visible to the client
pub trait CookieSource: Send + Sync {
    /// The raw `Cookie` header value, e.g. `"theme=dark; app_refresh=1"`.
    /// An empty string means no cookies are visible.
    fn cookie_header(&self) -> String;
}

/// In-memory [`CookieSource`] for embedders without a platform cookie jar
#[derive(Debug, Default)]
pub struct MemoryCookies {
    header: RwLock<String>,
}

impl MemoryCookies {
    /// Create a source holding the given `Cookie` header value
    pub fn new(header: &str) -> Self {
        Self {
            header: RwLock::new(header.to_string()),
        }
    }

    /// Replace the stored `Cookie` header value
    pub fn set(&self, header: &str) {
        *self.header.write().unwrap() = header.to_string();
    }
}

impl CookieSource for MemoryCookies {
    fn cookie_header(&self) -> String {
        self.header.read().unwrap().clone()
    }
}

/// True when any cookie *name* in `header` contains `marker`
pub(crate) fn has_marker(header: &str, marker: &str) -> bool {
    header
        .split(';')
        .filter_map(|pair| pair.split('=').next())
        .any(|name| name.trim().contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_matches_cookie_name() {
        assert!(has_marker("app_refresh_token=1", "refresh"));
        assert!(has_marker("theme=dark; app_refresh_token=1", "refresh"));
    }

    #[test]
    fn test_marker_ignores_cookie_values() {
        assert!(!has_marker("session_id=app_refresh_token", "refresh"));
    }

    #[test]
    fn test_empty_header_has_no_marker() {
        assert!(!has_marker("", "refresh"));
    }

    #[test]
    fn test_memory_cookies_roundtrip() {
        let cookies = MemoryCookies::new("a=1");
        assert_eq!(cookies.cookie_header(), "a=1");
        cookies.set("a=1; b=2");
        assert_eq!(cookies.cookie_header(), "a=1; b=2");
    }
}
