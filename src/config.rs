//! Configuration options for the session controller

use std::time::Duration;

/// Configuration options for the session controller
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Period between scheduled background token refreshes
    pub refresh_interval: Duration,

    /// The request timeout applied to the HTTP client
    pub request_timeout: Option<Duration>,

    /// Substring that marks a cookie, by name, as the session-refresh flag
    pub cookie_marker: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(600),
            request_timeout: Some(Duration::from_secs(30)),
            cookie_marker: "refresh".to_string(),
        }
    }
}

impl SessionOptions {
    /// Set the period between scheduled background token refreshes
    pub fn with_refresh_interval(mut self, value: Duration) -> Self {
        self.refresh_interval = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the substring that marks a cookie as the session-refresh flag
    pub fn with_cookie_marker(mut self, value: &str) -> Self {
        self.cookie_marker = value.to_string();
        self
    }
}
