//! Error handling for the session controller

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Unified error type for session operations
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP transport errors
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("server returned {status}: {body}")]
    Server {
        /// HTTP status code of the response
        status: StatusCode,
        /// Response body, for diagnostics
        body: String,
    },

    /// The backend answered 2xx but the body did not match the contract
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Base URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid controller configuration, detected at construction
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create a new server error from a status and response body
    pub fn server(status: StatusCode, body: impl Into<String>) -> Self {
        Error::Server {
            status,
            body: body.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration<T: fmt::Display>(msg: T) -> Self {
        Error::Configuration(msg.to_string())
    }
}
