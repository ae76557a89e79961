//! Local token expiry evaluation
//!
//! The check decodes the token payload without verifying its signature: it
//! only decides what the client shows while a request would fail anyway.
//! Every protected backend endpoint must verify the token independently.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Outcome of the local token check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenCheck {
    /// Decoded and not yet expired
    Valid,
    /// Decoded but `exp` is in the past
    Expired,
    /// Not three dot-separated segments; quietly treated as unusable
    WrongShape,
    /// Three segments, but the payload failed base64 or JSON decoding
    Undecodable,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

/// Current wall-clock time in milliseconds since the epoch
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as i64
}

/// Decode the payload of `token` and compare its `exp` claim against `now_ms`
pub(crate) fn evaluate(token: &str, now_ms: i64) -> TokenCheck {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return TokenCheck::WrongShape;
    }

    let payload = match URL_SAFE_NO_PAD.decode(segments[1]) {
        Ok(bytes) => bytes,
        Err(_) => return TokenCheck::Undecodable,
    };

    let claims: Claims = match serde_json::from_slice(&payload) {
        Ok(claims) => claims,
        Err(_) => return TokenCheck::Undecodable,
    };

    // exp is in integer seconds
    if claims.exp * 1000 > now_ms {
        TokenCheck::Valid
    } else {
        TokenCheck::Expired
    }
}
