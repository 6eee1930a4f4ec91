//! Decode-only JWT inspection.
//!
//! The payload is read without verifying the signature: the client never
//! holds the signing key, so these helpers only drive UI timing and renewal.
//! Authorization decisions stay on the server.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the epoch. NumericDate may carry a fraction.
    pub exp: f64,
}

impl Claims {
    /// Whole seconds of `exp`, saturating at the `i64` range
    pub fn exp_secs(&self) -> i64 {
        self.exp.floor() as i64
    }
}

/// Decode the payload segment. `None` on any malformed input.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!("Token does not have three segments");
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .map_err(|e| tracing::debug!("Token payload is not base64url: {}", e))
        .ok()?;

    serde_json::from_slice(&bytes)
        .map_err(|e| tracing::debug!("Token payload is not valid claims JSON: {}", e))
        .ok()
}

/// True when `exp` has passed or the token cannot be decoded
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode_claims(token) {
        Some(claims) => claims.exp_secs() <= now.timestamp(),
        None => true,
    }
}

/// Whole minutes until expiry, 0 when expired or undecodable
pub fn time_remaining_minutes(token: &str) -> i64 {
    time_remaining_minutes_at(token, Utc::now())
}

pub fn time_remaining_minutes_at(token: &str, now: DateTime<Utc>) -> i64 {
    decode_claims(token)
        .map(|claims| claims.exp_secs().saturating_sub(now.timestamp()).max(0) / 60)
        .unwrap_or(0)
}
