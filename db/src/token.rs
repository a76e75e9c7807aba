//! Rotating check-in token codec.
//!
//! A token is the pair `session_id:mint_millis`, regenerated by the presenter
//! view every [`ROTATION_MS`] and accepted for [`VALIDITY_MS`] after minting.
//! Tokens are never persisted; validity is purely a function of the clock
//! handed in by the caller.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// How often the presenter view re-mints the displayed token.
pub const ROTATION_MS: i64 = 5_000;

/// Maximum accepted age of a token, measured from its mint time.
pub const VALIDITY_MS: i64 = 7_000;

/// Why a presented token was rejected. The two reasons map to distinct
/// user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Invalid code format")]
    Malformed,
    #[error("Code has expired, scan the live code")]
    Expired,
}

/// Encodes a fresh token for `session_id` minted at `now`.
pub fn mint(session_id: i64, now: DateTime<Utc>) -> String {
    format!("{}:{}", session_id, now.timestamp_millis())
}

/// Decodes and validates a presented token against `now`.
///
/// A token must have exactly two `:`-separated integer fields and be no older
/// than [`VALIDITY_MS`]. Tokens stamped in the future are not rejected; only
/// age beyond the window counts as expiry.
pub fn verify(raw: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
    let raw = raw.trim();
    let mut parts = raw.split(':');
    let (Some(id), Some(ts), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(TokenError::Malformed);
    };

    let session_id: i64 = id.parse().map_err(|_| TokenError::Malformed)?;
    let minted_ms: i64 = ts.parse().map_err(|_| TokenError::Malformed)?;

    if now.timestamp_millis() - minted_ms > VALIDITY_MS {
        return Err(TokenError::Expired);
    }

    Ok(session_id)
}
