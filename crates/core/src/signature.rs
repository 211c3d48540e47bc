//! Slack request signing (`v0` scheme).
//!
//! Slack signs every webhook with `HMAC-SHA256(signing_secret, "v0:" + timestamp + ":" + body)`
//! and sends the hex digest as `X-Slack-Signature: v0=<hex>` next to
//! `X-Slack-Request-Timestamp: <unix seconds>`. A request is authentic when the digest matches
//! and the timestamp lies within [`REPLAY_WINDOW_SECS`] of the verifier's clock.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const REPLAY_WINDOW_SECS: i64 = 120;

const VERSION: &str = "v0";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing request timestamp header")]
    MissingTimestamp,
    #[error("missing request signature header")]
    MissingSignature,
    #[error("request timestamp `{0}` is not a unix timestamp")]
    InvalidTimestamp(String),
    #[error("request timestamp is {delta_secs}s away from now")]
    Stale { delta_secs: i64 },
    #[error("request signature does not match")]
    Mismatch,
}

/// Returns `true` only for a fresh request whose signature matches `raw_body`.
pub fn verify(
    secret: &[u8],
    timestamp_header: Option<&str>,
    signature_header: Option<&str>,
    raw_body: &[u8],
    now: i64,
) -> bool {
    verify_detailed(secret, timestamp_header, signature_header, raw_body, now).is_ok()
}

/// Same check as [`verify`], reporting why a request was refused. On success the signed
/// timestamp's distance from `now` is returned.
pub fn verify_detailed(
    secret: &[u8],
    timestamp_header: Option<&str>,
    signature_header: Option<&str>,
    raw_body: &[u8],
    now: i64,
) -> Result<i64, SignatureError> {
    let timestamp = timestamp_header.ok_or(SignatureError::MissingTimestamp)?.trim();
    let signature = signature_header.ok_or(SignatureError::MissingSignature)?.trim();

    let signed_at = timestamp
        .parse::<i64>()
        .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_owned()))?;

    // Cheap rejection before the digest is computed.
    let delta_secs = now.saturating_sub(signed_at);
    if delta_secs.saturating_abs() > REPLAY_WINDOW_SECS {
        return Err(SignatureError::Stale { delta_secs });
    }

    let expected = sign(secret, timestamp, raw_body);
    if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        Ok(delta_secs)
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Computes the `v0=<hex>` signature Slack would send for `raw_body` at `timestamp`.
pub fn sign(secret: &[u8], timestamp: &str, raw_body: &[u8]) -> String {
    // HMAC accepts keys of any length; an empty result can never match a header.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return String::new();
    };
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);
    format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes()))
}

/// Length is not secret; the content comparison never short-circuits.
pub fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len() && bool::from(left.ct_eq(right))
}
