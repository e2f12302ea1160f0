//! Expiry claim decoding for JWT-style auth tokens

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

/// Read the `exp` claim (epoch seconds) from a `header.payload.signature` token
///
/// Returns `None` if the token does not have three segments, the payload is
/// not base64url JSON, or `exp` is missing or not a number.
pub fn decode_expiry_claim(token: &str) -> Option<i64> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    match claims.get("exp")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// Whether `token` is expired at `now_millis`
///
/// Fails safe: anything unparsable counts as expired.
pub fn token_expired_at(token: &str, now_millis: i64) -> bool {
    match decode_expiry_claim(token) {
        Some(exp_seconds) => exp_seconds.saturating_mul(1000) <= now_millis,
        None => true,
    }
}
