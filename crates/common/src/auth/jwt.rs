//! Minimal JWT payload decoding
//!
//! The id token is only inspected for its `exp` claim so that a session whose
//! provider did not declare a lifetime can still be refreshed proactively.
//! Signatures are not verified: the token came straight from the provider over
//! TLS and is never trusted for authorization decisions here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decode the claims object of a compact-serialized JWT.
///
/// Returns `None` for anything that is not three dot-separated segments with a
/// base64url JSON object in the middle.
#[must_use]
pub fn decode_claims(token: &str) -> Option<serde_json::Map<String, Value>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    // Some issuers pad their segments even though RFC 7515 says not to.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Expiry declared by the token's `exp` claim (seconds since the epoch).
#[must_use]
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_claims(token)?.get("exp")?.clone();
    let seconds = match exp {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::jwt.
    use super::*;

    fn encode(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.signature")
    }

    /// Validates `decode_expiry` for a well-formed token.
    ///
    /// Assertions:
    /// - Confirms the decoded expiry equals the `exp` timestamp.
    #[test]
    fn test_decode_expiry_reads_exp_claim() {
        let token = encode(r#"{"sub":"user-1","exp":1700000000}"#);

        let expiry = decode_expiry(&token);

        assert_eq!(expiry, DateTime::from_timestamp(1_700_000_000, 0));
    }

    /// Validates that a padded payload segment is still accepted.
    #[test]
    fn test_decode_expiry_tolerates_padding() {
        let token = encode(r#"{"exp":1700000000}"#);
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[1].push_str("==");

        assert!(decode_expiry(&parts.join(".")).is_some());
    }

    /// Validates `decode_expiry` returns `None` when no usable `exp` exists.
    ///
    /// Assertions:
    /// - Missing claim, string claim, non-JWT input and garbage payloads all
    ///   yield `None`.
    #[test]
    fn test_decode_expiry_unknown_cases() {
        assert!(decode_expiry(&encode(r#"{"sub":"user-1"}"#)).is_none());
        assert!(decode_expiry(&encode(r#"{"exp":"tomorrow"}"#)).is_none());
        assert!(decode_expiry("opaque-access-token").is_none());
        assert!(decode_expiry("a.!!!.c").is_none());
        assert!(decode_expiry(&encode("[1,2,3]")).is_none());
    }

    /// Validates that four-segment (JWE-like) inputs are rejected.
    #[test]
    fn test_decode_claims_rejects_extra_segments() {
        let token = format!("{}.extra", encode(r#"{"exp":1}"#));
        assert!(decode_claims(&token).is_none());
    }
}
