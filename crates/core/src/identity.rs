//! Identity resolution
//!
//! Maps the caller's principal onto the key its tokens are stored under.

use sessionward_domain::{Identity, Principal, Result, SessionwardError};

/// Resolve the store key for `principal` from the configured claim.
///
/// Anonymous principals have no identity (`Ok(None)`). An authenticated
/// principal that lacks the claim is a misconfiguration, never an anonymous
/// caller.
///
/// # Errors
/// Returns `SessionwardError::MissingIdentityClaim` when an authenticated
/// principal has no (non-empty) `claim_name` claim.
pub fn resolve_identity(principal: &Principal, claim_name: &str) -> Result<Option<Identity>> {
    if !principal.is_authenticated() {
        return Ok(None);
    }

    match principal.find_claim(claim_name) {
        Some(value) if !value.is_empty() => Ok(Some(Identity::new(value))),
        _ => Err(SessionwardError::MissingIdentityClaim { claim: claim_name.to_string() }),
    }
}
