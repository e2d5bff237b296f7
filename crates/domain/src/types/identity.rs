//! Identity keys and the principals they are derived from

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque key under which a session's tokens are stored.
///
/// Derived from a configured claim (usually `sub`) on the caller's principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single claim asserted about a principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

impl Claim {
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self { kind: kind.into(), value: value.into() }
    }
}

/// The caller as seen by the hosting web layer.
///
/// An anonymous principal never carries claims that matter; an authenticated
/// one must carry the configured identifier claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Principal {
    /// Principal for a caller that has not signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Principal for a signed-in caller.
    #[must_use]
    pub fn authenticated(claims: Vec<Claim>) -> Self {
        Self { authenticated: true, claims }
    }

    /// Add a claim (builder style).
    #[must_use]
    pub fn with_claim(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(kind, value));
        self
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First value of the claim with the given kind. Claim kinds compare
    /// case-sensitively, as JWT claim names do.
    #[must_use]
    pub fn find_claim(&self, kind: &str) -> Option<&str> {
        self.claims.iter().find(|claim| claim.kind == kind).map(|claim| claim.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_claim_returns_first_match() {
        let principal = Principal::authenticated(vec![
            Claim::new("email", "ada@example.com"),
            Claim::new("sub", "user-1"),
            Claim::new("sub", "user-2"),
        ]);

        assert_eq!(principal.find_claim("sub"), Some("user-1"));
        assert_eq!(principal.find_claim("SUB"), None);
    }

    #[test]
    fn anonymous_principal_is_not_authenticated() {
        let principal = Principal::anonymous();

        assert!(!principal.is_authenticated());
        assert!(principal.claims().is_empty());
    }

    #[test]
    fn identity_serializes_as_plain_string() {
        let identity = Identity::new("user-1");

        assert_eq!(serde_json::to_string(&identity).unwrap(), "\"user-1\"");
        assert_eq!(identity.to_string(), "user-1");
    }
}
