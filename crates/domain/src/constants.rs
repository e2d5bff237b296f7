//! Domain constants
//!
//! Defaults for the configuration surface. Values mirror what the identity
//! providers we integrate with expect out of the box.

/// Tokens are treated as stale this many minutes before their declared expiry.
pub const DEFAULT_CLOCK_SKEW_MINUTES: i64 = 5;

/// Largest accepted clock-skew margin (one day).
pub const MAX_CLOCK_SKEW_MINUTES: i64 = 24 * 60;

/// Claim used as the identity key when none is configured.
pub const DEFAULT_USER_IDENTIFIER_CLAIM: &str = "sub";

/// Upper bound for a single refresh or revocation exchange.
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

/// Upper bound for a single outbound authenticated request.
pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Scheme used in the outbound `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";
