//! Expiry policy
//!
//! Pure decision of whether a token set is stale enough to refresh.

use chrono::{DateTime, Duration, Utc};
use sessionward_common::auth::TokenSet;
use sessionward_domain::constants::{DEFAULT_CLOCK_SKEW_MINUTES, MAX_CLOCK_SKEW_MINUTES};
use sessionward_domain::AuthSettings;

/// True iff expiry is known and `now + clock_skew >= expires_at`.
///
/// Unknown expiry never triggers a proactive refresh; the 401 path covers it.
/// A margin reaching past the calendar range makes every known expiry stale.
#[must_use]
pub fn needs_refresh(tokens: &TokenSet, now: DateTime<Utc>, clock_skew: Duration) -> bool {
    tokens.expires_at.is_some_and(|expires_at| {
        now.checked_add_signed(clock_skew).map_or(true, |edge| edge >= expires_at)
    })
}

/// Clock-skew margin applied to every expiry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    clock_skew: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_CLOCK_SKEW_MINUTES))
    }
}

impl ExpiryPolicy {
    #[must_use]
    pub const fn new(clock_skew: Duration) -> Self {
        Self { clock_skew }
    }

    /// Policy from `refresh_expiry_clock_skew_in_minutes`
    ///
    /// The margin is clamped to `0..=MAX_CLOCK_SKEW_MINUTES`.
    #[must_use]
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let minutes =
            settings.refresh_expiry_clock_skew_in_minutes.clamp(0, MAX_CLOCK_SKEW_MINUTES);
        Self::new(Duration::minutes(minutes))
    }

    #[must_use]
    pub const fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    #[must_use]
    pub fn needs_refresh(&self, tokens: &TokenSet, now: DateTime<Utc>) -> bool {
        needs_refresh(tokens, now, self.clock_skew)
    }
}
