// Expiry tracking and renewal watermarks
use crate::auth::jwt;
use crate::duration;

pub const DEFAULT_WARN_MINUTES: i64 = 3;
pub const DEFAULT_REFRESH_MINUTES: i64 = 2;

/// Human label for how long `token` stays valid
pub fn describe_remaining(token: &str) -> String {
    if jwt::is_expired(token) {
        return "EXPIRED".to_string();
    }

    match jwt::time_remaining_minutes(token) {
        0 => "under a minute".to_string(),
        minutes => duration::format_minutes(u32::try_from(minutes).unwrap_or(u32::MAX)),
    }
}

/// Watermarks for the proactive renewal monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Warn once when this many minutes or fewer remain
    pub warn_at_minutes: i64,
    /// Renew when this many minutes or fewer remain
    pub refresh_at_minutes: i64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            warn_at_minutes: DEFAULT_WARN_MINUTES,
            refresh_at_minutes: DEFAULT_REFRESH_MINUTES,
        }
    }
}

/// What one monitor tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpiryCheck {
    pub warn: bool,
    pub refresh: bool,
}

impl ExpiryPolicy {
    pub fn is_expiring(&self, remaining_minutes: i64) -> bool {
        remaining_minutes <= self.warn_at_minutes
    }

    /// Decide a tick. `warned` tracks whether the current danger window
    /// already produced a warning; it clears once the token recovers above
    /// the warn watermark.
    pub fn evaluate(&self, remaining_minutes: i64, warned: &mut bool) -> ExpiryCheck {
        if remaining_minutes > self.warn_at_minutes {
            *warned = false;
            return ExpiryCheck::default();
        }

        let warn = !*warned;
        *warned = true;

        ExpiryCheck {
            warn,
            refresh: remaining_minutes <= self.refresh_at_minutes,
        }
    }
}
