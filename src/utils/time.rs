use chrono::{DateTime, Duration, DurationRound, Utc};

pub const EXPIRY_DAYS: i64 = 28;
pub const PREMIUM_DAYS: i64 = 7;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Run lengths for adverts, scaled by the configured time multiplier.
///
/// The multiplier is applied each time a window is computed, so changing the
/// configuration never rewrites timestamps that were already stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleWindows {
    time_multiplier: f64,
}

impl Default for LifecycleWindows {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LifecycleWindows {
    pub fn new(time_multiplier: f64) -> Self {
        Self { time_multiplier }
    }

    pub fn expiry_window(&self) -> Duration {
        self.scaled_days(EXPIRY_DAYS)
    }

    pub fn premium_window(&self) -> Duration {
        self.scaled_days(PREMIUM_DAYS)
    }

    fn scaled_days(&self, days: i64) -> Duration {
        let millis = Duration::days(days).num_milliseconds() as f64 * self.time_multiplier;
        Duration::milliseconds(millis.round() as i64)
    }
}

/// `None` when `days` reaches outside chrono's representable range.
pub fn days_ago(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::try_days(days)?)
}

pub fn seconds_ago(now: DateTime<Utc>, seconds: i64) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::try_seconds(seconds)?)
}

/// Truncates to the start of the current minute. Falls back to `at` for
/// timestamps chrono refuses to round.
pub fn start_of_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}
