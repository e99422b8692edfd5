//! Recurring digest subscriptions and time-of-day matching.
//!
//! Daily and Weekly subscriptions are matched by the clock; AlertsOnly
//! and ExtremeOnly exist purely for threshold-driven push and never
//! match. The match window is forward-only and five minutes wide: a
//! subscription targeting 08:00 fires between 08:00 and 08:04 local
//! time inclusive, never before the target minute, so one scheduler
//! tick per day can match even when a tick straddles the boundary.
//! This requires the tick interval to be no coarser than the window,
//! which config validation enforces.

use chrono::{DateTime, Datelike, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Width of the forward-only match window, in minutes.
pub const MATCH_WINDOW_MINUTES: u32 = 5;

/// Subscription delivery kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    Daily,
    Weekly,
    /// Threshold-driven push only; never clock-matched.
    AlertsOnly,
    /// Threshold-driven push for High/Critical only; never clock-matched.
    ExtremeOnly,
}

/// A user's recurring digest subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub kind: SubscriptionKind,
    /// Target delivery time in the owner's local time, "HH:MM".
    pub time_of_day: String,
    pub active: bool,
}

impl Subscription {
    /// Whether the subscription should fire at the given instant in
    /// the owner's local time.
    ///
    /// A malformed `time_of_day` yields `false`, never an error.
    pub fn is_due(&self, local_now: &DateTime<Tz>) -> bool {
        if !self.active {
            return false;
        }

        match self.kind {
            SubscriptionKind::Daily => {}
            SubscriptionKind::Weekly => {
                if local_now.weekday() != Weekday::Mon {
                    return false;
                }
            }
            SubscriptionKind::AlertsOnly | SubscriptionKind::ExtremeOnly => return false,
        }

        let (hour, minute) = match parse_time_of_day(&self.time_of_day) {
            Some(t) => t,
            None => {
                tracing::warn!(
                    subscription_id = %self.id,
                    time_of_day = %self.time_of_day,
                    "Malformed time of day, subscription will never fire"
                );
                return false;
            }
        };

        let target = hour * 60 + minute;
        let now = local_now.hour() * 60 + local_now.minute();
        now >= target && now - target < MATCH_WINDOW_MINUTES
    }
}

/// Parse an "HH:MM" wall-clock time. Returns `(hour, minute)` or
/// `None` if the string is not a valid time of day.
pub fn parse_time_of_day(value: &str) -> Option<(u32, u32)> {
    let (h, m) = value.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}

/// Strict variant used at config validation time.
pub fn validate_time_of_day(subscription_id: &str, value: &str) -> Result<(), ConfigError> {
    match parse_time_of_day(value) {
        Some(_) => Ok(()),
        None => Err(ConfigError::InvalidTimeOfDay {
            subscription: subscription_id.to_string(),
            value: value.to_string(),
        }),
    }
}
