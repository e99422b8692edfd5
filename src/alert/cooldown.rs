//! Per-key alert cooldown tracking.
//!
//! The tracker stores the last trigger instant per alert key in a moka
//! cache whose TTL equals the cooldown period: an entry that has
//! expired is exactly a key that is allowed to trigger again. State is
//! in-memory per process and is not persisted across restarts.
//!
//! # Thread safety
//!
//! The cache is shared across the scheduler's per-user tasks. The
//! check-then-mark sequence used by the scheduler goes through
//! [`CooldownTracker::try_trigger`], which is atomic per key; there is
//! no global lock.

use std::time::{Duration, Instant};

use moka::sync::Cache;

use crate::alert::AlertType;

/// Reference cooldown period between repeat alerts for one key.
pub const DEFAULT_COOLDOWN_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Cap on tracked keys to bound memory.
const DEFAULT_MAX_CAPACITY: u64 = 100_000;

/// Build the cooldown key for a user/type/location trigger.
pub fn alert_key(user_id: &str, alert_type: AlertType, location: &str) -> String {
    format!("{}:{}:{}", user_id, alert_type, location)
}

/// Keyed last-trigger store enforcing a minimum re-trigger interval.
pub struct CooldownTracker {
    cache: Cache<String, Instant>,
    period: Duration,
}

impl CooldownTracker {
    /// Tracker with the reference one-hour period.
    pub fn new() -> Self {
        Self::with_period(DEFAULT_COOLDOWN_PERIOD)
    }

    /// Tracker with a custom cooldown period.
    pub fn with_period(period: Duration) -> Self {
        Self::with_capacity(period, DEFAULT_MAX_CAPACITY)
    }

    /// Tracker with custom period and key capacity (for testing).
    pub fn with_capacity(period: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(period)
            .max_capacity(max_capacity)
            .build();
        Self { cache, period }
    }

    /// The configured cooldown period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// True if the key has no live record, i.e. it never triggered or
    /// the cooldown period has fully elapsed.
    pub fn can_trigger(&self, key: &str) -> bool {
        self.cache.get(key).is_none()
    }

    /// Record a trigger for the key at the current instant.
    pub fn mark_triggered(&self, key: &str) {
        self.cache.insert(key.to_string(), Instant::now());
    }

    /// Atomic check-then-mark: records a trigger and returns `true`
    /// only if the key was free. Concurrent callers for the same key
    /// see exactly one `true`.
    pub fn try_trigger(&self, key: &str) -> bool {
        let entry = self.cache.entry(key.to_string()).or_insert(Instant::now());
        let fresh = entry.is_fresh();
        tracing::trace!(key = %key, allowed = fresh, "Cooldown check");
        fresh
    }

    /// Drop all cooldown state.
    pub fn reset(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CooldownTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownTracker")
            .field("period", &self.period)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_key_can_trigger() {
        let tracker = CooldownTracker::new();
        assert!(tracker.can_trigger("u1:Temperature:Oslo"));
    }

    #[test]
    fn marked_key_is_blocked() {
        let tracker = CooldownTracker::new();
        tracker.mark_triggered("u1:Temperature:Oslo");
        assert!(!tracker.can_trigger("u1:Temperature:Oslo"));
    }

    #[test]
    fn keys_are_independent() {
        let tracker = CooldownTracker::new();
        tracker.mark_triggered("u1:Temperature:Oslo");
        assert!(tracker.can_trigger("u2:Temperature:Oslo"));
        assert!(tracker.can_trigger("u1:Humidity:Oslo"));
        assert!(tracker.can_trigger("u1:Temperature:Bergen"));
    }

    #[test]
    fn try_trigger_passes_once() {
        let tracker = CooldownTracker::new();
        assert!(tracker.try_trigger("k"));
        assert!(!tracker.try_trigger("k"));
        assert!(!tracker.can_trigger("k"));
    }

    #[tokio::test]
    async fn expired_entry_allows_retrigger() {
        let tracker = CooldownTracker::with_period(Duration::from_millis(100));
        assert!(tracker.try_trigger("k"));
        assert!(!tracker.try_trigger("k"));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(tracker.can_trigger("k"));
        assert!(tracker.try_trigger("k"));
    }

    #[test]
    fn reset_clears_state() {
        let tracker = CooldownTracker::new();
        tracker.mark_triggered("k");
        assert!(!tracker.can_trigger("k"));

        tracker.reset();
        assert!(tracker.can_trigger("k"));
    }

    #[test]
    fn try_trigger_is_atomic_per_key() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let tracker = Arc::new(CooldownTracker::new());
        let passes = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                let passes = Arc::clone(&passes);
                std::thread::spawn(move || {
                    if tracker.try_trigger("contended") {
                        passes.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(passes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn alert_key_format() {
        assert_eq!(
            alert_key("u1", AlertType::AirQuality, "Delhi"),
            "u1:Air Quality:Delhi"
        );
    }
}
