//! Created/accessed expiry: an absolute time-to-live plus an idle timeout.
//!
//! ```text
//!   created ──────────── time_to_live ────────────► hard expiry
//!      │
//!      └─ access ── tti ─► access ── tti ─► ...     idle expiry
//! ```
//!
//! An entry is live while both clocks are running. Reads restart the idle
//! clock but never the time-to-live; a write replaces the entry and restarts
//! both.

use std::time::{Duration, Instant};

use super::CachedGroup;

/// Expiry rule applied to every cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    time_to_live: Duration,
    time_to_idle: Duration,
}

impl ExpiryPolicy {
    /// Creates a policy from an absolute lifetime and an idle timeout.
    #[must_use]
    pub const fn new(time_to_live: Duration, time_to_idle: Duration) -> Self {
        Self { time_to_live, time_to_idle }
    }

    /// Lifetime measured from creation.
    #[must_use]
    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    /// Lifetime measured from the most recent access.
    #[must_use]
    pub fn time_to_idle(&self) -> Duration {
        self.time_to_idle
    }

    /// Returns `true` once either clock has run out at `now`.
    #[must_use]
    pub fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) > self.time_to_live
            || now.saturating_duration_since(entry.last_accessed_at) > self.time_to_idle
    }

    /// Time a freshly written entry has left.
    #[must_use]
    pub fn after_create(&self) -> Duration {
        self.time_to_live.min(self.time_to_idle)
    }

    /// Time an entry created at `created_at` has left after being read at
    /// `read_at`.
    #[must_use]
    pub fn after_read(&self, created_at: Instant, read_at: Instant) -> Duration {
        let age = read_at.saturating_duration_since(created_at);
        self.time_to_live.saturating_sub(age).min(self.time_to_idle)
    }
}

/// A cached lookup result with its creation and access instants.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    value: CachedGroup,
    created_at: Instant,
    last_accessed_at: Instant,
}

impl CacheEntry {
    /// Creates an entry written at `now`.
    #[must_use]
    pub fn new(value: CachedGroup, now: Instant) -> Self {
        Self { value, created_at: now, last_accessed_at: now }
    }

    /// The cached result. `None` is a remembered "not found".
    #[must_use]
    pub fn value(&self) -> &CachedGroup {
        &self.value
    }

    /// When the entry was written.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the entry was last read or written.
    #[must_use]
    pub fn last_accessed_at(&self) -> Instant {
        self.last_accessed_at
    }

    /// Records a read at `now`. Never moves the creation instant.
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed_at = self.last_accessed_at.max(now);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn fresh_entry_is_live() {
        let policy = ExpiryPolicy::new(10 * SECOND, 5 * SECOND);
        let now = Instant::now();
        let entry = CacheEntry::new(None, now);
        assert!(!policy.is_expired(&entry, now));
        assert!(!policy.is_expired(&entry, now + 5 * SECOND));
        assert!(policy.is_expired(&entry, now + 6 * SECOND));
    }

    #[test]
    fn access_extends_idle_but_not_lifetime() {
        let policy = ExpiryPolicy::new(10 * SECOND, 4 * SECOND);
        let t0 = Instant::now();
        let mut entry = CacheEntry::new(None, t0);

        for step in 1..=3 {
            let now = t0 + 3 * step * SECOND;
            assert!(!policy.is_expired(&entry, now), "expired at step {step}");
            entry.touch(now);
        }
        assert_eq!(entry.created_at(), t0);
        // Accessed at t0+9s, so idle is fine, but the lifetime ends at t0+10s.
        assert!(policy.is_expired(&entry, t0 + 11 * SECOND));
    }

    #[test]
    fn idle_gap_expires_entry() {
        let policy = ExpiryPolicy::new(100 * SECOND, 2 * SECOND);
        let t0 = Instant::now();
        let mut entry = CacheEntry::new(None, t0);
        entry.touch(t0 + SECOND);
        assert!(!policy.is_expired(&entry, t0 + 3 * SECOND));
        assert!(policy.is_expired(&entry, t0 + 4 * SECOND));
    }

    #[test]
    fn touch_never_moves_backwards() {
        let t0 = Instant::now();
        let mut entry = CacheEntry::new(None, t0 + SECOND);
        entry.touch(t0);
        assert_eq!(entry.last_accessed_at(), t0 + SECOND);
    }

    #[test]
    fn remaining_time_after_create_and_read() {
        let policy = ExpiryPolicy::new(10 * SECOND, 4 * SECOND);
        let t0 = Instant::now();
        assert_eq!(policy.after_create(), 4 * SECOND);
        assert_eq!(policy.after_read(t0, t0 + SECOND), 4 * SECOND);
        assert_eq!(policy.after_read(t0, t0 + 8 * SECOND), 2 * SECOND);
        assert_eq!(policy.after_read(t0, t0 + 12 * SECOND), Duration::ZERO);
    }
}
