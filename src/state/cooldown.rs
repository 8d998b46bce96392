//! Per-bot cooldown after failed trades

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// Suppression window after a failed trade. A fixed window is enough:
/// the tick rate is far higher than the retry window, so exponential
/// backoff bookkeeping buys nothing here.
pub const RETRY_DELAY_MS: i64 = 30_000;

/// Tracks the last failure time per bot. A present entry suppresses
/// trading until the window lapses; observing the lapse clears the
/// entry.
#[derive(Default)]
pub struct CooldownTracker {
    failures: DashMap<Uuid, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&self, bot_id: Uuid, at: DateTime<Utc>) {
        self.failures.insert(bot_id, at);
    }

    pub fn clear(&self, bot_id: Uuid) {
        self.failures.remove(&bot_id);
    }

    /// Milliseconds of suppression left, or `None` when the bot may
    /// trade. Expired entries are removed under the shard lock, so the
    /// check-then-clear is atomic with respect to concurrent ticks.
    pub fn remaining_ms(&self, bot_id: Uuid, now: DateTime<Utc>) -> Option<i64> {
        match self.failures.entry(bot_id) {
            Entry::Occupied(entry) => {
                let elapsed = now.signed_duration_since(*entry.get()).num_milliseconds();
                if elapsed >= RETRY_DELAY_MS {
                    entry.remove();
                    None
                } else {
                    Some(RETRY_DELAY_MS - elapsed)
                }
            }
            Entry::Vacant(_) => None,
        }
    }

    pub fn is_in_cooldown(&self, bot_id: Uuid, now: DateTime<Utc>) -> bool {
        self.remaining_ms(bot_id, now).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn in_cooldown_immediately_after_failure() {
        let tracker = CooldownTracker::new();
        let bot_id = Uuid::new_v4();
        let t0 = Utc::now();

        tracker.record_failure(bot_id, t0);
        assert!(tracker.is_in_cooldown(bot_id, t0));
        assert!(tracker.is_in_cooldown(bot_id, t0 + Duration::milliseconds(29_999)));
    }

    #[test]
    fn expires_exactly_at_the_window() {
        let tracker = CooldownTracker::new();
        let bot_id = Uuid::new_v4();
        let t0 = Utc::now();

        tracker.record_failure(bot_id, t0);
        assert!(!tracker.is_in_cooldown(bot_id, t0 + Duration::milliseconds(RETRY_DELAY_MS)));
        // Expiry observation cleared the entry: an earlier timestamp no
        // longer reports cooldown either.
        assert!(!tracker.is_in_cooldown(bot_id, t0));
    }

    #[test]
    fn clear_lifts_the_cooldown() {
        let tracker = CooldownTracker::new();
        let bot_id = Uuid::new_v4();
        let t0 = Utc::now();

        tracker.record_failure(bot_id, t0);
        tracker.clear(bot_id);
        assert!(!tracker.is_in_cooldown(bot_id, t0));
    }

    #[test]
    fn newer_failure_overwrites_older() {
        let tracker = CooldownTracker::new();
        let bot_id = Uuid::new_v4();
        let t0 = Utc::now();
        let t1 = t0 + Duration::milliseconds(20_000);

        tracker.record_failure(bot_id, t0);
        tracker.record_failure(bot_id, t1);
        // 31s after the first failure is still within 30s of the second.
        assert!(tracker.is_in_cooldown(bot_id, t0 + Duration::milliseconds(31_000)));
        assert!(!tracker.is_in_cooldown(bot_id, t1 + Duration::milliseconds(30_000)));
    }

    #[test]
    fn unknown_bots_are_never_cooling() {
        let tracker = CooldownTracker::new();
        assert!(!tracker.is_in_cooldown(Uuid::new_v4(), Utc::now()));
        assert_eq!(tracker.remaining_ms(Uuid::new_v4(), Utc::now()), None);
    }
}
