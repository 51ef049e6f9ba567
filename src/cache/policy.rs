use chrono::{DateTime, Days, Utc};

/// Decides whether a cached snapshot is still fresh.
///
/// The window is seven calendar days, advanced with calendar arithmetic
/// rather than a fixed second offset so the cutoff tracks day boundaries
/// across DST transitions. The cutoff instant itself already counts as
/// expired.
pub struct FeedCachePolicy;

impl FeedCachePolicy {
    const MAX_CACHE_AGE_DAYS: u64 = 7;

    /// True iff `now` is strictly earlier than `timestamp` plus seven
    /// calendar days. A timestamp that cannot be advanced by the window
    /// (range overflow) counts as expired.
    pub fn validate(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match timestamp.checked_add_days(Days::new(Self::MAX_CACHE_AGE_DAYS)) {
            Some(max_age) => now < max_age,
            None => false,
        }
    }
}
