pub mod file_store;
pub mod local_loader;
pub mod policy;
pub mod sqlite_store;
pub mod store;

pub use file_store::FileBackedFeedStore;
pub use local_loader::LocalFeedLoader;
pub use policy::FeedCachePolicy;
pub use sqlite_store::SqliteFeedStore;
pub use store::{CachedFeed, FeedStore, InMemoryFeedStore, LocalFeedImage};

use chrono::{DateTime, Utc};

/// Source of "now" for cache timestamping and freshness decisions.
/// Injected rather than read from a global clock so tests control time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
