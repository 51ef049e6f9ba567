use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::Result;

/// Image record as held by a store. Mirrors the domain `FeedImage` but is a
/// distinct type so the persistence layer never leaks into callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFeedImage {
    pub id: Uuid,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Url,
}

/// The single snapshot a store persists: the feed in display order plus the
/// instant it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFeed {
    pub feed: Vec<LocalFeedImage>,
    pub timestamp: DateTime<Utc>,
}

/// Storage contract for the cached feed snapshot.
///
/// A store holds at most one `CachedFeed`; `insert` replaces any previous
/// snapshot wholesale. Absence is a successful `None`, never an error.
/// Futures may resume on any executor thread; a caller that needs a
/// particular context redispatches on its own side of the boundary.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Remove the persisted snapshot. Succeeds as a no-op when none exists.
    async fn delete_cached_feed(&self) -> Result<()>;

    /// Replace any existing snapshot with the given feed and timestamp.
    async fn insert(&self, feed: Vec<LocalFeedImage>, timestamp: DateTime<Utc>) -> Result<()>;

    /// Return the current snapshot, or `None` when nothing is cached.
    async fn retrieve(&self) -> Result<Option<CachedFeed>>;
}

#[async_trait]
impl<S: FeedStore + ?Sized> FeedStore for Arc<S> {
    async fn delete_cached_feed(&self) -> Result<()> {
        (**self).delete_cached_feed().await
    }

    async fn insert(&self, feed: Vec<LocalFeedImage>, timestamp: DateTime<Utc>) -> Result<()> {
        (**self).insert(feed, timestamp).await
    }

    async fn retrieve(&self) -> Result<Option<CachedFeed>> {
        (**self).retrieve().await
    }
}

/// Memory-only store implementation for testing and development.
#[derive(Default)]
pub struct InMemoryFeedStore {
    snapshot: RwLock<Option<CachedFeed>>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedStore for InMemoryFeedStore {
    async fn delete_cached_feed(&self) -> Result<()> {
        self.snapshot.write().take();
        Ok(())
    }

    async fn insert(&self, feed: Vec<LocalFeedImage>, timestamp: DateTime<Utc>) -> Result<()> {
        *self.snapshot.write() = Some(CachedFeed { feed, timestamp });
        Ok(())
    }

    async fn retrieve(&self) -> Result<Option<CachedFeed>> {
        Ok(self.snapshot.read().clone())
    }
}
