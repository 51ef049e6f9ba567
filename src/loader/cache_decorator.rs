use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{FeedCache, FeedLoader};
use crate::error::Result;
use crate::feed::FeedImage;

/// Write-through decoration of a feed loader.
///
/// A successful load is handed to the caller unchanged while a detached
/// task writes the same feed into the cache. The write's outcome is
/// discarded and never influences the already-returned result; once
/// dispatched it runs to completion even if the decorator is dropped. A
/// failed load leaves the cache untouched.
pub struct FeedLoaderCacheDecorator<L, C> {
    decoratee: L,
    cache: Arc<C>,
}

impl<L, C> FeedLoaderCacheDecorator<L, C> {
    pub fn new(decoratee: L, cache: Arc<C>) -> Self {
        Self { decoratee, cache }
    }
}

#[async_trait]
impl<L, C> FeedLoader for FeedLoaderCacheDecorator<L, C>
where
    L: FeedLoader,
    C: FeedCache + 'static,
{
    async fn load(&self) -> Result<Vec<FeedImage>> {
        let feed = self.decoratee.load().await?;

        let cache = Arc::clone(&self.cache);
        let snapshot = feed.clone();
        tokio::spawn(async move {
            if let Err(err) = cache.save(&snapshot).await {
                warn!("best-effort cache population failed: {err}");
            }
        });

        Ok(feed)
    }
}
