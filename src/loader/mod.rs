pub mod cache_decorator;
pub mod fallback;

pub use cache_decorator::FeedLoaderCacheDecorator;
pub use fallback::{FeedLoaderWithFallback, ImageDataLoaderWithFallback};

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result};
use crate::feed::FeedImage;

/// Loads the image feed from somewhere: the network, the local cache, or a
/// composite of the two.
#[async_trait]
pub trait FeedLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<FeedImage>>;
}

/// Loads the raw bytes behind a feed image URL.
#[async_trait]
pub trait ImageDataLoader: Send + Sync {
    async fn load_image_data(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Write side of the cache, as the composition layer sees it.
#[async_trait]
pub trait FeedCache: Send + Sync {
    async fn save(&self, feed: &[FeedImage]) -> Result<()>;
}

#[async_trait]
impl<L: FeedLoader + ?Sized> FeedLoader for Arc<L> {
    async fn load(&self) -> Result<Vec<FeedImage>> {
        (**self).load().await
    }
}

#[async_trait]
impl<L: ImageDataLoader + ?Sized> ImageDataLoader for Arc<L> {
    async fn load_image_data(&self, url: &Url) -> Result<Vec<u8>> {
        (**self).load_image_data(url).await
    }
}

#[async_trait]
impl<C: FeedCache + ?Sized> FeedCache for Arc<C> {
    async fn save(&self, feed: &[FeedImage]) -> Result<()> {
        (**self).save(feed).await
    }
}

/// Handle to a detached load.
///
/// The handle's identity never changes, whichever concrete operation is
/// currently in flight underneath it (for a fallback composite that is the
/// primary or, after failover, the fallback). Cancellation is cooperative:
/// the aborted task stops at its next await point.
pub struct LoadTask<T> {
    handle: tokio::task::JoinHandle<Result<T>>,
}

impl<T: Send + 'static> LoadTask<T> {
    /// Spawn `load` on the current runtime and hand back its handle.
    pub fn spawn<F>(load: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(load),
        }
    }

    /// Abort the in-flight load.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Wait for the load to finish. A cancelled load reports
    /// `Error::Cancelled`.
    pub async fn result(self) -> Result<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(Error::Cancelled),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}
