use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{FeedLoader, ImageDataLoader};
use crate::error::Result;
use crate::feed::FeedImage;

/// Tries a primary feed loader and, only when it fails, a fallback.
///
/// A primary success is returned verbatim and the fallback is never
/// consulted. A primary failure hands over to the fallback exactly once,
/// and whatever the fallback yields, success or error, is the composite's
/// result. The primary is not retried and results are never merged.
pub struct FeedLoaderWithFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FeedLoaderWithFallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P, F> FeedLoader for FeedLoaderWithFallback<P, F>
where
    P: FeedLoader,
    F: FeedLoader,
{
    async fn load(&self) -> Result<Vec<FeedImage>> {
        match self.primary.load().await {
            Ok(feed) => Ok(feed),
            Err(err) => {
                debug!("primary feed load failed ({err}), trying fallback");
                self.fallback.load().await
            }
        }
    }
}

/// Image-data variant of the fallback composite. Same contract as the feed
/// variant, keyed by URL.
pub struct ImageDataLoaderWithFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> ImageDataLoaderWithFallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P, F> ImageDataLoader for ImageDataLoaderWithFallback<P, F>
where
    P: ImageDataLoader,
    F: ImageDataLoader,
{
    async fn load_image_data(&self, url: &Url) -> Result<Vec<u8>> {
        match self.primary.load_image_data(url).await {
            Ok(data) => Ok(data),
            Err(err) => {
                debug!(url = %url, "primary image load failed ({err}), trying fallback");
                self.fallback.load_image_data(url).await
            }
        }
    }
}
