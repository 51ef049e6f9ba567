use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::policy::FeedCachePolicy;
use crate::cache::store::{FeedStore, LocalFeedImage};
use crate::cache::{Clock, SystemClock};
use crate::error::Result;
use crate::feed::FeedImage;
use crate::loader::{FeedCache, FeedLoader};

/// Orchestrates save, load and validation against any `FeedStore`.
///
/// The current time comes from an injected `Clock`, so freshness decisions
/// and stored timestamps are deterministic under test.
pub struct LocalFeedLoader<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: FeedStore> LocalFeedLoader<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Replace the cached snapshot with `items`, stamped with the clock's
    /// current time. A delete failure propagates unchanged and the insert
    /// is never attempted.
    pub async fn save(&self, items: &[FeedImage]) -> Result<()> {
        self.store.delete_cached_feed().await?;
        let feed = items.iter().map(to_local).collect();
        self.store.insert(feed, self.clock.now()).await
    }

    /// Load the cached feed in its original order.
    ///
    /// A stale or absent snapshot yields an empty feed; load never deletes.
    /// Eviction of expired data happens only through `validate_cache`.
    pub async fn load(&self) -> Result<Vec<FeedImage>> {
        match self.store.retrieve().await? {
            Some(cached) if FeedCachePolicy::validate(cached.timestamp, self.clock.now()) => {
                Ok(cached.feed.iter().map(to_domain).collect())
            }
            Some(_) => {
                debug!("cached feed is stale, serving an empty feed");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Evict the snapshot when retrieval fails or the snapshot is stale.
    ///
    /// Fire-and-forget: outcomes are not reported, and a failed eviction is
    /// only logged.
    pub async fn validate_cache(&self) {
        let reason = match self.store.retrieve().await {
            Err(err) => Some(format!("retrieval failed: {err}")),
            Ok(Some(cached))
                if !FeedCachePolicy::validate(cached.timestamp, self.clock.now()) =>
            {
                Some("cached feed expired".to_string())
            }
            Ok(_) => None,
        };

        if let Some(reason) = reason {
            debug!("evicting cached feed: {reason}");
            if let Err(err) = self.store.delete_cached_feed().await {
                warn!("failed to evict cached feed: {err}");
            }
        }
    }
}

fn to_local(image: &FeedImage) -> LocalFeedImage {
    LocalFeedImage {
        id: image.id,
        description: image.description.clone(),
        location: image.location.clone(),
        url: image.url.clone(),
    }
}

fn to_domain(image: &LocalFeedImage) -> FeedImage {
    FeedImage {
        id: image.id,
        description: image.description.clone(),
        location: image.location.clone(),
        url: image.url.clone(),
    }
}

#[async_trait]
impl<S: FeedStore> FeedLoader for LocalFeedLoader<S> {
    async fn load(&self) -> Result<Vec<FeedImage>> {
        LocalFeedLoader::load(self).await
    }
}

#[async_trait]
impl<S: FeedStore> FeedCache for LocalFeedLoader<S> {
    async fn save(&self, feed: &[FeedImage]) -> Result<()> {
        LocalFeedLoader::save(self, feed).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use parking_lot::Mutex;
    use url::Url;
    use uuid::Uuid;

    use super::*;
    use crate::cache::store::CachedFeed;
    use crate::error::Error;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    fn unique_images() -> Vec<FeedImage> {
        vec![
            FeedImage::new(
                Uuid::new_v4(),
                Some("old town square".into()),
                Some("Prague".into()),
                Url::parse("https://images.example.com/0.jpg").unwrap(),
            ),
            FeedImage::new(
                Uuid::new_v4(),
                None,
                None,
                Url::parse("https://images.example.com/1.jpg").unwrap(),
            ),
        ]
    }

    fn cached(images: &[FeedImage], timestamp: DateTime<Utc>) -> CachedFeed {
        CachedFeed {
            feed: images.iter().map(to_local).collect(),
            timestamp,
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Message {
        Delete,
        Insert(Vec<LocalFeedImage>, DateTime<Utc>),
        Retrieve,
    }

    /// Records every store interaction and replays canned results.
    struct StoreSpy {
        messages: Mutex<Vec<Message>>,
        snapshot: Option<CachedFeed>,
        delete_error: Option<String>,
        insert_error: Option<String>,
        retrieve_error: Option<String>,
    }

    impl StoreSpy {
        fn empty() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                snapshot: None,
                delete_error: None,
                insert_error: None,
                retrieve_error: None,
            }
        }

        fn with_snapshot(snapshot: CachedFeed) -> Self {
            Self {
                snapshot: Some(snapshot),
                ..Self::empty()
            }
        }

        fn failing_delete(message: &str) -> Self {
            Self {
                delete_error: Some(message.to_string()),
                ..Self::empty()
            }
        }

        fn failing_retrieve(message: &str) -> Self {
            Self {
                retrieve_error: Some(message.to_string()),
                ..Self::empty()
            }
        }

        fn messages(&self) -> Vec<Message> {
            std::mem::take(&mut *self.messages.lock())
        }
    }

    #[async_trait]
    impl FeedStore for StoreSpy {
        async fn delete_cached_feed(&self) -> Result<()> {
            self.messages.lock().push(Message::Delete);
            match &self.delete_error {
                Some(message) => Err(Error::Storage(message.clone())),
                None => Ok(()),
            }
        }

        async fn insert(
            &self,
            feed: Vec<LocalFeedImage>,
            timestamp: DateTime<Utc>,
        ) -> Result<()> {
            self.messages.lock().push(Message::Insert(feed, timestamp));
            match &self.insert_error {
                Some(message) => Err(Error::Storage(message.clone())),
                None => Ok(()),
            }
        }

        async fn retrieve(&self) -> Result<Option<CachedFeed>> {
            self.messages.lock().push(Message::Retrieve);
            match &self.retrieve_error {
                Some(message) => Err(Error::Storage(message.clone())),
                None => Ok(self.snapshot.clone()),
            }
        }
    }

    fn make_sut(store: StoreSpy) -> LocalFeedLoader<Arc<StoreSpy>> {
        LocalFeedLoader::with_clock(Arc::new(store), Arc::new(FixedClock(now())))
    }

    #[tokio::test]
    async fn save_requests_deletion_then_insertion_with_the_injected_time() {
        let images = unique_images();
        let sut = make_sut(StoreSpy::empty());

        sut.save(&images).await.unwrap();

        let expected: Vec<LocalFeedImage> = images.iter().map(to_local).collect();
        assert_eq!(
            sut.store.messages(),
            vec![Message::Delete, Message::Insert(expected, now())]
        );
    }

    #[tokio::test]
    async fn save_does_not_insert_when_deletion_fails() {
        let sut = make_sut(StoreSpy::failing_delete("deletion denied"));

        let err = sut.save(&unique_images()).await.unwrap_err();

        assert!(matches!(err, Error::Storage(message) if message == "deletion denied"));
        assert_eq!(sut.store.messages(), vec![Message::Delete]);
    }

    #[tokio::test]
    async fn save_surfaces_an_insertion_failure() {
        let store = StoreSpy {
            insert_error: Some("no space left".into()),
            ..StoreSpy::empty()
        };
        let sut = make_sut(store);

        let err = sut.save(&unique_images()).await.unwrap_err();

        assert!(matches!(err, Error::Storage(message) if message == "no space left"));
    }

    #[tokio::test]
    async fn load_yields_an_empty_feed_from_an_empty_store() {
        let sut = make_sut(StoreSpy::empty());

        assert_eq!(sut.load().await.unwrap(), Vec::<FeedImage>::new());
    }

    #[tokio::test]
    async fn load_yields_the_cached_feed_in_original_order_while_fresh() {
        let images = unique_images();
        let saved_at = now() - Duration::days(7) + Duration::seconds(1);
        let sut = make_sut(StoreSpy::with_snapshot(cached(&images, saved_at)));

        assert_eq!(sut.load().await.unwrap(), images);
    }

    #[tokio::test]
    async fn load_yields_an_empty_feed_on_an_expired_cache_without_deleting() {
        let images = unique_images();
        let saved_at = now() - Duration::days(7);
        let sut = make_sut(StoreSpy::with_snapshot(cached(&images, saved_at)));

        assert_eq!(sut.load().await.unwrap(), Vec::<FeedImage>::new());
        assert_eq!(sut.store.messages(), vec![Message::Retrieve]);
    }

    #[tokio::test]
    async fn load_propagates_a_retrieval_failure_verbatim() {
        let sut = make_sut(StoreSpy::failing_retrieve("corrupt snapshot"));

        let err = sut.load().await.unwrap_err();

        assert!(matches!(err, Error::Storage(message) if message == "corrupt snapshot"));
    }

    #[tokio::test]
    async fn validate_cache_deletes_on_a_retrieval_failure() {
        let sut = make_sut(StoreSpy::failing_retrieve("corrupt snapshot"));

        sut.validate_cache().await;

        assert_eq!(sut.store.messages(), vec![Message::Retrieve, Message::Delete]);
    }

    #[tokio::test]
    async fn validate_cache_deletes_an_expired_snapshot() {
        let saved_at = now() - Duration::days(8);
        let sut = make_sut(StoreSpy::with_snapshot(cached(&unique_images(), saved_at)));

        sut.validate_cache().await;

        assert_eq!(sut.store.messages(), vec![Message::Retrieve, Message::Delete]);
    }

    #[tokio::test]
    async fn validate_cache_keeps_a_fresh_snapshot() {
        let saved_at = now() - Duration::days(1);
        let sut = make_sut(StoreSpy::with_snapshot(cached(&unique_images(), saved_at)));

        sut.validate_cache().await;

        assert_eq!(sut.store.messages(), vec![Message::Retrieve]);
    }

    #[tokio::test]
    async fn validate_cache_is_a_noop_on_an_empty_store() {
        let sut = make_sut(StoreSpy::empty());

        sut.validate_cache().await;

        assert_eq!(sut.store.messages(), vec![Message::Retrieve]);
    }

    #[tokio::test]
    async fn validate_cache_swallows_an_eviction_failure() {
        let store = StoreSpy {
            retrieve_error: Some("corrupt snapshot".into()),
            delete_error: Some("deletion denied".into()),
            ..StoreSpy::empty()
        };
        let sut = make_sut(store);

        // No panic, no result channel: the failure is logged and dropped.
        sut.validate_cache().await;

        assert_eq!(sut.store.messages(), vec![Message::Retrieve, Message::Delete]);
    }
}
