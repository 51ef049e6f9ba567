use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::store::{CachedFeed, FeedStore, LocalFeedImage};
use crate::error::{Error, Result};

/// Persists the snapshot as one JSON document at a fixed path.
///
/// A read-write lock gives the store a single-writer/multi-reader
/// discipline: retrievals share the read guard while insert and delete hold
/// the write guard, exclusive against every other operation. A retrieve
/// issued after a completed write therefore always observes that write,
/// with no locking on the caller's side.
pub struct FileBackedFeedStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileBackedFeedStore {
    /// The store owns `path` for the lifetime of the process; nothing else
    /// should write to it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FeedStore for FileBackedFeedStore {
    async fn delete_cached_feed(&self) -> Result<()> {
        let _guard = self.lock.write().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "deleted cached feed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    async fn insert(&self, feed: Vec<LocalFeedImage>, timestamp: DateTime<Utc>) -> Result<()> {
        let _guard = self.lock.write().await;

        let snapshot = CachedFeed { feed, timestamp };
        let encoded = serde_json::to_vec_pretty(&snapshot)?;

        // Write to a temporary file first, then rename (atomic replace).
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, encoded).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            path = %self.path.display(),
            images = snapshot.feed.len(),
            "inserted cached feed"
        );
        Ok(())
    }

    async fn retrieve(&self) -> Result<Option<CachedFeed>> {
        let _guard = self.lock.read().await;

        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::Io(err)),
        };

        let snapshot = serde_json::from_slice(&raw)?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;
    use crate::cache::store::test_support::feed;

    fn make_sut(dir: &TempDir) -> FileBackedFeedStore {
        FileBackedFeedStore::new(dir.path().join("feed_cache.json"))
    }

    fn timestamp(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn retrieve_on_a_missing_file_yields_none() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);

        assert_eq!(sut.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn retrieve_has_no_side_effects_on_a_missing_file() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);

        sut.retrieve().await.unwrap();

        assert_eq!(sut.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn insert_then_retrieve_round_trips_the_snapshot_in_order() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);
        let images = feed();
        let at = timestamp(1_700_000_000);

        sut.insert(images.clone(), at).await.unwrap();

        let cached = sut.retrieve().await.unwrap().unwrap();
        assert_eq!(cached.feed, images);
        assert_eq!(cached.timestamp, at);
    }

    #[tokio::test]
    async fn a_second_insert_replaces_the_first_snapshot() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);
        let feed_b = feed();

        sut.insert(feed(), timestamp(1_000)).await.unwrap();
        sut.insert(feed_b.clone(), timestamp(2_000)).await.unwrap();

        let cached = sut.retrieve().await.unwrap().unwrap();
        assert_eq!(cached.feed, feed_b);
        assert_eq!(cached.timestamp, timestamp(2_000));
    }

    #[tokio::test]
    async fn delete_removes_the_snapshot_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);

        sut.delete_cached_feed().await.unwrap();

        sut.insert(feed(), timestamp(1_000)).await.unwrap();
        sut.delete_cached_feed().await.unwrap();

        assert_eq!(sut.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn retrieve_fails_on_an_undecodable_file() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);
        std::fs::write(sut.path(), "not json at all").unwrap();

        let err = sut.retrieve().await.unwrap_err();

        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn operations_complete_in_submission_order() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);
        let last = feed();

        sut.insert(feed(), timestamp(1_000)).await.unwrap();
        sut.delete_cached_feed().await.unwrap();
        sut.insert(last.clone(), timestamp(3_000)).await.unwrap();

        let cached = sut.retrieve().await.unwrap().unwrap();
        assert_eq!(cached.feed, last);
        assert_eq!(cached.timestamp, timestamp(3_000));
    }

    #[tokio::test]
    async fn concurrent_retrievals_see_a_consistent_snapshot() {
        let dir = TempDir::new().unwrap();
        let sut = make_sut(&dir);
        let images = feed();
        sut.insert(images.clone(), timestamp(1_000)).await.unwrap();

        let (a, b, c) = tokio::join!(sut.retrieve(), sut.retrieve(), sut.retrieve());

        for cached in [a, b, c] {
            assert_eq!(cached.unwrap().unwrap().feed, images);
        }
    }

    #[tokio::test]
    async fn the_store_survives_its_instance() {
        let dir = TempDir::new().unwrap();
        let images = feed();

        {
            let sut = make_sut(&dir);
            sut.insert(images.clone(), timestamp(1_000)).await.unwrap();
        }

        let sut = make_sut(&dir);
        assert_eq!(sut.retrieve().await.unwrap().unwrap().feed, images);
    }
}
