use std::path::Path;
use std::thread;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Sender};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::oneshot;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::cache::store::{CachedFeed, FeedStore, LocalFeedImage};
use crate::error::{Error, Result};

type Job = Box<dyn FnOnce(&mut Connection) + Send>;

/// SQLite-backed store: one logical cache row plus ordered child rows, one
/// per image.
///
/// Every operation is funneled through a dedicated worker thread that owns
/// the connection, so operations complete strictly in submission order and
/// never interleave. Each operation runs inside a transaction; its future
/// resolves after commit, or with the caught error, and no partial write is
/// ever observable.
///
/// The at-most-one-row invariant is enforced programmatically inside
/// `insert`'s transaction, not by a schema constraint.
pub struct SqliteFeedStore {
    jobs: Sender<Job>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS feed_cache (
    id INTEGER PRIMARY KEY,
    timestamp TEXT NOT NULL
);

-- position preserves feed order across retrieval
CREATE TABLE IF NOT EXISTS feed_images (
    cache_id INTEGER NOT NULL REFERENCES feed_cache(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    image_id TEXT NOT NULL,
    description TEXT,
    location TEXT,
    url TEXT NOT NULL,
    PRIMARY KEY (cache_id, position)
);
"#;

impl SqliteFeedStore {
    /// Open (or create) the database at `path` and start the worker. The
    /// store owns the database for the lifetime of the process.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::start(Connection::open(path.as_ref())?)
    }

    /// Fully in-memory database, for tests and development.
    pub fn open_in_memory() -> Result<Self> {
        Self::start(Connection::open_in_memory()?)
    }

    fn start(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let (jobs, queue) = channel::unbounded::<Job>();
        thread::Builder::new()
            .name("feedvault-sqlite".into())
            .spawn(move || {
                let mut conn = conn;
                // One job at a time, in submission order, until every
                // sender is gone.
                for job in queue {
                    job(&mut conn);
                }
            })
            .map_err(Error::Io)?;

        Ok(Self { jobs })
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            let _ = tx.send(op(conn));
        });

        self.jobs
            .send(job)
            .map_err(|_| Error::Storage("database worker is gone".to_string()))?;

        rx.await
            .map_err(|_| Error::Storage("database worker dropped the operation".to_string()))?
    }
}

#[async_trait]
impl FeedStore for SqliteFeedStore {
    async fn delete_cached_feed(&self) -> Result<()> {
        self.run(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM feed_cache", [])?;
            tx.commit()?;
            if removed > 0 {
                debug!("deleted cached feed");
            }
            Ok(())
        })
        .await
    }

    async fn insert(&self, feed: Vec<LocalFeedImage>, timestamp: DateTime<Utc>) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.transaction()?;

            // Replace wholesale: drop whatever snapshot exists, then write
            // the new cache row and its ordered children in the same
            // transaction.
            tx.execute("DELETE FROM feed_cache", [])?;
            tx.execute(
                "INSERT INTO feed_cache (timestamp) VALUES (?1)",
                params![timestamp.to_rfc3339()],
            )?;
            let cache_id = tx.last_insert_rowid();

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO feed_images
                         (cache_id, position, image_id, description, location, url)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for (position, image) in feed.iter().enumerate() {
                    stmt.execute(params![
                        cache_id,
                        position as i64,
                        image.id.to_string(),
                        image.description,
                        image.location,
                        image.url.as_str(),
                    ])?;
                }
            }

            tx.commit()?;
            debug!(images = feed.len(), "inserted cached feed");
            Ok(())
        })
        .await
    }

    async fn retrieve(&self) -> Result<Option<CachedFeed>> {
        self.run(|conn| {
            let tx = conn.transaction()?;

            let row = tx
                .query_row("SELECT id, timestamp FROM feed_cache", [], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })
                .optional()?;

            let (cache_id, raw_timestamp) = match row {
                Some(row) => row,
                None => return Ok(None),
            };
            let timestamp = parse_timestamp(&raw_timestamp)?;

            let mut feed = Vec::new();
            {
                let mut stmt = tx.prepare(
                    "SELECT image_id, description, location, url FROM feed_images
                     WHERE cache_id = ?1
                     ORDER BY position",
                )?;
                let rows = stmt.query_map(params![cache_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?;

                for row in rows {
                    let (id, description, location, url) = row?;
                    feed.push(LocalFeedImage {
                        id: parse_image_id(&id)?,
                        description,
                        location,
                        url: parse_image_url(&url)?,
                    });
                }
            }

            tx.commit()?;
            Ok(Some(CachedFeed { feed, timestamp }))
        })
        .await
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| Error::InvalidData(format!("bad cache timestamp '{raw}': {err}")))
}

fn parse_image_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|err| Error::InvalidData(format!("bad image id '{raw}': {err}")))
}

fn parse_image_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|err| Error::InvalidData(format!("bad image url '{raw}': {err}")))
}
