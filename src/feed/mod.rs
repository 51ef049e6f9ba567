use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

/// A single image in the feed, as the rest of the application sees it.
///
/// Identity is carried by `id`; equality compares every field. The storage
/// layer keeps its own mirror of this shape (`LocalFeedImage`) so the two
/// can evolve independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImage {
    pub id: Uuid,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Url,
}

impl FeedImage {
    pub fn new(
        id: Uuid,
        description: Option<String>,
        location: Option<String>,
        url: Url,
    ) -> Self {
        Self {
            id,
            description,
            location,
            url,
        }
    }
}

/// A comment attached to a feed image. Display-only; comments are fetched
/// fresh on every view and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageComment {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
}
