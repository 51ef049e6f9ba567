use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::transport_error;
use crate::error::{Error, Result};
use crate::feed::FeedImage;
use crate::loader::FeedLoader;

/// Loads the image feed from the remote API.
///
/// Transport failures surface as connectivity errors; anything else that is
/// not a 200 with a well-formed payload is invalid data.
#[derive(Debug, Clone)]
pub struct RemoteFeedLoader {
    client: Client,
    url: Url,
}

/// Wire shape of the feed endpoint: a single `items` array.
#[derive(Debug, Deserialize)]
struct FeedPayload {
    items: Vec<RemoteFeedItem>,
}

#[derive(Debug, Deserialize)]
struct RemoteFeedItem {
    id: Uuid,
    description: Option<String>,
    location: Option<String>,
    url: Url,
}

impl RemoteFeedItem {
    fn into_image(self) -> FeedImage {
        FeedImage {
            id: self.id,
            description: self.description,
            location: self.location,
            url: self.url,
        }
    }
}

impl RemoteFeedLoader {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    async fn fetch(&self) -> Result<Vec<FeedImage>> {
        debug!(url = %self.url, "fetching remote feed");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| transport_error("feed request failed", err))?;

        if response.status() != StatusCode::OK {
            return Err(Error::InvalidData(format!(
                "unexpected HTTP {} from the feed endpoint",
                response.status().as_u16()
            )));
        }

        let payload: FeedPayload = response
            .json()
            .await
            .map_err(|err| Error::InvalidData(format!("undecodable feed payload: {err}")))?;

        debug!(items = payload.items.len(), "remote feed decoded");
        Ok(payload
            .items
            .into_iter()
            .map(RemoteFeedItem::into_image)
            .collect())
    }
}

#[async_trait]
impl FeedLoader for RemoteFeedLoader {
    async fn load(&self) -> Result<Vec<FeedImage>> {
        self.fetch().await
    }
}
