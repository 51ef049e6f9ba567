use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::transport_error;
use crate::error::{Error, Result};
use crate::loader::ImageDataLoader;

/// Loads the raw bytes behind a feed image URL from the remote host.
#[derive(Debug, Clone)]
pub struct RemoteImageDataLoader {
    client: Client,
}

impl RemoteImageDataLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageDataLoader for RemoteImageDataLoader {
    async fn load_image_data(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(url = %url, "fetching image data");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| transport_error("image request failed", err))?;

        if response.status() != StatusCode::OK {
            return Err(Error::InvalidData(format!(
                "unexpected HTTP {} for image {url}",
                response.status().as_u16()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|err| transport_error("image body read failed", err))?;

        // A 200 with no body is not an image.
        if data.is_empty() {
            return Err(Error::InvalidData(format!("empty image data from {url}")));
        }

        Ok(data.to_vec())
    }
}
