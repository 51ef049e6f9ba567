use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::transport_error;
use crate::error::{Error, Result};
use crate::feed::ImageComment;

/// Loads the comments for one feed image. Any 2xx with a well-formed
/// payload is accepted; comments are never cached.
#[derive(Debug, Clone)]
pub struct RemoteCommentsLoader {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct CommentsPayload {
    items: Vec<RemoteComment>,
}

#[derive(Debug, Deserialize)]
struct RemoteComment {
    id: Uuid,
    message: String,
    created_at: DateTime<Utc>,
    author: RemoteCommentAuthor,
}

#[derive(Debug, Deserialize)]
struct RemoteCommentAuthor {
    username: String,
}

impl RemoteComment {
    fn into_comment(self) -> ImageComment {
        ImageComment {
            id: self.id,
            message: self.message,
            created_at: self.created_at,
            username: self.author.username,
        }
    }
}

impl RemoteCommentsLoader {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self, image_id: Uuid) -> Result<Url> {
        self.base_url
            .join(&format!("image/{image_id}/comments"))
            .map_err(|err| Error::InvalidUrl(format!("bad comments endpoint: {err}")))
    }

    pub async fn load(&self, image_id: Uuid) -> Result<Vec<ImageComment>> {
        let url = self.endpoint(image_id)?;
        debug!(url = %url, "fetching image comments");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error("comments request failed", err))?;

        if !response.status().is_success() {
            return Err(Error::InvalidData(format!(
                "unexpected HTTP {} from the comments endpoint",
                response.status().as_u16()
            )));
        }

        let payload: CommentsPayload = response
            .json()
            .await
            .map_err(|err| Error::InvalidData(format!("undecodable comments payload: {err}")))?;

        Ok(payload
            .items
            .into_iter()
            .map(RemoteComment::into_comment)
            .collect())
    }
}
