pub mod comments;
pub mod feed;
pub mod image_data;

pub use comments::RemoteCommentsLoader;
pub use feed::RemoteFeedLoader;
pub use image_data::RemoteImageDataLoader;

use std::time::Duration;

use reqwest::Client;

use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str =
    concat!("feedvault/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the remote loaders.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .gzip(true)
        .build()
        .map_err(|err| Error::Config(format!("failed to build HTTP client: {err}")))
}

/// Map a transport-level failure onto the crate error kinds: timeouts keep
/// their own variant, everything else is a connectivity failure.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("{context}: {err}"))
    } else {
        Error::Connectivity(format!("{context}: {err}"))
    }
}
