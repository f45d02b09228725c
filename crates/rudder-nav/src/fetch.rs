//! Content and action transport.
//!
//! [`ContentFetcher`] is the seam the controller talks to; [`HttpFetcher`] is
//! the reqwest implementation against the content server.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use rudder_core::{ClientError, Result};
use rudder_settings::ServerSettings;
use tracing::{debug, instrument, warn};

use crate::stream::StreamedResponse;

/// Issues content and action requests.
///
/// Implementations return as soon as response headers are available; the
/// body keeps streaming through the returned [`StreamedResponse`].
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// `GET` the serialized tree for `location`.
    async fn fetch_content(&self, location: &str) -> Result<StreamedResponse>;

    /// `POST` an action invocation from `location` with encoded arguments.
    async fn invoke_action(
        &self,
        location: &str,
        action_id: &str,
        body: Bytes,
    ) -> Result<StreamedResponse>;
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    client: Client,
    config: ServerSettings,
}

impl HttpFetcher {
    /// Build a fetcher with its own connection pool.
    pub fn new(config: ServerSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: Client, config: ServerSettings) -> Self {
        Self { client, config }
    }

    /// URL for the content of `location`.
    pub fn content_url(&self, location: &str) -> String {
        join_url(&self.config.base_url, &self.config.content_path, location)
    }

    /// URL for an action invoked from `location`.
    pub fn action_url(&self, location: &str) -> String {
        join_url(&self.config.base_url, &self.config.action_path, location)
    }

    fn into_streamed(url: String, response: reqwest::Response) -> Result<StreamedResponse> {
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "content server returned error status");
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClientError::Network(e.to_string())))
            .boxed();
        Ok(StreamedResponse::new(url, status.as_u16(), body))
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    #[instrument(skip_all, fields(location = %location))]
    async fn fetch_content(&self, location: &str) -> Result<StreamedResponse> {
        let url = self.content_url(location);
        debug!(url = %url, "fetching content");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, &self.config.accept)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Self::into_streamed(url, response)
    }

    #[instrument(skip_all, fields(location = %location, action_id = %action_id))]
    async fn invoke_action(
        &self,
        location: &str,
        action_id: &str,
        body: Bytes,
    ) -> Result<StreamedResponse> {
        let url = self.action_url(location);
        debug!(url = %url, bytes = body.len(), "invoking action");
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, &self.config.accept)
            .header(self.config.action_header.as_str(), action_id)
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Self::into_streamed(url, response)
    }
}

fn join_url(base: &str, prefix: &str, location: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = prefix.trim_end_matches('/');
    if location.starts_with('/') {
        format!("{base}{prefix}{location}")
    } else {
        format!("{base}{prefix}/{location}")
    }
}
