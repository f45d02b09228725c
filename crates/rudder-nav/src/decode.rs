//! Stream decoder seam.
//!
//! The real wire format belongs to the rendering stack; the controller only
//! needs something that turns a pending response into a [`ContentEntry`] and
//! encodes action arguments. [`JsonStreamDecoder`] reads a plain
//! `{"root": ..., "returnValue": ...}` document.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use rudder_core::{ClientError, ContentEntry, DecodedContent, Result};
use serde_json::Value;
use tracing::debug;

use crate::stream::StreamedResponse;

/// A response that may not have arrived yet.
pub type ResponseFuture = BoxFuture<'static, Result<StreamedResponse>>;

/// Turns streamed responses into decoded content.
#[async_trait]
pub trait StreamDecoder: Send + Sync {
    /// Start decoding `response` and return a handle on the eventual content.
    ///
    /// Decoding must begin without waiting for a reader. Transport failures
    /// of `response` surface through the returned entry.
    fn decode(&self, response: ResponseFuture) -> ContentEntry;

    /// Encode action arguments into a request body.
    async fn encode_arguments(&self, args: &[Value]) -> Result<Bytes>;
}

/// Decoder for a single JSON document per response.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonStreamDecoder;

impl JsonStreamDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self
    }

    /// Parse a complete body.
    pub fn parse(body: &[u8]) -> Result<DecodedContent> {
        serde_json::from_slice(body).map_err(|e| ClientError::StreamDecode(e.to_string()))
    }
}

#[async_trait]
impl StreamDecoder for JsonStreamDecoder {
    fn decode(&self, response: ResponseFuture) -> ContentEntry {
        ContentEntry::spawn(async move {
            let response = response.await?;
            let url = response.url().to_owned();
            let body = response.bytes().await?;
            debug!(url = %url, bytes = body.len(), "decoding content");
            Self::parse(&body)
        })
    }

    async fn encode_arguments(&self, args: &[Value]) -> Result<Bytes> {
        serde_json::to_vec(args)
            .map(Bytes::from)
            .map_err(|e| ClientError::StreamDecode(format!("failed to encode arguments: {e}")))
    }
}
