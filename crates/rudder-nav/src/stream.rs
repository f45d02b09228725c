//! Streamed response bodies and the completion signal.
//!
//! Decoding consumes one copy of the body while a second consumer drains the
//! original to learn when the stream has fully landed. [`StreamedResponse::tee`]
//! produces both from a single network body.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use rudder_core::{ClientError, Result};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

/// Body chunks as they arrive from the network.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// A response whose headers have arrived and whose body may still be arriving.
pub struct StreamedResponse {
    url: String,
    status: u16,
    body: BodyStream,
}

impl StreamedResponse {
    /// Wrap a status and body stream.
    pub fn new(url: impl Into<String>, status: u16, body: BodyStream) -> Self {
        Self {
            url: url.into(),
            status,
            body,
        }
    }

    /// A `200` response with a body that is already complete.
    pub fn from_bytes(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let chunk: Bytes = body.into();
        Self::new(url, 200, futures::stream::once(async move { Ok(chunk) }).boxed())
    }

    /// Requested URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Take the body stream.
    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Drain the body and return it as one buffer.
    pub async fn bytes(self) -> Result<Bytes> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }

    /// Drain the body as UTF-8 text.
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ClientError::StreamDecode(format!("body is not UTF-8: {e}")))
    }

    /// Split into a copy for the decoder and a completion signal.
    ///
    /// A pump task reads the original body to exhaustion, forwarding every
    /// chunk to the copy. The completion resolves once the original body ends,
    /// whether or not the decoder has read its copy yet. Must be called from
    /// within a tokio runtime.
    pub fn tee(self) -> (StreamedResponse, StreamCompletion) {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<Result<Bytes>>();
        let (done_tx, done_rx) = oneshot::channel();
        let url = self.url.clone();
        let mut body = self.body;

        let pump_url = url.clone();
        drop(tokio::spawn(async move {
            let mut total: u64 = 0;
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        total += bytes.len() as u64;
                        // The decoder may have dropped its copy; keep draining.
                        let _ = chunk_tx.send(Ok(bytes));
                    }
                    Err(e) => {
                        warn!(url = %pump_url, error = %e, "response stream failed");
                        let _ = chunk_tx.send(Err(e.clone()));
                        let _ = done_tx.send(Err(e));
                        return;
                    }
                }
            }
            debug!(url = %pump_url, bytes = total, "response stream finished");
            drop(chunk_tx);
            let _ = done_tx.send(Ok(total));
        }));

        let copy = StreamedResponse::new(
            url.clone(),
            self.status,
            UnboundedReceiverStream::new(chunk_rx).boxed(),
        );
        (copy, StreamCompletion { url, rx: done_rx })
    }
}

impl std::fmt::Debug for StreamedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamedResponse")
            .field("url", &self.url)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Resolves once a teed response body has been fully consumed.
#[derive(Debug)]
pub struct StreamCompletion {
    url: String,
    rx: oneshot::Receiver<Result<u64>>,
}

impl StreamCompletion {
    /// Wait for the body to finish. Returns the number of bytes received.
    pub async fn finished(self) -> Result<u64> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Network(format!(
                "response stream for {} was dropped",
                self.url
            ))),
        }
    }
}
