//! Decoded content and the lazily-resolving cache entry that wraps it.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::{ClientError, Result};

/// Fully decoded server payload.
///
/// `root` is the renderable tree; `return_value` is only present for action
/// responses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedContent {
    /// Renderable UI tree.
    pub root: Value,
    /// Result of a server action, if this payload answered one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,
}

impl DecodedContent {
    /// Content with a root tree and no action result.
    pub fn with_root(root: Value) -> Self {
        Self {
            root,
            return_value: None,
        }
    }
}

type SharedContent = Shared<BoxFuture<'static, Result<Arc<DecodedContent>>>>;

/// Handle on decoded content that may still be resolving.
///
/// Clones share one underlying future, so the payload is decoded once no
/// matter how many readers await it. Two handles are the [`same`] entry only
/// if one was cloned from the other.
///
/// [`same`]: ContentEntry::same
#[derive(Clone)]
pub struct ContentEntry {
    inner: Arc<SharedContent>,
}

impl ContentEntry {
    /// Start decoding on the runtime immediately and return a handle to the
    /// eventual result. Must be called from within a tokio runtime.
    pub fn spawn<F>(decode: F) -> Self
    where
        F: Future<Output = Result<DecodedContent>> + Send + 'static,
    {
        let task = tokio::spawn(decode);
        Self::from_future(async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "decode task did not complete");
                    Err(ClientError::StreamDecode(format!("decode task failed: {e}")))
                }
            }
        })
    }

    /// Wrap a future without spawning it. It only makes progress while
    /// someone awaits the entry.
    pub fn from_future<F>(decode: F) -> Self
    where
        F: Future<Output = Result<DecodedContent>> + Send + 'static,
    {
        let fut: BoxFuture<'static, Result<Arc<DecodedContent>>> =
            decode.map(|result| result.map(Arc::new)).boxed();
        Self {
            inner: Arc::new(fut.shared()),
        }
    }

    /// An entry that is already resolved.
    pub fn ready(content: DecodedContent) -> Self {
        Self::from_future(futures::future::ready(Ok(content)))
    }

    /// An entry that has already failed.
    pub fn failed(error: ClientError) -> Self {
        Self::from_future(futures::future::ready(Err(error)))
    }

    /// Wait for the decoded content. Every caller sees the same result.
    pub async fn resolve(&self) -> Result<Arc<DecodedContent>> {
        (*self.inner).clone().await
    }

    /// The result if decoding has finished. Never waits.
    pub fn peek(&self) -> Option<Result<Arc<DecodedContent>>> {
        (*self.inner).clone().now_or_never()
    }

    /// Whether both handles refer to the same underlying entry.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ContentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.peek() {
            None => "pending",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ContentEntry").field("state", &state).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
