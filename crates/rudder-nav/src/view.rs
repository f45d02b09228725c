//! What a renderer shows for the current cache entry.

use std::sync::Arc;

use rudder_core::{ClientError, DecodedContent, Result};

/// Generic message shown when content cannot be rendered.
pub const FALLBACK_MESSAGE: &str = "Something went wrong!";

/// Renderable view of a cache entry.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentView {
    /// Content is still streaming in.
    Loading,
    /// Content is decoded.
    Ready(Arc<DecodedContent>),
    /// Fetching or decoding failed; show the fallback.
    Failed {
        /// User-facing message.
        message: &'static str,
        /// Underlying error.
        error: ClientError,
    },
}

impl ContentView {
    /// View for a finished decode.
    pub fn from_result(result: Result<Arc<DecodedContent>>) -> Self {
        match result {
            Ok(content) => Self::Ready(content),
            Err(error) => Self::Failed {
                message: FALLBACK_MESSAGE,
                error,
            },
        }
    }

    /// View for a decode that may not have finished.
    pub fn from_peek(peeked: Option<Result<Arc<DecodedContent>>>) -> Self {
        peeked.map_or(Self::Loading, Self::from_result)
    }

    /// Rendered tree, if ready.
    pub fn root(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Ready(content) => Some(&content.root),
            _ => None,
        }
    }
}
