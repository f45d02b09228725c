//! Client error taxonomy.
//!
//! [`ClientError`] is `Clone` because a failed decode is stored inside a
//! shared content future and handed to every reader of that cache entry.
//! Superseded navigations are not errors and never appear here.

use thiserror::Error;

/// Errors surfaced by the content cache, fetchers, and decoders.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Cache lookup for a key that was never set.
    #[error("no cached content for key {key}")]
    NotFound {
        /// The missing navigation key.
        key: String,
    },

    /// The streamed payload was malformed or ended abnormally.
    #[error("stream decode failed: {0}")]
    StreamDecode(String),

    /// Transport-level failure (connect, read, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
}

impl ClientError {
    /// Build a [`ClientError::NotFound`] for `key`.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Whether this error came from the network layer rather than decoding.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::HttpStatus { .. })
    }

    /// Short machine-readable category for logs and events.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::StreamDecode(_) => "stream_decode",
            Self::Network(_) | Self::HttpStatus { .. } => "network",
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
