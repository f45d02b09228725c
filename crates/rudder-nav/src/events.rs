//! Broadcast-based navigation event emitter.

use std::sync::atomic::{AtomicU64, Ordering};

use rudder_core::{NavToken, NavigationKey};
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Side effects performed by the navigation controller, in the order they
/// happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEvent {
    /// A navigation event minted a token.
    NavigationStarted {
        /// Minted token.
        token: NavToken,
        /// Requested location.
        location: String,
    },
    /// A later navigation took over; this one's effects were dropped.
    NavigationSuperseded {
        /// Token that lost.
        token: NavToken,
        /// Location it was heading to.
        location: String,
    },
    /// A new history entry was pushed.
    HistoryPushed {
        /// Key stored in the entry.
        key: NavigationKey,
        /// Entry location.
        location: String,
    },
    /// The current history entry was replaced.
    HistoryReplaced {
        /// Key stored in the entry.
        key: NavigationKey,
        /// Entry location.
        location: String,
    },
    /// An entry was written into the content cache.
    ContentCached {
        /// Cache key.
        key: NavigationKey,
    },
    /// A response body was fully consumed.
    StreamFinished {
        /// Key the response belongs to.
        key: NavigationKey,
        /// Body size.
        bytes: u64,
    },
    /// A key became the current key.
    KeyActivated {
        /// Now-current key.
        key: NavigationKey,
        /// Location shown with it.
        location: String,
    },
    /// A navigation failed before any effect was applied.
    NavigationFailed {
        /// Token of the failed navigation.
        token: NavToken,
        /// Requested location.
        location: String,
        /// Error category.
        category: &'static str,
    },
}

impl NavEvent {
    /// Event type string for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NavigationStarted { .. } => "navigation_started",
            Self::NavigationSuperseded { .. } => "navigation_superseded",
            Self::HistoryPushed { .. } => "history_pushed",
            Self::HistoryReplaced { .. } => "history_replaced",
            Self::ContentCached { .. } => "content_cached",
            Self::StreamFinished { .. } => "stream_finished",
            Self::KeyActivated { .. } => "key_activated",
            Self::NavigationFailed { .. } => "navigation_failed",
        }
    }
}

/// Broadcast-based event emitter.
///
/// Non-blocking: `emit` never awaits. Slow receivers are lagged rather than
/// blocking the controller.
pub struct NavEventEmitter {
    tx: broadcast::Sender<NavEvent>,
    emit_count: AtomicU64,
}

impl NavEventEmitter {
    /// Create a new emitter with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new emitter with a custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            emit_count: AtomicU64::new(0),
        }
    }

    /// Emit an event to all subscribers. Returns the number of receivers.
    pub fn emit(&self, event: NavEvent) -> usize {
        let _ = self.emit_count.fetch_add(1, Ordering::Relaxed);
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<NavEvent> {
        self.tx.subscribe()
    }

    /// Total number of events emitted.
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }
}

impl Default for NavEventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
