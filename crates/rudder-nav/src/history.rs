//! Session history seam.
//!
//! [`History`] mirrors the browser history API the controller relies on:
//! read the current entry, push or replace entries, and get notified on
//! back/forward through [`PopStateEvent`]s. [`MemoryHistory`] is an
//! in-process implementation with an entry stack and a cursor.

use std::sync::Arc;

use parking_lot::Mutex;
use rudder_core::NavigationKey;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// State record stored with every history entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    /// Key of the content shown for this entry.
    pub key: NavigationKey,
}

impl HistoryState {
    /// State for `key`.
    pub fn new(key: NavigationKey) -> Self {
        Self { key }
    }
}

/// Fired after the history cursor moved by back/forward/go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopStateEvent {
    /// Location of the entry that is now current.
    pub location: String,
    /// State of that entry, if it has one.
    pub state: Option<HistoryState>,
}

/// Receiving half of a history's pop-state notifications.
pub type PopStateReceiver = mpsc::UnboundedReceiver<PopStateEvent>;

/// Browser-style session history.
pub trait History: Send + Sync {
    /// Location of the current entry.
    fn location(&self) -> String;

    /// State of the current entry.
    fn state(&self) -> Option<HistoryState>;

    /// Add an entry after the current one, discarding forward entries.
    fn push_state(&self, state: HistoryState, location: &str);

    /// Replace the current entry's state, and its location if given.
    fn replace_state(&self, state: HistoryState, location: Option<&str>);
}

/// Supplies the location actions are invoked from.
///
/// Injected so async flows read the live location instead of one captured
/// when the flow started.
pub trait LocationProvider: Send + Sync {
    /// The location currently shown in the address bar.
    fn current_location(&self) -> String;
}

/// [`LocationProvider`] that reads the current history entry.
pub struct HistoryLocation(pub Arc<dyn History>);

impl LocationProvider for HistoryLocation {
    fn current_location(&self) -> String {
        self.0.location()
    }
}

#[derive(Clone, Debug)]
struct Entry {
    location: String,
    state: Option<HistoryState>,
}

#[derive(Debug)]
struct Entries {
    stack: Vec<Entry>,
    cursor: usize,
}

impl Entries {
    fn push(&mut self, entry: Entry) {
        let keep = self.cursor + 1;
        self.stack.truncate(keep);
        self.stack.push(entry);
        self.cursor = keep;
    }
}

/// In-memory history with a cursor and pop-state notifications.
pub struct MemoryHistory {
    entries: Mutex<Entries>,
    pop_tx: mpsc::UnboundedSender<PopStateEvent>,
}

impl MemoryHistory {
    /// Start a history with a single stateless entry at `location`.
    pub fn new(location: impl Into<String>) -> (Self, PopStateReceiver) {
        let (pop_tx, pop_rx) = mpsc::unbounded_channel();
        let history = Self {
            entries: Mutex::new(Entries {
                stack: vec![Entry {
                    location: location.into(),
                    state: None,
                }],
                cursor: 0,
            }),
            pop_tx,
        };
        (history, pop_rx)
    }

    /// Move back one entry. Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Move forward one entry. Returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move the cursor by `delta` and fire a pop-state event.
    ///
    /// Out-of-range moves and `delta == 0` do nothing and return `false`.
    pub fn go(&self, delta: isize) -> bool {
        let event = {
            let mut entries = self.entries.lock();
            let Some(target) = entries.cursor.checked_add_signed(delta) else {
                return false;
            };
            if delta == 0 || target >= entries.stack.len() {
                return false;
            }
            entries.cursor = target;
            let entry = &entries.stack[target];
            PopStateEvent {
                location: entry.location.clone(),
                state: entry.state.clone(),
            }
        };
        debug!(location = %event.location, delta, "history traversal");
        // A closed receiver means nobody listens; the cursor still moved.
        let _ = self.pop_tx.send(event);
        true
    }

    /// Push an entry with no state, as a host does for navigations the
    /// controller did not initiate. Forward entries are discarded.
    pub fn push_untracked(&self, location: &str) {
        self.entries.lock().push(Entry {
            location: location.to_owned(),
            state: None,
        });
    }

    /// Number of entries in the stack.
    pub fn len(&self) -> usize {
        self.entries.lock().stack.len()
    }

    /// Whether the stack is empty. Always `false`; a history has an entry.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().stack.is_empty()
    }

    /// Index of the current entry.
    pub fn cursor(&self) -> usize {
        self.entries.lock().cursor
    }

    /// Locations of all entries, oldest first.
    pub fn locations(&self) -> Vec<String> {
        self.entries
            .lock()
            .stack
            .iter()
            .map(|e| e.location.clone())
            .collect()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        let entries = self.entries.lock();
        entries.stack[entries.cursor].location.clone()
    }

    fn state(&self) -> Option<HistoryState> {
        let entries = self.entries.lock();
        entries.stack[entries.cursor].state.clone()
    }

    fn push_state(&self, state: HistoryState, location: &str) {
        self.entries.lock().push(Entry {
            location: location.to_owned(),
            state: Some(state),
        });
    }

    fn replace_state(&self, state: HistoryState, location: Option<&str>) {
        let mut entries = self.entries.lock();
        let cursor = entries.cursor;
        let entry = &mut entries.stack[cursor];
        entry.state = Some(state);
        if let Some(location) = location {
            location.clone_into(&mut entry.location);
        }
    }
}

impl LocationProvider for MemoryHistory {
    fn current_location(&self) -> String {
        self.location()
    }
}
