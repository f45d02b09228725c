//! Router state and its reducer.
//!
//! Every change to what is displayed goes through [`RouterState::apply`], so
//! there is exactly one mutation path regardless of which flow (user
//! navigation, back/forward, action, revalidation) triggers it.

use rudder_core::NavigationKey;

/// Observable navigation state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouterState {
    /// Location whose content is displayed.
    pub location: String,
    /// Location most recently requested. Equals `location` once settled.
    pub next_location: String,
    /// Key whose cache entry is displayed.
    pub content_key: NavigationKey,
    /// A requested navigation has not been displayed yet.
    pub is_pending: bool,
    /// Bumped whenever the entry behind `content_key` is replaced in place.
    pub revision: u64,
}

impl RouterState {
    /// Settled state showing `key` at `location`.
    pub fn initial(location: impl Into<String>, key: NavigationKey) -> Self {
        let location = location.into();
        Self {
            next_location: location.clone(),
            location,
            content_key: key,
            is_pending: false,
            revision: 0,
        }
    }

    /// Target location while pending, otherwise the displayed one.
    pub fn effective_next_location(&self) -> &str {
        if self.is_pending {
            &self.next_location
        } else {
            &self.location
        }
    }

    /// Apply one update.
    pub fn apply(&mut self, update: RouterUpdate) {
        match update {
            RouterUpdate::Requested { location } => {
                self.next_location = location;
                self.is_pending = true;
            }
            RouterUpdate::Activated { key, location } => {
                self.content_key = key;
                self.location.clone_from(&location);
                self.next_location = location;
                self.is_pending = false;
            }
            RouterUpdate::Refreshed { key } => {
                self.content_key = key;
                self.revision += 1;
            }
            RouterUpdate::Abandoned => {
                self.next_location.clone_from(&self.location);
                self.is_pending = false;
            }
            RouterUpdate::Revalidated { key } => {
                if self.content_key == key {
                    self.revision += 1;
                }
            }
        }
    }
}

/// Inputs to the router reducer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouterUpdate {
    /// A navigation to `location` started.
    Requested {
        /// Requested location.
        location: String,
    },
    /// `key` is now displayed at `location`.
    Activated {
        /// Now-current key.
        key: NavigationKey,
        /// Displayed location.
        location: String,
    },
    /// `key` is now displayed at the unchanged location with fresh content
    /// (action results).
    Refreshed {
        /// Now-current key.
        key: NavigationKey,
    },
    /// The latest navigation failed; keep showing the current content.
    Abandoned,
    /// The entry for `key` was replaced with fresher content.
    Revalidated {
        /// Key whose entry changed.
        key: NavigationKey,
    },
}
