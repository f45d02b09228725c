//! Render-facing router handle.
//!
//! Exposes the deferred-currency view of navigation: the displayed
//! `location`, the `next_location` being settled, `is_pending`, plus access
//! to the current cache entry.

use rudder_core::{ContentEntry, Result};
use serde_json::Value;
use tokio::sync::watch;

use crate::controller::{NavigateOptions, NavigationController, NavigationTask};
use crate::state::RouterState;
use crate::view::ContentView;

/// Handle given to the render root.
#[derive(Clone)]
pub struct RouterHandle {
    controller: NavigationController,
    state: watch::Receiver<RouterState>,
}

impl RouterHandle {
    pub(crate) fn new(controller: NavigationController, state: watch::Receiver<RouterState>) -> Self {
        Self { controller, state }
    }

    /// Snapshot of the full router state.
    pub fn state(&self) -> RouterState {
        self.state.borrow().clone()
    }

    /// Location whose content is displayed.
    pub fn location(&self) -> String {
        self.state.borrow().location.clone()
    }

    /// Location being navigated to while pending, else the displayed one.
    pub fn next_location(&self) -> String {
        self.state.borrow().effective_next_location().to_owned()
    }

    /// Whether a navigation is still settling.
    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending
    }

    /// Start a navigation.
    pub fn navigate(&self, location: impl Into<String>, options: NavigateOptions) -> NavigationTask {
        self.controller.navigate(location, options)
    }

    /// Invoke a server action; see [`NavigationController::call_action`].
    pub async fn call_action(&self, action_id: &str, args: &[Value]) -> Result<Option<Value>> {
        self.controller.call_action(action_id, args).await
    }

    /// Cache entry for the current key.
    pub fn current_content(&self) -> Result<ContentEntry> {
        let key = self.state.borrow().content_key.clone();
        self.controller.cache().get(&key)
    }

    /// Non-blocking view of the current content.
    pub fn view(&self) -> ContentView {
        match self.current_content() {
            Ok(entry) => ContentView::from_peek(entry.peek()),
            Err(e) => ContentView::from_result(Err(e)),
        }
    }

    /// Wait for the current content and return its view.
    pub async fn resolve_view(&self) -> ContentView {
        match self.current_content() {
            Ok(entry) => ContentView::from_result(entry.resolve().await),
            Err(e) => ContentView::from_result(Err(e)),
        }
    }

    /// Independent receiver for router state changes.
    pub fn subscribe(&self) -> watch::Receiver<RouterState> {
        self.state.clone()
    }

    /// Wait until the router state changes. Returns `false` once the
    /// controller is gone.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }
}
