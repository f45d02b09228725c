//! Navigation controller: owns the current key and arbitrates races.
//!
//! Every navigation event (user navigation or history traversal) mints a
//! [`NavToken`]. Only the most recently minted token may write history or
//! publish a current key; older flows keep running but their effects are
//! dropped. The check and the effects it guards run inside one critical
//! section on the token lock, so no newer event can slip in between them.
//!
//! Per-flow ordering for user navigation:
//! fetch → decode start → history write → cache insert → stream completion →
//! current-key publish.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use rudder_core::{ClientError, ContentEntry, NavToken, NavigationKey, Result};
use rudder_settings::NavigationSettings;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::cache::ContentCache;
use crate::decode::StreamDecoder;
use crate::events::{NavEvent, NavEventEmitter};
use crate::fetch::ContentFetcher;
use crate::history::{
    History, HistoryLocation, HistoryState, LocationProvider, PopStateEvent, PopStateReceiver,
};
use crate::router::RouterHandle;
use crate::state::{RouterState, RouterUpdate};
use crate::stream::StreamCompletion;

/// Options for [`NavigationController::navigate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigateOptions {
    /// Options that replace the current entry.
    pub fn replace() -> Self {
        Self { replace: true }
    }
}

/// How a navigation flow ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// `key` became the current key.
    Activated {
        /// Now-current key.
        key: NavigationKey,
        /// Whether content came from the cache without a fetch.
        from_cache: bool,
    },
    /// A later navigation event took over before this one could publish.
    Superseded,
}

/// Handle to a spawned navigation flow.
pub type NavigationTask = JoinHandle<Result<NavigationOutcome>>;

/// Builder for [`NavigationController`].
pub struct ControllerBuilder {
    history: Arc<dyn History>,
    fetcher: Arc<dyn ContentFetcher>,
    decoder: Arc<dyn StreamDecoder>,
    cache: ContentCache,
    location: Option<Arc<dyn LocationProvider>>,
    settings: NavigationSettings,
}

impl ControllerBuilder {
    /// Share an existing cache instead of creating a new one.
    #[must_use]
    pub fn cache(mut self, cache: ContentCache) -> Self {
        self.cache = cache;
        self
    }

    /// Source of the current location for action calls. Defaults to the
    /// history's current entry.
    #[must_use]
    pub fn location_provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location = Some(provider);
        self
    }

    /// Navigation behavior settings.
    #[must_use]
    pub fn settings(mut self, settings: NavigationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Perform the initial load and return the running controller.
    ///
    /// Fetches the history's current location and caches it under the key in
    /// the current history state, or under a fresh key that is written back
    /// with `replace_state` (no new entry is pushed). The initial key is
    /// current immediately; readers suspend on its entry until it resolves.
    /// Must be called from within a tokio runtime.
    pub fn bootstrap(self) -> NavigationController {
        let location = self.history.location();
        let fetcher = Arc::clone(&self.fetcher);
        let fetch_location = location.clone();
        let entry = self
            .decoder
            .decode(async move { fetcher.fetch_content(&fetch_location).await }.boxed());

        let key = if let Some(state) = self.history.state() {
            state.key
        } else {
            let key = NavigationKey::generate();
            self.history
                .replace_state(HistoryState::new(key.clone()), None);
            key
        };
        self.cache.set(key.clone(), entry);
        info!(location = %location, key = %key, "initial content requested");

        let (state, _) = watch::channel(RouterState::initial(location, key));
        let location_provider = self
            .location
            .unwrap_or_else(|| Arc::new(HistoryLocation(Arc::clone(&self.history))));

        NavigationController {
            inner: Arc::new(Inner {
                cache: self.cache,
                history: self.history,
                location: location_provider,
                fetcher: self.fetcher,
                decoder: self.decoder,
                events: NavEventEmitter::with_capacity(self.settings.event_capacity),
                settings: self.settings,
                latest: Mutex::new(NavToken::INITIAL),
                state,
            }),
        }
    }
}

/// Owns the current key and the navigation token; see the module docs.
///
/// Cheap to clone; clones drive the same controller.
#[derive(Clone)]
pub struct NavigationController {
    inner: Arc<Inner>,
}

struct Inner {
    cache: ContentCache,
    history: Arc<dyn History>,
    location: Arc<dyn LocationProvider>,
    fetcher: Arc<dyn ContentFetcher>,
    decoder: Arc<dyn StreamDecoder>,
    settings: NavigationSettings,
    latest: Mutex<NavToken>,
    state: watch::Sender<RouterState>,
    events: NavEventEmitter,
}

impl NavigationController {
    /// Start building a controller over the given collaborators.
    pub fn builder(
        history: Arc<dyn History>,
        fetcher: Arc<dyn ContentFetcher>,
        decoder: Arc<dyn StreamDecoder>,
    ) -> ControllerBuilder {
        ControllerBuilder {
            history,
            fetcher,
            decoder,
            cache: ContentCache::new(),
            location: None,
            settings: NavigationSettings::default(),
        }
    }

    /// Render-facing handle.
    pub fn handle(&self) -> RouterHandle {
        RouterHandle::new(self.clone(), self.inner.state.subscribe())
    }

    /// The content cache.
    pub fn cache(&self) -> &ContentCache {
        &self.inner.cache
    }

    /// Snapshot of the router state.
    pub fn state(&self) -> RouterState {
        self.inner.state.borrow().clone()
    }

    /// Key currently displayed.
    pub fn current_key(&self) -> NavigationKey {
        self.inner.state.borrow().content_key.clone()
    }

    /// Watch router state changes.
    pub fn watch_state(&self) -> watch::Receiver<RouterState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to controller side-effect events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<NavEvent> {
        self.inner.events.subscribe()
    }

    /// Most recently minted navigation token.
    pub fn latest_token(&self) -> NavToken {
        *self.inner.latest.lock()
    }

    /// Navigate to `location`.
    ///
    /// The token is minted before this returns, so navigations supersede each
    /// other in call order. The returned task resolves once the flow has
    /// either published its key or been superseded.
    pub fn navigate(&self, location: impl Into<String>, options: NavigateOptions) -> NavigationTask {
        let location = location.into();
        let token = self.inner.begin(&location);
        let key = NavigationKey::generate();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_navigation(token, key, location, options).await })
    }

    /// React to a history traversal (back/forward).
    ///
    /// Mints a token immediately, superseding any in-flight navigation.
    pub fn handle_pop_state(&self, event: PopStateEvent) -> NavigationTask {
        let token = self.inner.begin(&event.location);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_pop_state(token, event).await })
    }

    /// Forward pop-state events to [`handle_pop_state`] until `cancel` fires
    /// or the history is dropped.
    ///
    /// [`handle_pop_state`]: NavigationController::handle_pop_state
    pub fn spawn_pop_state_listener(
        &self,
        mut events: PopStateReceiver,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            // Flows report through events and state; nobody awaits them here.
                            drop(controller.handle_pop_state(event));
                        }
                        None => break,
                    },
                }
            }
            debug!("pop-state listener stopped");
        })
    }

    /// Invoke a server action from the current location.
    ///
    /// The response is cached under the current history entry's key as soon
    /// as it arrives. Once its stream completes, that key is published as
    /// current with a new revision, unless a navigation started in the
    /// meantime. Returns the action's decoded return value.
    ///
    /// Location and key both come from the current history entry. While a
    /// navigation is pending after its history write, that is the pending
    /// entry, so the action answers for the page being navigated to.
    #[instrument(skip(self, args), fields(arg_count = args.len()))]
    pub async fn call_action(&self, action_id: &str, args: &[Value]) -> Result<Option<Value>> {
        let inner = &self.inner;
        let location = inner.location.current_location();
        let token = *inner.latest.lock();
        let key = inner
            .history
            .state()
            .map_or_else(NavigationKey::generate, |s| s.key);

        let body = inner.decoder.encode_arguments(args).await?;
        let response = inner
            .fetcher
            .invoke_action(&location, action_id, body)
            .await
            .inspect_err(|e| warn!(action_id, error = %e, "action request failed"))?;
        let (copy, completion) = response.tee();
        let entry = inner.decoder.decode(futures::future::ready(Ok(copy)).boxed());
        inner.cache.set(key.clone(), entry.clone());
        let _ = inner.events.emit(NavEvent::ContentCached { key: key.clone() });

        let finisher = Arc::clone(inner);
        drop(tokio::spawn(async move {
            finisher.await_stream(&key, completion).await;
            let published = finisher.with_latest(token, || {
                let location = finisher.state.borrow().location.clone();
                finisher.dispatch(RouterUpdate::Refreshed { key: key.clone() });
                let _ = finisher.events.emit(NavEvent::KeyActivated {
                    key: key.clone(),
                    location,
                });
            });
            if published.is_none() {
                debug!(key = %key, "navigation started during action, keeping current key");
            }
        }));

        let content = entry.resolve().await?;
        Ok(content.return_value.clone())
    }
}

impl Inner {
    /// Mint a token and publish the requested location in one step.
    fn begin(&self, location: &str) -> NavToken {
        let mut latest = self.latest.lock();
        let token = latest.next();
        *latest = token;
        self.dispatch(RouterUpdate::Requested {
            location: location.to_owned(),
        });
        let _ = self.events.emit(NavEvent::NavigationStarted {
            token,
            location: location.to_owned(),
        });
        debug!(%token, location, "navigation started");
        token
    }

    /// Run `effects` only if `token` is still the latest. The token lock is
    /// held throughout, so no event can be minted in between.
    fn with_latest<R>(&self, token: NavToken, effects: impl FnOnce() -> R) -> Option<R> {
        let latest = self.latest.lock();
        if *latest != token {
            return None;
        }
        let result = effects();
        drop(latest);
        Some(result)
    }

    fn dispatch(&self, update: RouterUpdate) {
        self.state.send_modify(|state| state.apply(update));
    }

    fn activate(&self, key: &NavigationKey, location: &str) {
        self.dispatch(RouterUpdate::Activated {
            key: key.clone(),
            location: location.to_owned(),
        });
        let _ = self.events.emit(NavEvent::KeyActivated {
            key: key.clone(),
            location: location.to_owned(),
        });
        info!(key = %key, location, "content key activated");
    }

    fn superseded(&self, token: NavToken, location: &str) -> NavigationOutcome {
        debug!(%token, location, "navigation superseded");
        let _ = self.events.emit(NavEvent::NavigationSuperseded {
            token,
            location: location.to_owned(),
        });
        NavigationOutcome::Superseded
    }

    fn fail(&self, token: NavToken, location: &str, error: &ClientError) {
        warn!(%token, location, error = %error, "navigation failed");
        let _ = self.with_latest(token, || {
            self.dispatch(RouterUpdate::Abandoned);
            let _ = self.events.emit(NavEvent::NavigationFailed {
                token,
                location: location.to_owned(),
                category: error.category(),
            });
        });
    }

    /// Wait for a body to drain. A broken stream still counts as finished:
    /// the decoded entry carries the error to whoever renders it.
    async fn await_stream(&self, key: &NavigationKey, completion: StreamCompletion) {
        match completion.finished().await {
            Ok(bytes) => {
                let _ = self.events.emit(NavEvent::StreamFinished {
                    key: key.clone(),
                    bytes,
                });
            }
            Err(e) => warn!(key = %key, error = %e, "content stream ended with an error"),
        }
    }

    #[instrument(skip_all, fields(%token, key = %key, location = %location))]
    async fn run_navigation(
        self: Arc<Self>,
        token: NavToken,
        key: NavigationKey,
        location: String,
        options: NavigateOptions,
    ) -> Result<NavigationOutcome> {
        let response = match self.fetcher.fetch_content(&location).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(token, &location, &e);
                return Err(e);
            }
        };
        let (copy, completion) = response.tee();
        let entry: ContentEntry = self.decoder.decode(futures::future::ready(Ok(copy)).boxed());

        let committed = self.with_latest(token, || {
            let state = HistoryState::new(key.clone());
            if options.replace {
                self.history.replace_state(state, Some(&location));
                let _ = self.events.emit(NavEvent::HistoryReplaced {
                    key: key.clone(),
                    location: location.clone(),
                });
            } else {
                self.history.push_state(state, &location);
                let _ = self.events.emit(NavEvent::HistoryPushed {
                    key: key.clone(),
                    location: location.clone(),
                });
            }
            self.cache.set(key.clone(), entry);
            let _ = self.events.emit(NavEvent::ContentCached { key: key.clone() });
        });
        if committed.is_none() {
            return Ok(self.superseded(token, &location));
        }

        self.await_stream(&key, completion).await;

        match self.with_latest(token, || self.activate(&key, &location)) {
            Some(()) => Ok(NavigationOutcome::Activated {
                key,
                from_cache: false,
            }),
            None => Ok(self.superseded(token, &location)),
        }
    }

    #[instrument(skip_all, fields(%token, location = %event.location))]
    async fn run_pop_state(
        self: Arc<Self>,
        token: NavToken,
        event: PopStateEvent,
    ) -> Result<NavigationOutcome> {
        let location = event.location;
        let key = match event.state {
            Some(state) => state.key,
            None => self.adopt_untracked_entry(token, &location),
        };

        if self.cache.has(&key) {
            let activated = self.with_latest(token, || self.activate(&key, &location));
            if activated.is_none() {
                return Ok(self.superseded(token, &location));
            }
            if self.settings.revalidate_on_pop {
                drop(tokio::spawn(Arc::clone(&self).revalidate(key.clone(), location)));
            }
            return Ok(NavigationOutcome::Activated {
                key,
                from_cache: true,
            });
        }

        let response = match self.fetcher.fetch_content(&location).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(token, &location, &e);
                return Err(e);
            }
        };
        let (copy, completion) = response.tee();
        let entry = self.decoder.decode(futures::future::ready(Ok(copy)).boxed());
        // A look-ahead write may already have populated this key.
        if self.cache.set_if_absent(key.clone(), entry) {
            let _ = self.events.emit(NavEvent::ContentCached { key: key.clone() });
        }

        self.await_stream(&key, completion).await;

        match self.with_latest(token, || self.activate(&key, &location)) {
            Some(()) => Ok(NavigationOutcome::Activated {
                key,
                from_cache: false,
            }),
            None => Ok(self.superseded(token, &location)),
        }
    }

    /// Mint a key for a history entry created before the controller existed
    /// and record it in that entry so later traversals find it.
    fn adopt_untracked_entry(&self, token: NavToken, location: &str) -> NavigationKey {
        let key = NavigationKey::generate();
        let _ = self.with_latest(token, || {
            if self.history.state().is_none() && self.history.location() == location {
                self.history
                    .replace_state(HistoryState::new(key.clone()), None);
                let _ = self.events.emit(NavEvent::HistoryReplaced {
                    key: key.clone(),
                    location: location.to_owned(),
                });
            }
        });
        key
    }

    /// Refetch `location` and swap the fresh entry in under `key` once its
    /// stream has completed.
    async fn revalidate(self: Arc<Self>, key: NavigationKey, location: String) {
        let response = match self.fetcher.fetch_content(&location).await {
            Ok(response) => response,
            Err(e) => {
                warn!(key = %key, location = %location, error = %e, "revalidation failed");
                return;
            }
        };
        let (copy, completion) = response.tee();
        let entry = self.decoder.decode(futures::future::ready(Ok(copy)).boxed());
        self.await_stream(&key, completion).await;
        self.cache.set(key.clone(), entry);
        let _ = self.events.emit(NavEvent::ContentCached { key: key.clone() });
        self.dispatch(RouterUpdate::Revalidated { key: key.clone() });
        debug!(key = %key, location = %location, "cached content revalidated");
    }
}
