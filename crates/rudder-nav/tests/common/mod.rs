#![allow(dead_code, missing_docs)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use rudder_core::{ClientError, Result};
use rudder_nav::{
    ContentFetcher, JsonStreamDecoder, MemoryHistory, NavEvent, NavigationController,
    PopStateReceiver, StreamedResponse,
};
use serde_json::json;
use tokio::sync::{Notify, broadcast, mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Body for a page whose root is `{"page": name}`.
pub fn page(name: &str) -> String {
    json!({ "root": { "page": name } }).to_string()
}

/// A request whose headers and body the test releases by hand.
pub struct PendingResponse {
    headers: Option<oneshot::Sender<Result<()>>>,
    body: Option<mpsc::UnboundedSender<Result<Bytes>>>,
}

impl PendingResponse {
    /// Deliver the headers; the body stays open.
    pub fn respond(&mut self) {
        if let Some(tx) = self.headers.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Stream a chunk of the body.
    pub fn chunk(&self, data: &str) {
        if let Some(tx) = &self.body {
            let _ = tx.send(Ok(Bytes::from(data.to_owned())));
        }
    }

    /// Close the body.
    pub fn finish(mut self) {
        self.respond();
        self.body = None;
    }

    /// Deliver headers, the full body, and close it.
    pub fn complete(mut self, data: &str) {
        self.respond();
        self.chunk(data);
        self.finish();
    }

    /// Fail before headers arrive.
    pub fn fail(mut self, error: ClientError) {
        if let Some(tx) = self.headers.take() {
            let _ = tx.send(Err(error));
        }
    }
}

/// Fetcher whose responses are either canned or released by the test.
#[derive(Default)]
pub struct ScriptedFetcher {
    canned: Mutex<HashMap<String, String>>,
    pending: Mutex<HashMap<String, VecDeque<PendingResponse>>>,
    requests: Mutex<Vec<String>>,
    action_body: Mutex<Option<String>>,
    arrived: Notify,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request for `location` immediately with `body`.
    pub fn canned(&self, location: &str, body: String) {
        let _ = self.canned.lock().insert(location.to_owned(), body);
    }

    /// Answer action calls immediately with `body`.
    pub fn action_response(&self, body: String) {
        *self.action_body.lock() = Some(body);
    }

    /// Every request issued so far, as `GET <location>` / `POST <id> <location>`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Number of content requests for `location`.
    pub fn content_requests(&self, location: &str) -> usize {
        let wanted = format!("GET {location}");
        self.requests.lock().iter().filter(|r| **r == wanted).count()
    }

    /// Wait for the next held request for `location`.
    pub async fn next_request(&self, location: &str) -> PendingResponse {
        loop {
            let notified = self.arrived.notified();
            if let Some(pending) = self
                .pending
                .lock()
                .get_mut(location)
                .and_then(VecDeque::pop_front)
            {
                return pending;
            }
            notified.await;
        }
    }

    async fn hold(&self, location: &str) -> Result<StreamedResponse> {
        let (headers_tx, headers_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::unbounded_channel();
        self.pending
            .lock()
            .entry(location.to_owned())
            .or_default()
            .push_back(PendingResponse {
                headers: Some(headers_tx),
                body: Some(body_tx),
            });
        self.arrived.notify_waiters();

        headers_rx
            .await
            .map_err(|_| ClientError::Network("request dropped".into()))??;
        Ok(StreamedResponse::new(
            format!("test:/rsc{location}"),
            200,
            UnboundedReceiverStream::new(body_rx).boxed(),
        ))
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch_content(&self, location: &str) -> Result<StreamedResponse> {
        self.requests.lock().push(format!("GET {location}"));
        let canned = self.canned.lock().get(location).cloned();
        match canned {
            Some(body) => Ok(StreamedResponse::from_bytes(
                format!("test:/rsc{location}"),
                body,
            )),
            None => self.hold(location).await,
        }
    }

    async fn invoke_action(
        &self,
        location: &str,
        action_id: &str,
        body: Bytes,
    ) -> Result<StreamedResponse> {
        self.requests.lock().push(format!(
            "POST {action_id} {location} {}",
            String::from_utf8_lossy(&body)
        ));
        let canned = self.action_body.lock().clone();
        match canned {
            Some(body) => Ok(StreamedResponse::from_bytes(
                format!("test:/action{location}"),
                body,
            )),
            None => self.hold(&format!("action:{location}")).await,
        }
    }
}

/// Controller over a fresh in-memory history at `location`.
pub struct Harness {
    pub controller: NavigationController,
    pub history: Arc<MemoryHistory>,
    pub pop_rx: PopStateReceiver,
    pub fetcher: Arc<ScriptedFetcher>,
}

impl Harness {
    pub fn new(location: &str, fetcher: Arc<ScriptedFetcher>) -> Self {
        Self::with_settings(location, fetcher, rudder_settings::NavigationSettings::default())
    }

    pub fn with_settings(
        location: &str,
        fetcher: Arc<ScriptedFetcher>,
        settings: rudder_settings::NavigationSettings,
    ) -> Self {
        let (history, pop_rx) = MemoryHistory::new(location);
        let history = Arc::new(history);
        let controller = NavigationController::builder(
            Arc::clone(&history) as Arc<dyn rudder_nav::History>,
            Arc::clone(&fetcher) as Arc<dyn ContentFetcher>,
            Arc::new(JsonStreamDecoder::new()),
        )
        .settings(settings)
        .bootstrap();
        Self {
            controller,
            history,
            pop_rx,
            fetcher,
        }
    }

    /// Step back and hand the resulting pop-state event to the controller.
    pub async fn back(&mut self) -> rudder_nav::NavigationTask {
        assert!(self.history.back(), "no entry to go back to");
        let event = self.pop_rx.recv().await.expect("pop-state event");
        self.controller.handle_pop_state(event)
    }

    /// Step forward and hand the resulting pop-state event to the controller.
    pub async fn forward(&mut self) -> rudder_nav::NavigationTask {
        assert!(self.history.forward(), "no entry to go forward to");
        let event = self.pop_rx.recv().await.expect("pop-state event");
        self.controller.handle_pop_state(event)
    }
}

/// Drain all events currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<NavEvent>) -> Vec<NavEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
