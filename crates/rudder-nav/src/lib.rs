//! # rudder-nav
//!
//! Navigation-aware streaming content cache and its race-safe key-update
//! protocol.
//!
//! - **Cache**: [`ContentCache`] maps navigation keys to lazily-resolving
//!   content entries for the whole session
//! - **Controller**: [`NavigationController`] owns the current key, reacts to
//!   user navigation and history traversal, and lets the latest event win
//! - **Streams**: [`StreamedResponse::tee`] separates decoding from the
//!   body-completion signal that gates key publication
//! - **Seams**: [`ContentFetcher`], [`StreamDecoder`], [`History`], and
//!   [`LocationProvider`], with reqwest, JSON, and in-memory implementations
//! - **Render side**: [`RouterHandle`] and [`ContentView`]
//!
//! ## Crate Position
//!
//! Depends on: rudder-core, rudder-settings.
//! Depended on by: rudder-agent.

#![deny(unsafe_code)]

pub mod cache;
pub mod controller;
pub mod decode;
pub mod events;
pub mod fetch;
pub mod history;
pub mod router;
pub mod state;
pub mod stream;
pub mod view;

pub use cache::ContentCache;
pub use controller::{
    ControllerBuilder, NavigateOptions, NavigationController, NavigationOutcome, NavigationTask,
};
pub use decode::{JsonStreamDecoder, ResponseFuture, StreamDecoder};
pub use events::{NavEvent, NavEventEmitter};
pub use fetch::{ContentFetcher, HttpFetcher};
pub use history::{
    History, HistoryLocation, HistoryState, LocationProvider, MemoryHistory, PopStateEvent,
    PopStateReceiver,
};
pub use router::RouterHandle;
pub use state::{RouterState, RouterUpdate};
pub use stream::{BodyStream, StreamCompletion, StreamedResponse};
pub use view::{ContentView, FALLBACK_MESSAGE};
