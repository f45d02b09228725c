//! # rudder-core
//!
//! Foundation types shared by the Rudder streaming content client.
//!
//! - **Navigation identifiers**: [`ids::NavigationKey`] (persisted in history
//!   state) and [`ids::NavToken`] (race arbitration only)
//! - **Content**: [`content::DecodedContent`] and the lazily-resolving
//!   [`content::ContentEntry`] stored in the cache
//! - **Errors**: [`errors::ClientError`] taxonomy via `thiserror`
//! - **Logging**: [`logging::init_subscriber`] for `tracing` output
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by rudder-nav and rudder-agent.

#![deny(unsafe_code)]

pub mod content;
pub mod errors;
pub mod ids;
pub mod logging;

pub use content::{ContentEntry, DecodedContent};
pub use errors::{ClientError, Result};
pub use ids::{NavToken, NavigationKey};
