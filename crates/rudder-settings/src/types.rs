//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so partial JSON
//! files are accepted and missing fields keep their compiled default.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the Rudder client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RudderSettings {
    /// Content server endpoints.
    pub server: ServerSettings,
    /// Navigation controller behavior.
    pub navigation: NavigationSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for RudderSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            navigation: NavigationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl RudderSettings {
    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("contentPath", &self.server.content_path),
            ("actionPath", &self.server.action_path),
        ] {
            if !path.starts_with('/') {
                return Err(SettingsError::InvalidValue(format!(
                    "{name} must start with '/', got {path:?}"
                )));
            }
        }
        if self.server.action_header.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "actionHeader must not be empty".into(),
            ));
        }
        if self.navigation.event_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "eventCapacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Where and how content and actions are requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Origin of the content server, without a trailing slash.
    pub base_url: String,
    /// Prefix for content requests (`GET <base><contentPath><location>`).
    pub content_path: String,
    /// Prefix for action requests (`POST <base><actionPath><location>`).
    pub action_path: String,
    /// Header carrying the action id.
    pub action_header: String,
    /// `Accept` header sent with every request.
    pub accept: String,
    /// TCP connect timeout. Body reads are unbounded because content streams.
    pub connect_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            content_path: "/rsc".to_string(),
            action_path: "/action".to_string(),
            action_header: "rsc-action".to_string(),
            accept: "text/x-component".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

/// Navigation controller behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationSettings {
    /// Refetch cached content in the background on back/forward and swap it
    /// in once its stream completes.
    pub revalidate_on_pop: bool,
    /// Capacity of the navigation event broadcast channel.
    pub event_capacity: usize,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            revalidate_on_pop: false,
            event_capacity: 256,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
