//! # rudder-settings
//!
//! Configuration management with layered sources for the Rudder client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`RudderSettings::default()`]
//! 2. **User file**: `~/.rudder/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `RUDDER_*` overrides (highest priority)
//!
//! The global singleton is reloadable through [`reload_settings_from_path`].

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

/// Global settings singleton.
static SETTINGS: RwLock<Option<Arc<RudderSettings>>> = RwLock::new(None);

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.rudder/settings.json` with env var
/// overrides. If loading fails, returns compiled defaults.
pub fn get_settings() -> Arc<RudderSettings> {
    if let Some(ref s) = *SETTINGS.read() {
        return Arc::clone(s);
    }

    let mut guard = SETTINGS.write();
    // Another thread may have initialized while we waited for the write lock.
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            RudderSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Reload settings from `path` and replace the cached global value.
pub fn reload_settings_from_path(path: &Path) -> Result<Arc<RudderSettings>> {
    let settings = Arc::new(load_settings_from_path(path)?);
    *SETTINGS.write() = Some(Arc::clone(&settings));
    Ok(settings)
}
