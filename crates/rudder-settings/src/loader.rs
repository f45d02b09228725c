//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RudderSettings::default()`]
//! 2. If `~/.rudder/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `RUDDER_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::RudderSettings;

/// Resolve the path to the settings file (`~/.rudder/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".rudder").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RudderSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<RudderSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<RudderSettings> {
    let defaults = serde_json::to_value(RudderSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `RUDDER_*` environment variable overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut RudderSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning and the file/default value kept.
pub fn apply_overrides_from<F>(settings: &mut RudderSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read_string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read_string("RUDDER_BASE_URL") {
        settings.server.base_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = read_string("RUDDER_CONTENT_PATH") {
        settings.server.content_path = v;
    }
    if let Some(v) = read_string("RUDDER_ACTION_PATH") {
        settings.server.action_path = v;
    }
    if let Some(v) = read_string("RUDDER_CONNECT_TIMEOUT_MS") {
        match parse_u64_range(&v, 100, 600_000) {
            Some(n) => settings.server.connect_timeout_ms = n,
            None => tracing::warn!(key = "RUDDER_CONNECT_TIMEOUT_MS", value = %v, "invalid u64 env var, ignoring"),
        }
    }

    // ── Navigation ──────────────────────────────────────────────────
    if let Some(v) = read_string("RUDDER_REVALIDATE_ON_POP") {
        match parse_bool(&v) {
            Some(b) => settings.navigation.revalidate_on_pop = b,
            None => tracing::warn!(key = "RUDDER_REVALIDATE_ON_POP", value = %v, "invalid boolean env var, ignoring"),
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_string("RUDDER_LOG") {
        settings.logging.level = v;
    }
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
