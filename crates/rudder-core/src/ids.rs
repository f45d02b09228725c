//! Navigation identifiers.
//!
//! - [`NavigationKey`]: opaque, persisted identifier for one content instance.
//!   Stored in history state so back/forward can recover it.
//! - [`NavToken`]: ephemeral sequence number used only to decide which
//!   in-flight navigation is allowed to apply side effects.

use std::fmt;

use serde::{Deserialize, Serialize};

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Render `value` in lowercase base 36.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Opaque key identifying one navigation's content in the cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationKey(String);

impl NavigationKey {
    /// Mint a fresh key: base-36 millisecond timestamp followed by a base-36
    /// random fragment. No coordination or counter is involved.
    #[must_use]
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let fragment: u64 = rand::random();
        Self(format!("{}{}", to_base36(millis), to_base36(fragment)))
    }

    /// Wrap an existing key value (e.g. one read back from history state).
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::ops::Deref for NavigationKey {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NavigationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NavigationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NavigationKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NavigationKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Sequence number minted at the start of every navigation event.
///
/// Only the highest minted token is authoritative. Tokens are never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NavToken(u64);

impl NavToken {
    /// Token that precedes every minted token.
    pub const INITIAL: Self = Self(0);

    /// The token minted after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw sequence value.
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NavToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nav#{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
