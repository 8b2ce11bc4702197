//! A single context pair.

use serde::{Deserialize, Serialize};

use crate::error::{PermissionError, Result};

/// One `(key, value)` context pair, trimmed and lower-cased.
///
/// The key names a dimension (`world`, `server`, ...) and the value its
/// setting. Both are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawContext")]
pub struct Context {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct RawContext {
    key: String,
    value: String,
}

impl TryFrom<RawContext> for Context {
    type Error = PermissionError;

    fn try_from(raw: RawContext) -> Result<Self> {
        Context::new(raw.key, raw.value)
    }
}

impl Context {
    /// Create a context pair.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::InvalidContext`] when either side is
    /// empty after trimming.
    pub fn new(key: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let key = normalize(key.as_ref());
        let value = normalize(value.as_ref());
        if key.is_empty() || value.is_empty() {
            return Err(PermissionError::InvalidContext { key, value });
        }
        Ok(Self { key, value })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_pair(self) -> (String, String) {
        (self.key, self.value)
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Trim and lower-case a context key or value.
pub(crate) fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
