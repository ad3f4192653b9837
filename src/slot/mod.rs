//! Slot Module
//!
//! Persisted, name-scoped string slots with native expiry (cookie jars).
//!
//! # Providers
//! - `MemoryJar`: lives as long as the process
//! - `FileJar`: JSON file on disk, survives restarts

mod attributes;
mod file;
mod memory;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{CookieError, Result};

pub use attributes::{CookieAttributes, SameSite, SlotOptions};
pub use file::FileJar;
pub use memory::MemoryJar;

// == Slot Provider ==
/// A persisted key/value slot store.
///
/// Implementations honour the native expiry in [`CookieAttributes`]: an
/// expired slot reads as absent, and writing with a past expiry deletes it.
pub trait SlotProvider: Send + Sync {
    /// Reads the raw string stored under `name`.
    fn get(&self, name: &str) -> Option<String>;

    /// Stores `raw` under `name` with the given attributes.
    fn set(&self, name: &str, raw: &str, attributes: &CookieAttributes) -> Result<()>;
}

impl<S: SlotProvider + ?Sized> SlotProvider for Arc<S> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, raw: &str, attributes: &CookieAttributes) -> Result<()> {
        (**self).set(name, raw, attributes)
    }
}

// == Stored Cookie ==
/// A slot as kept by the bundled jars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    #[serde(flatten)]
    pub attributes: CookieAttributes,
}

impl StoredCookie {
    pub fn new(value: impl Into<String>, attributes: CookieAttributes) -> Self {
        Self {
            value: value.into(),
            attributes,
        }
    }

    /// Checks the native expiry against the current time.
    pub fn is_expired(&self) -> bool {
        self.attributes.is_expired_at(Utc::now())
    }
}

/// Rejects names a cookie jar cannot store: empty, or containing `=`, `;`,
/// whitespace or control characters.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c == '=' || c == ';' || c.is_whitespace() || c.is_control());

    if invalid {
        return Err(CookieError::Slot(format!("invalid cookie name {:?}", name)));
    }
    Ok(())
}
