//! Cookie Attributes Module
//!
//! Scoping attributes forwarded to a slot provider, and the caller-facing
//! options that additionally carry the timer's clearing offset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cookie::DEFAULT_CLEARING_OFFSET_MS;

/// Cross-site sending policy of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

// == Cookie Attributes ==
/// Attributes understood by a slot provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieAttributes {
    /// Native expiry of the slot, None = session slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
}

impl CookieAttributes {
    /// Returns true once the native expiry has been reached.
    ///
    /// Session slots (no expiry) never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires {
            Some(expires) => now >= expires,
            None => false,
        }
    }
}

// == Slot Options ==
/// Per-call options for `set` and `refresh`.
///
/// Everything except `clearing_offset_ms` is passed through to the slot
/// provider. The clearing offset only shifts the invalidation timer: positive
/// values clear the in-memory value before the slot expires, negative values
/// after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: Option<SameSite>,
    pub clearing_offset_ms: Option<i64>,
}

impl SlotOptions {
    /// Creates options with every attribute unset.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn with_clearing_offset_ms(mut self, offset_ms: i64) -> Self {
        self.clearing_offset_ms = Some(offset_ms);
        self
    }

    /// Effective clearing offset, falling back to the default of 500 ms.
    pub fn clearing_offset_ms(&self) -> i64 {
        self.clearing_offset_ms.unwrap_or(DEFAULT_CLEARING_OFFSET_MS)
    }

    // == To Attributes ==
    /// Builds the provider attributes, dropping the clearing offset.
    pub fn to_attributes(&self, expires: Option<DateTime<Utc>>) -> CookieAttributes {
        CookieAttributes {
            expires,
            path: self.path.clone(),
            domain: self.domain.clone(),
            secure: self.secure,
            same_site: self.same_site,
        }
    }
}
