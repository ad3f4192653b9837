//! In-Memory Jar
//!
//! HashMap-backed slot provider for tests and single-process use.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::slot::{validate_name, CookieAttributes, SlotProvider, StoredCookie};

// == Memory Jar ==
/// Slot provider that keeps cookies in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryJar {
    // == Constructor ==
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored cookie including its attributes, if still live.
    pub fn cookie(&self, name: &str) -> Option<StoredCookie> {
        let mut cookies = self.lock();
        if cookies.get(name)?.is_expired() {
            cookies.remove(name);
            return None;
        }
        cookies.get(name).cloned()
    }

    /// Removes a slot, returning true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.lock().remove(name).is_some()
    }

    /// Returns the number of live slots.
    pub fn len(&self) -> usize {
        let mut cookies = self.lock();
        cookies.retain(|_, cookie| !cookie.is_expired());
        cookies.len()
    }

    /// Returns true if no live slot remains.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredCookie>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SlotProvider for MemoryJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|cookie| cookie.value)
    }

    fn set(&self, name: &str, raw: &str, attributes: &CookieAttributes) -> Result<()> {
        validate_name(name)?;
        let cookie = StoredCookie::new(raw, attributes.clone());
        let mut cookies = self.lock();

        if cookie.is_expired() {
            debug!(slot = %name, "Write with past expiry, removing slot");
            cookies.remove(name);
        } else {
            cookies.insert(name.to_string(), cookie);
        }

        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn expiring_in(ms: i64) -> CookieAttributes {
        CookieAttributes {
            expires: Some(Utc::now() + Duration::milliseconds(ms)),
            ..Default::default()
        }
    }

    #[test]
    fn test_jar_set_and_get() {
        let jar = MemoryJar::new();

        jar.set("token", "abc", &expiring_in(60_000)).unwrap();

        assert_eq!(jar.get("token").as_deref(), Some("abc"));
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn test_jar_get_nonexistent() {
        let jar = MemoryJar::new();
        assert!(jar.get("missing").is_none());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_jar_overwrite_keeps_latest_attributes() {
        let jar = MemoryJar::new();

        jar.set("token", "one", &expiring_in(60_000)).unwrap();
        let session = CookieAttributes {
            path: Some("/app".to_string()),
            ..Default::default()
        };
        jar.set("token", "two", &session).unwrap();

        let cookie = jar.cookie("token").unwrap();
        assert_eq!(cookie.value, "two");
        assert_eq!(cookie.attributes, session);
    }

    #[test]
    fn test_jar_write_with_past_expiry_deletes() {
        let jar = MemoryJar::new();

        jar.set("token", "abc", &expiring_in(60_000)).unwrap();
        jar.set("token", "stale", &expiring_in(-1_000)).unwrap();

        assert!(jar.get("token").is_none());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_jar_native_expiry() {
        let jar = MemoryJar::new();

        jar.set("token", "abc", &expiring_in(50)).unwrap();
        assert!(jar.get("token").is_some());

        std::thread::sleep(std::time::Duration::from_millis(80));

        assert!(jar.get("token").is_none());
    }

    #[test]
    fn test_jar_rejects_invalid_name() {
        let jar = MemoryJar::new();

        let result = jar.set("bad name", "abc", &CookieAttributes::default());

        assert!(matches!(result, Err(crate::error::CookieError::Slot(_))));
        assert!(jar.is_empty());
    }

    #[test]
    fn test_jar_remove() {
        let jar = MemoryJar::new();

        jar.set("token", "abc", &CookieAttributes::default()).unwrap();

        assert!(jar.remove("token"));
        assert!(!jar.remove("token"));
    }
}
