//! File-Backed Jar
//!
//! Keeps every slot in a single JSON file so values outlive the process.
//! The file is re-read on every access, so writes made by another process
//! are picked up.
//!
//! All I/O is blocking `std::fs`. Every `get` reads and parses the whole
//! file, and every `set` reads, rewrites and saves it. An eager cookie calls
//! these from its listener, which also runs inside the Tokio fetch task, so
//! each pushed value stalls that worker for a full file round trip. This jar
//! suits demos, CLIs and low write rates; use an in-memory or async-backed
//! provider on hot paths.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::Result;
use crate::slot::{validate_name, CookieAttributes, SlotProvider, StoredCookie};

// == File Jar ==
/// Slot provider persisting cookies to a JSON file.
///
/// Blocks the calling thread on every access, see the module docs.
#[derive(Debug)]
pub struct FileJar {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileJar {
    // == Constructor ==
    /// Opens a jar at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Load ==
    /// Reads all live cookies. A missing file is an empty jar.
    pub fn load(&self) -> Result<HashMap<String, StoredCookie>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut cookies: HashMap<String, StoredCookie> = serde_json::from_slice(&bytes)?;
        cookies.retain(|_, cookie| !cookie.is_expired());
        Ok(cookies)
    }

    fn save(&self, cookies: &HashMap<String, StoredCookie>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(cookies)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl SlotProvider for FileJar {
    fn get(&self, name: &str) -> Option<String> {
        match self.load() {
            Ok(mut cookies) => cookies.remove(name).map(|cookie| cookie.value),
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read cookie jar: {}", e);
                None
            }
        }
    }

    fn set(&self, name: &str, raw: &str, attributes: &CookieAttributes) -> Result<()> {
        validate_name(name)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut cookies = self.load()?;
        let cookie = StoredCookie::new(raw, attributes.clone());

        if cookie.is_expired() {
            debug!(slot = %name, "Write with past expiry, removing slot");
            cookies.remove(name);
        } else {
            cookies.insert(name.to_string(), cookie);
        }

        self.save(&cookies)
    }
}
