//! Error types for the reactive cookie cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cookie Error Enum ==
/// Unified error type for slot providers, fetches and envelope encoding.
///
/// The synchronized facade never returns these to its callers directly; they
/// are logged and degraded to "nothing persisted". Fetch errors are the one
/// exception and travel through the refresh stream.
#[derive(Error, Debug)]
pub enum CookieError {
    /// Reading or writing a file-backed jar failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value or jar could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The update resource failed to produce a value
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The slot provider refused a write
    #[error("Slot error: {0}")]
    Slot(String),
}

// == Result Type Alias ==
/// Convenience Result type for the reactive cookie cache.
pub type Result<T> = std::result::Result<T, CookieError>;
