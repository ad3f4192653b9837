//! Cookie Module
//!
//! Synchronizes a reactive cache with an expiring persisted slot.

pub mod envelope;
mod expiry;
mod store;
mod sync;


// Re-export public types
pub use envelope::Envelope;
pub use expiry::{current_timestamp_ms, Expiry};
pub use store::ReactiveCookie;
pub use sync::PersistPolicy;

// == Public Constants ==
/// Clearing offset used when a write does not specify one
pub const DEFAULT_CLEARING_OFFSET_MS: i64 = 500;

/// Clearing offset used when arming the timer for a rehydrated value.
///
/// Fixed, even when explicit writes use a different offset.
pub const REHYDRATION_OFFSET_MS: i64 = 500;
