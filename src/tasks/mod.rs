//! Background Tasks Module
//!
//! Contains the timers that run alongside a cookie cache.
//!
//! # Tasks
//! - Invalidation timer: clears the in-memory value when its slot expires

mod timer;

pub use timer::{invalidation_delay_ms, ExpiryTimer};
