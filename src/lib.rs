//! Reactive Cookie - a reactive value cache backed by an expiring cookie slot
//!
//! A cached value is mirrored into a persisted slot together with its expiry,
//! restored from that slot on startup while it is still valid, and cleared
//! from memory when the expiry passes.

pub mod cache;
pub mod config;
pub mod cookie;
pub mod error;
pub mod slot;
pub mod tasks;

pub use cache::{from_fn, ReactiveCache, UpdateResource};
pub use config::Config;
pub use cookie::{Expiry, PersistPolicy, ReactiveCookie};
pub use error::{CookieError, Result};
pub use slot::{CookieAttributes, FileJar, MemoryJar, SameSite, SlotOptions, SlotProvider};
