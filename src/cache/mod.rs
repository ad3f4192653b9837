//! Cache Module
//!
//! Provides the reactive single-value cache that the cookie facade wraps.

mod reactive;
mod resource;

// Re-export public types
pub use reactive::{FirstValueHook, ReactiveCache, ValueListener, ValueStream, WeakCache};
pub use resource::{from_fn, FnResource, UpdateResource};
