//! Update Resource Module
//!
//! The "fetch" side of a reactive cache: anything that can lazily produce a
//! stream of values when the cache asks for them.

use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;

// == Update Resource ==
/// A lazily-subscribed source of values for a [`ReactiveCache`].
///
/// `fetch` is called once per update; nothing runs until the cache asks.
///
/// [`ReactiveCache`]: crate::cache::ReactiveCache
pub trait UpdateResource<T>: Send + Sync {
    /// Starts a fetch and returns the values it produces.
    fn fetch(&self) -> BoxStream<'static, Result<T>>;
}

// == Function Resource ==
/// Update resource backed by an async closure producing a single value.
pub struct FnResource<F> {
    f: F,
}

/// Wraps an async closure as an [`UpdateResource`].
///
/// # Example
/// ```ignore
/// let resource = from_fn(|| async { Ok("token".to_string()) });
/// ```
pub fn from_fn<T, F, Fut>(f: F) -> FnResource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    FnResource { f }
}

impl<T, F, Fut> UpdateResource<T> for FnResource<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    fn fetch(&self) -> BoxStream<'static, Result<T>> {
        stream::once((self.f)()).boxed()
    }
}
