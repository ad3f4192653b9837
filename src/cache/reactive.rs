//! Reactive Cache Module
//!
//! A single-value cache that pushes every change to its subscribers and knows
//! how to refill itself from an [`UpdateResource`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::cache::UpdateResource;
use crate::error::Result;

/// Observer invoked synchronously on every push. `None` is the empty sentinel.
pub type ValueListener<T> = Box<dyn Fn(Option<&T>) + Send + Sync>;

/// Values produced by a fetch, in order, including fetch errors.
pub type ValueStream<T> = BoxStream<'static, Result<T>>;

/// Runs once, on the first successful value of a fetch, right after it is pushed.
pub type FirstValueHook<T> = Box<dyn FnOnce(&T) + Send>;

struct Shared<T> {
    name: String,
    state: watch::Sender<Option<T>>,
    resource: Box<dyn UpdateResource<T>>,
    listener: Option<ValueListener<T>>,
    /// Number of fetch tasks still running
    in_flight: AtomicUsize,
}

// == Reactive Cache ==
/// Holds the current value of one named cache.
///
/// Cloning is cheap and every clone refers to the same state. A new
/// subscriber immediately sees the latest value.
pub struct ReactiveCache<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ReactiveCache<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Non-owning handle to a [`ReactiveCache`], used by timers and listeners.
pub struct WeakCache<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for WeakCache<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> WeakCache<T> {
    /// Returns the cache if it is still alive.
    pub fn upgrade(&self) -> Option<ReactiveCache<T>> {
        self.shared.upgrade().map(|shared| ReactiveCache { shared })
    }
}

impl<T> ReactiveCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `resource` - Produces values when the cache is updated
    /// * `name` - Identifies this cache instance in logs
    /// * `listener` - Optional observer of every pushed value
    pub fn create(
        resource: impl UpdateResource<T> + 'static,
        name: impl Into<String>,
        listener: Option<ValueListener<T>>,
    ) -> Self {
        let (state, _) = watch::channel(None);

        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                state,
                resource: Box::new(resource),
                listener,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    // == Next ==
    /// Sets the current value and notifies subscribers and the listener.
    pub fn next(&self, value: T) {
        self.shared.state.send_replace(Some(value.clone()));
        self.notify(Some(&value));
    }

    // == Reset State ==
    /// Clears the current value back to empty.
    pub fn reset_state(&self) {
        debug!(cache = %self.shared.name, "Cache state reset");
        self.shared.state.send_replace(None);
        self.notify(None);
    }

    // == Current ==
    /// Returns a clone of the current value, if any.
    pub fn current(&self) -> Option<T> {
        self.shared.state.borrow().clone()
    }

    // == Update ==
    /// Triggers a fetch and returns the values it produces.
    ///
    /// Every successful value is pushed into the cache before it is yielded
    /// on the returned stream. The fetch keeps running even if the stream is
    /// dropped.
    pub fn update(&self) -> ValueStream<T> {
        self.update_with(None)
    }

    /// Like [`ReactiveCache::update`], running `on_first` inside the fetch
    /// task on the first successful value, after the push and before the
    /// value is yielded.
    pub fn update_with(&self, on_first: Option<FirstValueHook<T>>) -> ValueStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        self.spawn_fetch(Some(tx), on_first);
        UnboundedReceiverStream::new(rx).boxed()
    }

    /// Returns true while at least one fetch is running.
    pub fn is_fetching(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst) > 0
    }

    // == Subscribe ==
    /// Subscribes to the live value.
    ///
    /// The receiver replays the latest value. Subscribing to an empty cache
    /// with no fetch in flight starts one.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        let rx = self.shared.state.subscribe();
        let is_empty = rx.borrow().is_none();

        if is_empty
            && self
                .shared
                .in_flight
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            debug!(cache = %self.shared.name, "Empty cache subscribed, fetching");
            self.spawn_fetch(None, None);
        }

        rx
    }

    /// Returns a non-owning handle to this cache.
    pub fn downgrade(&self) -> WeakCache<T> {
        WeakCache {
            shared: Arc::downgrade(&self.shared),
        }
    }

    fn notify(&self, value: Option<&T>) {
        if let Some(listener) = &self.shared.listener {
            listener(value);
        }
    }

    /// The caller has already counted this fetch in `in_flight`.
    fn spawn_fetch(
        &self,
        sink: Option<mpsc::UnboundedSender<Result<T>>>,
        mut on_first: Option<FirstValueHook<T>>,
    ) {
        let cache = self.clone();

        tokio::spawn(async move {
            let mut values = cache.shared.resource.fetch();

            while let Some(item) = values.next().await {
                match &item {
                    Ok(value) => {
                        cache.next(value.clone());
                        if let Some(hook) = on_first.take() {
                            hook(value);
                        }
                    }
                    Err(e) => warn!(cache = %cache.name(), "Fetch failed: {}", e),
                }

                if let Some(sink) = &sink {
                    // The caller may have dropped the stream; values still land in the cache.
                    let _ = sink.send(item);
                }
            }

            cache.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            debug!(cache = %cache.name(), "Fetch finished");
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::from_fn;
    use crate::error::CookieError;
    use std::sync::Mutex;

    fn recording_listener() -> (ValueListener<String>, Arc<Mutex<Vec<Option<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: ValueListener<String> = Box::new(move |value: Option<&String>| {
            sink.lock().unwrap().push(value.cloned());
        });
        (listener, seen)
    }

    #[tokio::test]
    async fn test_next_sets_current_and_notifies() {
        let (listener, seen) = recording_listener();
        let cache = ReactiveCache::create(
            from_fn(|| async { Ok("fetched".to_string()) }),
            "test",
            Some(listener),
        );

        assert!(cache.current().is_none());
        cache.next("a".to_string());

        assert_eq!(cache.current().as_deref(), Some("a"));
        assert_eq!(*seen.lock().unwrap(), vec![Some("a".to_string())]);
    }

    #[tokio::test]
    async fn test_reset_state_emits_empty_sentinel() {
        let (listener, seen) = recording_listener();
        let cache = ReactiveCache::create(
            from_fn(|| async { Ok("fetched".to_string()) }),
            "test",
            Some(listener),
        );

        cache.next("a".to_string());
        cache.reset_state();

        assert!(cache.current().is_none());
        assert_eq!(*seen.lock().unwrap(), vec![Some("a".to_string()), None]);
    }

    #[tokio::test]
    async fn test_update_pushes_and_yields_value() {
        let cache = ReactiveCache::create(from_fn(|| async { Ok(7u32) }), "test", None);

        let values: Vec<_> = cache.update().collect().await;

        assert_eq!(values.len(), 1);
        assert_eq!(*values[0].as_ref().unwrap(), 7);
        assert_eq!(cache.current(), Some(7));
    }

    #[tokio::test]
    async fn test_update_forwards_fetch_errors() {
        let cache = ReactiveCache::create(
            from_fn(|| async { Err::<u32, _>(CookieError::Fetch("boom".to_string())) }),
            "test",
            None,
        );

        let values: Vec<_> = cache.update().collect().await;

        assert!(matches!(values[0], Err(CookieError::Fetch(_))));
        assert!(cache.current().is_none());
    }

    #[tokio::test]
    async fn test_subscribe_on_empty_cache_fetches_lazily() {
        let cache = ReactiveCache::create(from_fn(|| async { Ok(3u32) }), "test", None);

        let mut rx = cache.subscribe();
        rx.wait_for(|value| value.is_some()).await.unwrap();

        assert_eq!(*rx.borrow(), Some(3));
    }

    #[tokio::test]
    async fn test_subscribe_replays_latest_without_fetching() {
        let cache = ReactiveCache::create(from_fn(|| async { Ok(3u32) }), "test", None);
        cache.next(10);

        let rx = cache.subscribe();
        tokio::task::yield_now().await;

        assert_eq!(*rx.borrow(), Some(10));
        assert_eq!(cache.current(), Some(10));
    }

    #[tokio::test]
    async fn test_first_value_hook_runs_after_push_once() {
        let resource = from_fn(|| async { Ok(5u32) });
        let cache = ReactiveCache::create(resource, "test", None);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observed = cache.clone();
        let sink = Arc::clone(&seen);
        let hook: FirstValueHook<u32> = Box::new(move |value: &u32| {
            sink.lock().unwrap().push((*value, observed.current()));
        });

        let values: Vec<_> = cache.update_with(Some(hook)).collect().await;

        assert_eq!(values.len(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![(5, Some(5))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_fetches_do_not_restart_lazy_fetch() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);
        // The first fetch is slow, every later one is quick.
        let resource = from_fn(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let ms = if n == 0 { 100 } else { 10 };
                tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
                Ok(n as u32)
            }
        });
        let cache = ReactiveCache::create(resource, "test", None);

        let _lazy = cache.subscribe();
        let _ = cache.update();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(cache.current(), Some(1));
        assert!(cache.is_fetching(), "The slow fetch is still running");

        cache.reset_state();
        let _again = cache.subscribe();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert!(!cache.is_fetching());

        let _after = cache.subscribe();
        tokio::task::yield_now().await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2, "Cache holds a value, no fetch");
    }

    #[tokio::test]
    async fn test_weak_cache_does_not_keep_cache_alive() {
        let cache = ReactiveCache::create(from_fn(|| async { Ok(1u32) }), "test", None);
        let weak = cache.downgrade();

        assert!(weak.upgrade().is_some());
        drop(cache);
        assert!(weak.upgrade().is_none());
    }
}
