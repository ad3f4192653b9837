//! Reactive Cookie Module
//!
//! The public facade: a reactive cache whose value is mirrored into a
//! persisted slot and cleared when that slot's expiry lapses.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::cache::{FirstValueHook, ReactiveCache, UpdateResource, ValueListener, ValueStream};
use crate::cookie::sync::{PersistPolicy, SlotSync};
use crate::cookie::Expiry;
use crate::slot::{SlotOptions, SlotProvider};

// == Reactive Cookie ==
/// A reactive cache synchronized with a named persisted slot.
///
/// Two variants share this type:
/// - [`ReactiveCookie::new`] (eager) rehydrates from the slot at
///   construction and persists every value that enters the cache.
/// - [`ReactiveCookie::temporal`] persists nothing; writes only arm the
///   invalidation timer.
///
/// Either way, exactly one invalidation timer is pending at a time.
pub struct ReactiveCookie<T> {
    cache: ReactiveCache<T>,
    sync: Arc<SlotSync<T>>,
}

impl<T> ReactiveCookie<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an eager cookie cache.
    ///
    /// If the slot holds an unexpired envelope, its value becomes the current
    /// value immediately and the invalidation timer is armed for it.
    ///
    /// # Arguments
    /// * `name` - Slot name, fixed for the lifetime of the cache
    /// * `resource` - Fetches fresh values on refresh or first subscription
    /// * `slot` - Persisted slot provider
    /// * `expires` - Default expiry for writes that do not override it
    pub fn new(
        name: impl Into<String>,
        resource: impl UpdateResource<T> + 'static,
        slot: impl SlotProvider + 'static,
        expires: Option<Expiry>,
    ) -> Self {
        Self::build(name.into(), resource, Box::new(slot), expires, PersistPolicy::Eager)
    }

    /// Creates a temporal cookie cache.
    ///
    /// Values are never written to the slot, so nothing survives a restart;
    /// `set` only schedules the in-memory value to clear itself.
    pub fn temporal(
        name: impl Into<String>,
        resource: impl UpdateResource<T> + 'static,
        slot: impl SlotProvider + 'static,
    ) -> Self {
        Self::build(name.into(), resource, Box::new(slot), None, PersistPolicy::Temporal)
    }

    fn build(
        name: String,
        resource: impl UpdateResource<T> + 'static,
        slot: Box<dyn SlotProvider>,
        expires: Option<Expiry>,
        policy: PersistPolicy,
    ) -> Self {
        let sync = Arc::new(SlotSync::new(name.clone(), slot, expires, policy));

        let listener = match policy {
            PersistPolicy::Eager => {
                let sync = Arc::clone(&sync);
                let listener: ValueListener<T> = Box::new(move |value: Option<&T>| {
                    if let Some(value) = value {
                        sync.persist_pushed(value);
                    }
                });
                Some(listener)
            }
            PersistPolicy::Temporal => None,
        };

        let cache = ReactiveCache::create(resource, name, listener);
        sync.attach(&cache);

        if policy == PersistPolicy::Eager {
            sync.rehydrate(&cache);
        }

        Self { cache, sync }
    }

    /// Returns the slot name.
    pub fn name(&self) -> &str {
        self.cache.name()
    }

    /// Returns whether this cache persists values.
    pub fn policy(&self) -> PersistPolicy {
        self.sync.policy()
    }

    // == Set ==
    /// Sets the current value, persists it and re-arms the timer.
    ///
    /// # Arguments
    /// * `value` - New current value, visible to subscribers immediately
    /// * `expires` - Overrides the default expiry for this write
    /// * `options` - Slot attributes and clearing offset (default 500 ms)
    ///
    /// # Returns
    /// The raw slot contents after the write. Always None for the temporal
    /// variant, and None if the write failed or the slot dropped it.
    pub fn set(&self, value: T, expires: Option<Expiry>, options: SlotOptions) -> Option<String> {
        self.cache.next(value.clone());
        self.sync.persist(&value, expires, &options)
    }

    // == Get Value ==
    /// Reads the value straight from the slot's envelope.
    ///
    /// This bypasses the in-memory cache, so it can differ from the live
    /// value if the slot was written out of band.
    pub fn get_value(&self) -> Option<T> {
        self.sync.read_envelope().map(|envelope| envelope.d)
    }

    // == Refresh ==
    /// Re-fetches the value through the update resource.
    ///
    /// For the eager variant the first fetched value is persisted again with
    /// `expires` (or the default) and `options`. That write happens in the
    /// fetch task as soon as the value is pushed, whether or not the returned
    /// stream is polled. The temporal variant only fetches. Fetch errors are
    /// yielded as `Err` items.
    pub fn refresh(&self, expires: Option<Expiry>, options: SlotOptions) -> ValueStream<T> {
        match self.sync.policy() {
            PersistPolicy::Temporal => self.cache.update(),
            PersistPolicy::Eager => {
                let sync = Arc::clone(&self.sync);
                let persist_first: FirstValueHook<T> = Box::new(move |value: &T| {
                    sync.persist(value, expires, &options);
                });
                self.cache.update_with(Some(persist_first))
            }
        }
    }

    // == Reset ==
    /// Cancels the pending timer and clears the in-memory value.
    ///
    /// The slot is left untouched.
    pub fn reset(&self) {
        self.sync.timer().cancel();
        self.cache.reset_state();
    }

    // == Live Value ==
    /// Subscribes to the live value; `None` means empty.
    ///
    /// Subscribing while empty triggers a fetch.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.cache.subscribe()
    }

    /// Returns the current in-memory value.
    pub fn current(&self) -> Option<T> {
        self.cache.current()
    }

    /// Returns true while an invalidation timer is pending.
    pub fn is_timer_armed(&self) -> bool {
        self.sync.timer().is_armed()
    }
}
