//! Slot Synchronization
//!
//! Keeps the persisted slot, the in-memory cache and the invalidation timer in
//! step. Both cookie variants route every write through [`SlotSync::persist`].

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{ReactiveCache, WeakCache};
use crate::cookie::envelope::{self, Envelope};
use crate::cookie::expiry::{current_timestamp_ms, Expiry};
use crate::cookie::REHYDRATION_OFFSET_MS;
use crate::slot::{SlotOptions, SlotProvider};
use crate::tasks::{invalidation_delay_ms, ExpiryTimer};

// == Persist Policy ==
/// What a cookie cache writes to its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPolicy {
    /// Every in-memory value is persisted, including fetched ones
    Eager,
    /// Nothing is persisted; writes only arm the invalidation timer
    Temporal,
}

pub(crate) struct SlotSync<T> {
    name: String,
    slot: Box<dyn SlotProvider>,
    default_expiry: Option<Expiry>,
    policy: PersistPolicy,
    timer: ExpiryTimer,
    cache: OnceLock<WeakCache<T>>,
}

impl<T> SlotSync<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        name: String,
        slot: Box<dyn SlotProvider>,
        default_expiry: Option<Expiry>,
        policy: PersistPolicy,
    ) -> Self {
        Self {
            timer: ExpiryTimer::new(name.clone()),
            name,
            slot,
            default_expiry,
            policy,
            cache: OnceLock::new(),
        }
    }

    pub(crate) fn policy(&self) -> PersistPolicy {
        self.policy
    }

    pub(crate) fn timer(&self) -> &ExpiryTimer {
        &self.timer
    }

    /// Connects the cache the timer resets. Only the first call has effect.
    pub(crate) fn attach(&self, cache: &ReactiveCache<T>) {
        let _ = self.cache.set(cache.downgrade());
    }

    // == Read Envelope ==
    pub(crate) fn read_envelope(&self) -> Option<Envelope<T>> {
        envelope::decode(self.slot.get(&self.name).as_deref())
    }

    // == Rehydrate ==
    /// Seeds the cache from the slot if it holds an unexpired envelope.
    ///
    /// The push reaches the eager listener like any other value, so the slot
    /// is rewritten with the default expiry. The timer is then re-armed from
    /// the stored expiry with a fixed 500 ms offset, whatever offset explicit
    /// writes use.
    pub(crate) fn rehydrate(&self, cache: &ReactiveCache<T>) {
        let Some(envelope) = self.read_envelope() else {
            debug!(cookie = %self.name, "No envelope to rehydrate from");
            return;
        };

        let now = current_timestamp_ms();
        if !envelope.is_restorable_at(now) {
            debug!(cookie = %self.name, expires_at = envelope.x, "Stored envelope expired, ignoring");
            return;
        }

        let delay = invalidation_delay_ms(envelope.x, now, REHYDRATION_OFFSET_MS);

        cache.next(envelope.d);
        self.arm_reset(delay);
        info!(cookie = %self.name, remaining_ms = envelope.x - now, "Rehydrated value from slot");
    }

    // == Persist Implicit ==
    /// Listener path: persists a pushed value with the default expiry and
    /// the default clearing offset.
    pub(crate) fn persist_pushed(&self, value: &T) {
        self.persist(value, None, &SlotOptions::default());
    }

    // == Persist ==
    /// Writes `value` according to the policy and re-arms the timer.
    ///
    /// # Arguments
    /// * `value` - The value just pushed into the cache
    /// * `expires` - Overrides the construction-time default expiry
    /// * `options` - Slot attributes and the clearing offset
    ///
    /// # Returns
    /// The raw slot contents after the write, or None if nothing was written.
    pub(crate) fn persist(
        &self,
        value: &T,
        expires: Option<Expiry>,
        options: &SlotOptions,
    ) -> Option<String> {
        let expires_at = expires.or(self.default_expiry).and_then(|e| e.resolve());
        self.rearm(expires_at, options.clearing_offset_ms());

        match self.policy {
            PersistPolicy::Eager => self.write(value, expires_at, options),
            PersistPolicy::Temporal => None,
        }
    }

    fn write(
        &self,
        value: &T,
        expires_at: Option<DateTime<Utc>>,
        options: &SlotOptions,
    ) -> Option<String> {
        let raw = match envelope::encode(value, expires_at) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(cookie = %self.name, "Failed to encode value: {}", e);
                return None;
            }
        };

        if let Err(e) = self
            .slot
            .set(&self.name, &raw, &options.to_attributes(expires_at))
        {
            warn!(cookie = %self.name, "Failed to write slot: {}", e);
            return None;
        }

        debug!(cookie = %self.name, bytes = raw.len(), "Envelope written");
        self.slot.get(&self.name)
    }

    fn rearm(&self, expires_at: Option<DateTime<Utc>>, clearing_offset_ms: i64) {
        match expires_at {
            Some(at) => self.arm_reset(invalidation_delay_ms(
                at.timestamp_millis(),
                current_timestamp_ms(),
                clearing_offset_ms,
            )),
            None => self.timer.cancel(),
        }
    }

    fn arm_reset(&self, delay_ms: i64) {
        let cache = self.cache.get().cloned();

        self.timer.arm(delay_ms, move || {
            if let Some(cache) = cache.and_then(|weak| weak.upgrade()) {
                cache.reset_state();
            }
        });
    }
}
