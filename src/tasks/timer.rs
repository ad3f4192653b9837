//! Invalidation Timer
//!
//! Owns the single pending invalidation task of a cookie cache.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Delay before invalidating a value expiring at `expires_at_ms`.
///
/// The result is not clamped: a negative delay means the deadline has
/// already passed and the timer fires as soon as possible.
pub fn invalidation_delay_ms(expires_at_ms: i64, now_ms: i64, clearing_offset_ms: i64) -> i64 {
    expires_at_ms
        .saturating_sub(now_ms)
        .saturating_sub(clearing_offset_ms)
}

// == Expiry Timer ==
/// At most one armed single-shot timer.
///
/// Arming always replaces (and aborts) the previous timer, so two live
/// timers never coexist. Dropping the timer aborts whatever is pending.
#[derive(Debug)]
pub struct ExpiryTimer {
    /// Name of the owning cookie, for logs
    name: String,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ExpiryTimer {
    // == Constructor ==
    /// Creates a timer with nothing armed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: Mutex::new(None),
        }
    }

    // == Arm ==
    /// Schedules `on_fire` to run once after `delay_ms`, cancelling any
    /// previously armed timer.
    ///
    /// Must be called from within a Tokio runtime. A delay of zero or less
    /// puts the deadline in the past, so `on_fire` runs on the next turn.
    pub fn arm<F>(&self, delay_ms: i64, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = deadline_after(delay_ms);
        let name = self.name.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            debug!(cookie = %name, "Invalidation timer fired");
            on_fire();
        });

        let previous = self.lock().replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }

        debug!(cookie = %self.name, delay_ms, "Invalidation timer armed");
    }

    // == Cancel ==
    /// Cancels the armed timer. Cancelling with nothing armed is a no-op.
    pub fn cancel(&self) {
        if let Some(previous) = self.lock().take() {
            previous.abort();
            debug!(cookie = %self.name, "Invalidation timer cancelled");
        }
    }

    // == Is Armed ==
    /// Returns true while a timer is scheduled and has not fired.
    pub fn is_armed(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn deadline_after(delay_ms: i64) -> Instant {
    let now = Instant::now();
    let offset = Duration::from_millis(delay_ms.unsigned_abs());

    if delay_ms >= 0 {
        // Beyond the representable range the timer effectively never fires
        now.checked_add(offset)
            .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30))
    } else {
        now.checked_sub(offset).unwrap_or(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&fired);
        let make = move || {
            let fired = Arc::clone(&handle);
            Box::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (fired, make)
    }

    #[test]
    fn test_invalidation_delay() {
        assert_eq!(invalidation_delay_ms(10_000, 0, 500), 9_500);
        assert_eq!(invalidation_delay_ms(10_000, 0, -500), 10_500);
        assert_eq!(invalidation_delay_ms(1_000, 5_000, 500), -4_500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (fired, make) = counter();
        let timer = ExpiryTimer::new("test");

        timer.arm(1_000, make());
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_delay_fires_next_turn() {
        let (fired, make) = counter();
        let timer = ExpiryTimer::new("test");

        timer.arm(-86_400_000, make());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let (fired, make) = counter();
        let timer = ExpiryTimer::new("test");

        timer.arm(1_000, make());
        timer.arm(2_000, make());
        timer.arm(5_000, make());

        tokio::time::sleep(Duration::from_millis(4_000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "Replaced timers must not fire");
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_millis(1_001)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let (fired, make) = counter();
        let timer = ExpiryTimer::new("test");

        timer.cancel();
        timer.arm(100, make());
        timer.cancel();
        timer.cancel();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_pending_timer() {
        let (fired, make) = counter();
        let timer = ExpiryTimer::new("test");

        timer.arm(100, make());
        drop(timer);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
