//! Expiry Module
//!
//! Expiry policies accepted by the cookie facade and their resolution to an
//! absolute instant.

use chrono::{DateTime, Duration, Utc};

/// Milliseconds in one day
const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

// == Expiry ==
/// When a persisted value stops being valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expiry {
    /// Absolute instant
    At(DateTime<Utc>),
    /// Relative number of days from the moment of writing (may be fractional)
    Days(f64),
    /// Relative duration from the moment of writing
    After(Duration),
}

impl Expiry {
    /// Shorthand for [`Expiry::Days`].
    pub fn days(days: f64) -> Self {
        Expiry::Days(days)
    }

    /// Shorthand for a relative expiry in milliseconds.
    pub fn millis(ms: i64) -> Self {
        Expiry::After(Duration::milliseconds(ms))
    }

    // == Resolve ==
    /// Resolves to an absolute instant relative to now.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        self.resolve_from(Utc::now())
    }

    /// Resolves to an absolute instant relative to `now`.
    ///
    /// A zero relative expiry means "no expiry" and yields `None`, as does a
    /// relative expiry too large to represent. Negative relative expiries
    /// resolve to an instant in the past.
    pub fn resolve_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Expiry::At(at) => Some(at),
            Expiry::Days(days) if days == 0.0 || days.is_nan() => None,
            Expiry::Days(days) => {
                let offset = Duration::try_milliseconds((days * MS_PER_DAY) as i64)?;
                now.checked_add_signed(offset)
            }
            Expiry::After(offset) if offset == Duration::zero() => None,
            Expiry::After(offset) => now.checked_add_signed(offset),
        }
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Expiry::At(at)
    }
}

impl From<Duration> for Expiry {
    fn from(offset: Duration) -> Self {
        Expiry::After(offset)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
