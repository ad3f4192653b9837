//! Envelope Module
//!
//! The persisted representation of a cached value: `{"d": value, "x": expiry}`
//! where `x` is the absolute expiry in epoch milliseconds and `0` means no
//! expiry was set when it was written.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

// == Envelope ==
/// A value paired with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    /// The cached value
    pub d: T,
    /// Expiry timestamp (Unix milliseconds), 0 = none
    pub x: i64,
}

impl<T> Envelope<T> {
    // == Constructor ==
    /// Wraps a value with an optional absolute expiry.
    pub fn new(value: T, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            d: value,
            x: expires.map_or(0, |at| at.timestamp_millis()),
        }
    }

    /// Returns the expiry instant, or None when written without one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.x == 0 {
            None
        } else {
            DateTime::from_timestamp_millis(self.x)
        }
    }

    // == Is Restorable ==
    /// Checks whether the envelope may seed an in-memory cache at `now_ms`.
    ///
    /// Boundary condition: restorable only while `now_ms` is strictly before
    /// the expiry. An envelope written without expiry (`x == 0`) is never
    /// restorable.
    pub fn is_restorable_at(&self, now_ms: i64) -> bool {
        self.x != 0 && now_ms < self.x
    }
}

// == Encode ==
/// Serializes a value and its expiry into the slot string.
pub fn encode<T: Serialize>(value: &T, expires: Option<DateTime<Utc>>) -> Result<String> {
    Ok(serde_json::to_string(&Envelope::new(value, expires))?)
}

// == Decode ==
/// Parses a slot string back into an envelope.
///
/// Returns None when the input is absent, is not JSON, is not an object, has
/// no numeric `x`, has no `d`, or `d` does not match `T`. Never fails
/// outward.
pub fn decode<T: DeserializeOwned>(raw: Option<&str>) -> Option<Envelope<T>> {
    let mut object = match serde_json::from_str::<Value>(raw?).ok()? {
        Value::Object(object) => object,
        _ => return None,
    };

    let x = match object.get("x")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    let d = serde_json::from_value(object.remove("d")?).ok()?;

    Some(Envelope { d, x })
}
