//! Transaction deadlines.
//!
//! On the wire a deadline is a millisecond offset from the network epoch
//! ([`NETWORK_EPOCH_MS`]). In memory it is an absolute UTC instant, truncated
//! to whole milliseconds so that converting back to the raw offset is exact.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::uint64::Uint64Pair;
use crate::config::NETWORK_EPOCH_MS;

/// A raw offset that does not map to a representable instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("deadline offset {0}ms is out of range")]
pub struct DeadlineRangeError(pub u64);

/// Absolute instant after which the network rejects a transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Deadline(DateTime<Utc>);

impl Deadline {
    /// Maps a raw epoch offset to an absolute instant.
    pub fn from_raw(offset_ms: u64) -> Result<Self, DeadlineRangeError> {
        i64::try_from(offset_ms)
            .ok()
            .and_then(|offset| NETWORK_EPOCH_MS.checked_add(offset))
            .and_then(DateTime::from_timestamp_millis)
            .map(Self)
            .ok_or(DeadlineRangeError(offset_ms))
    }

    /// Millisecond offset from the network epoch. Instants before the epoch
    /// clamp to zero.
    pub fn to_raw(&self) -> u64 {
        u64::try_from(self.0.timestamp_millis() - NETWORK_EPOCH_MS).unwrap_or(0)
    }

    /// A deadline `window` from now.
    pub fn after(window: Duration) -> Self {
        let now = Utc::now().timestamp_millis();
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let target = now.saturating_add(window_ms);
        // Out-of-range targets fall back to the latest instant chrono accepts.
        Self(DateTime::from_timestamp_millis(target).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Builds a deadline from an absolute instant, dropping sub-millisecond
    /// precision.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        let millis = instant.timestamp_millis();
        Self(DateTime::from_timestamp_millis(millis).unwrap_or(instant))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl fmt::Debug for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deadline({})", self.0.to_rfc3339())
    }
}

impl Serialize for Deadline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Uint64Pair::from(self.to_raw()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Deadline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::from(Uint64Pair::deserialize(deserializer)?);
        Self::from_raw(raw).map_err(D::Error::custom)
    }
}
