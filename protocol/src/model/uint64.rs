//! 64-bit values on the wire.
//!
//! Nodes never send 64-bit integers as JSON numbers. Every amount, id,
//! height and duration travels as `[lo, hi]`, two unsigned 32-bit halves,
//! and the binary layout stores the same two halves little-endian. This
//! module converts between that pair and typed `u64` newtypes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The `[lo, hi]` pair form of a 64-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uint64Pair(pub [u32; 2]);

impl Uint64Pair {
    pub fn lo(&self) -> u32 {
        self.0[0]
    }

    pub fn hi(&self) -> u32 {
        self.0[1]
    }
}

impl From<u64> for Uint64Pair {
    fn from(value: u64) -> Self {
        Self([value as u32, (value >> 32) as u32])
    }
}

impl From<Uint64Pair> for u64 {
    fn from(pair: Uint64Pair) -> Self {
        (u64::from(pair.0[1]) << 32) | u64::from(pair.0[0])
    }
}

/// Serde adapter for plain `u64` fields that travel as pairs.
///
/// ```
/// #[derive(serde::Deserialize)]
/// struct Lock {
///     #[serde(with = "catena_protocol::model::uint64::pair")]
///     duration: u64,
/// }
/// let lock: Lock = serde_json::from_str(r#"{"duration":[5,1]}"#).unwrap();
/// assert_eq!(lock.duration, (1u64 << 32) | 5);
/// ```
pub mod pair {
    use super::Uint64Pair;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        Uint64Pair::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Uint64Pair::deserialize(deserializer).map(u64::from)
    }
}

/// Serde adapter for signed 64-bit fields (deltas). The pair holds the
/// two's-complement bits.
pub mod signed_pair {
    use super::Uint64Pair;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        Uint64Pair::from(*value as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Uint64Pair::deserialize(deserializer).map(|pair| u64::from(pair) as i64)
    }
}

macro_rules! uint64_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                Uint64Pair::from(self.0).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Uint64Pair::deserialize(deserializer).map(|pair| Self(pair.into()))
            }
        }
    };
}

uint64_newtype!(
    /// A quantity of a mosaic in its smallest unit.
    Amount
);

uint64_newtype!(
    /// Mosaic identifier.
    MosaicId
);

uint64_newtype!(
    /// Namespace identifier.
    NamespaceId
);

uint64_newtype!(
    /// Block height.
    Height
);

uint64_newtype!(
    /// A duration measured in blocks.
    BlockDuration
);

impl fmt::Display for Uint64Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u64::from(*self))
    }
}
