//! Fixed-width byte values: public keys, hashes, signatures, addresses.
//!
//! On the JSON wire all of them travel as hex strings; in the binary layout
//! they are copied verbatim. Parsing is strict about length so a truncated
//! key never reaches the encoder.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::network::NetworkType;
use crate::config::{ADDRESS_LENGTH, HASH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Failure to turn text or a slice into a fixed-width value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBytesError {
    #[error("invalid hex in {kind}: {reason}")]
    Hex { kind: &'static str, reason: String },

    #[error("{kind} must be {expected} bytes, got {actual}")]
    Length {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Width of the value in bytes.
            pub const LENGTH: usize = $len;

            /// Wraps raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Copies a slice, rejecting any length other than [`Self::LENGTH`].
            pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseBytesError> {
                let array: [u8; $len] =
                    bytes.try_into().map_err(|_| ParseBytesError::Length {
                        kind: $kind,
                        expected: $len,
                        actual: bytes.len(),
                    })?;
                Ok(Self(array))
            }

            /// Parses a hex string (either case).
            pub fn from_hex(text: &str) -> Result<Self, ParseBytesError> {
                let bytes = hex::decode(text.trim()).map_err(|e| ParseBytesError::Hex {
                    kind: $kind,
                    reason: e.to_string(),
                })?;
                Self::from_slice(&bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Upper-case hex, the form nodes emit.
            pub fn to_hex(&self) -> String {
                hex::encode_upper(self.0)
            }

            /// Returns `true` when every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = ParseBytesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::from_hex(&text).map_err(D::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// A 32-byte account public key.
    PublicKey,
    PUBLIC_KEY_LENGTH,
    "public key"
);

fixed_bytes!(
    /// A 32-byte digest: transaction hashes, merkle hashes, lock secrets,
    /// drive root hashes.
    Hash256,
    HASH_LENGTH,
    "hash"
);

fixed_bytes!(
    /// A 64-byte transaction or cosignature signature.
    Signature,
    SIGNATURE_LENGTH,
    "signature"
);

fixed_bytes!(
    /// A decoded 25-byte account address. The first byte is the network type.
    Address,
    ADDRESS_LENGTH,
    "address"
);

impl Address {
    /// Network the address belongs to.
    pub fn network_type(&self) -> NetworkType {
        NetworkType(self.0[0])
    }
}

// ---------------------------------------------------------------------------
// PublicAccount
// ---------------------------------------------------------------------------

/// Typed handle for a signer: its public key and the network it signs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicAccount {
    pub public_key: PublicKey,
    pub network_type: NetworkType,
}

impl PublicAccount {
    pub fn new(public_key: PublicKey, network_type: NetworkType) -> Self {
        Self {
            public_key,
            network_type,
        }
    }

    /// Resolves a hex public key into an account on `network_type`.
    pub fn from_public_key(hex_key: &str, network_type: NetworkType) -> Result<Self, ParseBytesError> {
        Ok(Self::new(PublicKey::from_hex(hex_key)?, network_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing_is_case_insensitive() {
        let lower = PublicKey::from_hex(&"ab".repeat(32)).unwrap();
        let upper = PublicKey::from_hex(&"AB".repeat(32)).unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.to_hex(), "AB".repeat(32));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = Signature::from_hex(&"00".repeat(63)).unwrap_err();
        assert_eq!(
            err,
            ParseBytesError::Length {
                kind: "signature",
                expected: 64,
                actual: 63
            }
        );
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(matches!(
            Hash256::from_hex("zz"),
            Err(ParseBytesError::Hex { kind: "hash", .. })
        ));
    }

    #[test]
    fn address_carries_network_byte() {
        let mut raw = [0u8; 25];
        raw[0] = 0xA8;
        assert_eq!(Address::from_bytes(raw).network_type(), NetworkType::TEST_NET);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let key = PublicKey::from_bytes([7u8; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", "07".repeat(32)));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
