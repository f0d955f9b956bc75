//! Network identifiers and the packed version field.
//!
//! Every transaction carries a single integer that packs two things: the
//! network the transaction is valid on and the entity (format) version of
//! its body. Read as little-endian bytes, byte 1 is the network type and the
//! remaining 56 bits, byte 0 followed by bytes 2..8, form the version.
//!
//! ```text
//!  byte:   0        1         2        3   ...   7
//!        ┌────────┬─────────┬────────┬─────────────┐
//!        │ ver[0] │ network │ ver[1] │ ver[2..7]   │
//!        └────────┴─────────┴────────┴─────────────┘
//! ```
//!
//! Both directions are pure bit shuffles: total for every `u64`, and the
//! network never depends on the version bits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the network a transaction or address belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkType(pub u8);

impl NetworkType {
    pub const MAIN_NET: Self = Self(0xB8);
    pub const TEST_NET: Self = Self(0xA8);
    pub const PRIVATE: Self = Self(0xC8);
    pub const PRIVATE_TEST: Self = Self(0xB0);
    pub const MIJIN: Self = Self(0x60);
    pub const MIJIN_TEST: Self = Self(0x90);

    /// Human-readable name, if the identifier is a known network.
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::MAIN_NET => Some("MAIN_NET"),
            Self::TEST_NET => Some("TEST_NET"),
            Self::PRIVATE => Some("PRIVATE"),
            Self::PRIVATE_TEST => Some("PRIVATE_TEST"),
            Self::MIJIN => Some("MIJIN"),
            Self::MIJIN_TEST => Some("MIJIN_TEST"),
            _ => None,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

impl fmt::Debug for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkType({})", self)
    }
}

/// Format version of a transaction body. Only the low 56 bits are
/// representable in the packed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityVersion(pub u64);

impl fmt::Display for EntityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network type from a packed version value: byte 1 of its little-endian form.
pub fn extract_network_type(packed: u64) -> NetworkType {
    NetworkType(packed.to_le_bytes()[1])
}

/// Entity version from a packed version value: the 56 bits that remain once
/// byte 1 is taken out.
pub fn extract_version(packed: u64) -> EntityVersion {
    EntityVersion((packed & 0xFF) | ((packed >> 16) << 8))
}

/// Inverse of [`extract_network_type`] + [`extract_version`].
///
/// Version bits above 56 are dropped.
pub fn pack_version(network_type: NetworkType, version: EntityVersion) -> u64 {
    (version.0 & 0xFF) | (u64::from(network_type.0) << 8) | ((version.0 >> 8) << 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_is_byte_one_little_endian() {
        let packed = 0x9000_3605u64;
        assert_eq!(extract_network_type(packed), NetworkType(0x36));
        assert_eq!(extract_version(packed), EntityVersion(0x90_0005));
    }

    #[test]
    fn network_ignores_other_bits() {
        let samples = [
            0u64,
            1,
            0xFF,
            0xA800,
            0xFFFF_FFFF_FFFF_00FF,
            0x1234_5678_9ABC_DEF0,
            u64::MAX,
        ];
        for base in samples {
            let expected = base.to_le_bytes()[1];
            for noise in [0u64, 0xFF, 0xFFFF_FFFF_FFFF_0000, 0x0101_0101_0101_0001] {
                let mixed = (base & 0xFF00) | (noise & !0xFF00);
                assert_eq!(extract_network_type(mixed).0, expected);
            }
        }
    }

    #[test]
    fn pack_is_inverse_of_extract() {
        for packed in [0u64, 0xA803, 0x9000_3605, 0x00FF_FFFF_FFFF_FFFF, u64::MAX] {
            let network = extract_network_type(packed);
            let version = extract_version(packed);
            assert_eq!(pack_version(network, version), packed);
        }
    }

    #[test]
    fn unknown_network_displays_as_hex() {
        assert_eq!(NetworkType(0x36).to_string(), "0x36");
        assert_eq!(NetworkType::MIJIN_TEST.to_string(), "MIJIN_TEST");
    }
}
