//! # Model
//!
//! Value types shared by the transaction codec and the event client.
//!
//! ```text
//! primitives.rs — PublicKey, Hash256, Signature, Address, PublicAccount
//! uint64.rs     — [lo, hi] pairs and the u64 newtypes built on them
//! network.rs    — NetworkType, EntityVersion, packed version field
//! deadline.rs   — epoch-relative deadlines
//! hex_bytes.rs  — serde adapter for hex-encoded byte strings
//! ```

pub mod deadline;
pub mod hex_bytes;
pub mod network;
pub mod primitives;
pub mod uint64;

pub use deadline::{Deadline, DeadlineRangeError};
pub use network::{extract_network_type, extract_version, pack_version, EntityVersion, NetworkType};
pub use primitives::{Address, Hash256, ParseBytesError, PublicAccount, PublicKey, Signature};
pub use uint64::{Amount, BlockDuration, Height, MosaicId, NamespaceId, Uint64Pair};

use serde::{Deserialize, Serialize};

/// A quantity of one mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mosaic {
    pub id: MosaicId,
    pub amount: Amount,
}

impl Mosaic {
    pub fn new(id: MosaicId, amount: Amount) -> Self {
        Self { id, amount }
    }
}
