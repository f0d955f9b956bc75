//! # Protocol Configuration & Constants
//!
//! Every fixed number of the wire protocol lives here: field widths, header
//! layouts, the network epoch, and the client defaults. Encoder, decoder and
//! event client all read from this module so the layouts cannot drift apart.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Network epoch in Unix milliseconds (2016-04-01T00:00:00Z).
///
/// Deadlines and block timestamps travel as millisecond offsets from this
/// instant, never as Unix time.
pub const NETWORK_EPOCH_MS: i64 = 1_459_468_800_000;

/// Default deadline window applied by the transaction builder.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(2 * 60 * 60);

// ---------------------------------------------------------------------------
// Field Widths
// ---------------------------------------------------------------------------

/// Public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Hash length in bytes (SHA3-256 digests, merkle hashes, secrets).
pub const HASH_LENGTH: usize = 32;

/// Signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Decoded address length in bytes: network byte, 20-byte key hash, 4-byte
/// checksum.
pub const ADDRESS_LENGTH: usize = 25;

/// Width of one half of a 64-bit wire value.
pub const UINT64_HALF_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Transaction Layout
// ---------------------------------------------------------------------------

/// Byte length of a standalone transaction header:
/// size(4) + signature(64) + signer(32) + version(4) + type(2) + maxFee(8) + deadline(8).
pub const TRANSACTION_HEADER_SIZE: usize = 4 + SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH + 4 + 2 + 8 + 8;

/// Byte length of the header carried by transactions embedded in an
/// aggregate: size(4) + signer(32) + version(4) + type(2).
pub const EMBEDDED_HEADER_SIZE: usize = 4 + PUBLIC_KEY_LENGTH + 4 + 2;

/// Offset of the first signed byte in a standalone payload. Size, signature
/// and signer are never covered by the signature.
pub const SIGNED_DATA_OFFSET: usize = 4 + SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH;

/// Byte length of one aggregate cosignature: signer key + signature.
pub const COSIGNATURE_SIZE: usize = PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH;

/// Largest entity version that fits the packed 32-bit version field
/// (low byte plus the two bytes above the network byte).
pub const MAX_WIRE_ENTITY_VERSION: u64 = 0x00FF_FFFF;

// ---------------------------------------------------------------------------
// Event Client Defaults
// ---------------------------------------------------------------------------

/// Default websocket endpoint of a local node.
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:3000/ws";

/// How long a fresh connection may take to announce its uid.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on handler invocations running at the same time.
pub const DEFAULT_MAX_IN_FLIGHT_HANDLERS: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes_match_layout() {
        assert_eq!(TRANSACTION_HEADER_SIZE, 122);
        assert_eq!(EMBEDDED_HEADER_SIZE, 42);
        assert_eq!(SIGNED_DATA_OFFSET, 100);
    }
}
