//! # Transaction Module
//!
//! Decoding, construction, canonical encoding and signing of network
//! transactions. Every variant the node speaks is one arm of
//! [`TransactionBody`]; the shared outer fields live in
//! [`TransactionEnvelope`].
//!
//! ## Architecture
//!
//! ```text
//! entity_type.rs  — numeric type codes and default versions
//! envelope.rs     — common envelope + extraction from JSON
//! registry.rs     — type code → JSON decoder
//! body.rs         — the closed set of variant payloads
//! aggregate.rs    — aggregate bodies, inner propagation, cosignatures
//! builder.rs      — fluent TransactionBuilder
//! signing.rs      — KeyPair, signing, transaction hashes, cosigning
//! error.rs        — DecodeError / EncodeError
//! transfer.rs, namespace.rs, mosaic.rs, multisig.rs, lock.rs, account.rs,
//! metadata.rs, contract.rs, exchange.rs, storage.rs, liquidity.rs,
//! upgrade.rs      — per-variant bodies and their wire schemas
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Decode**: [`decode_transaction`] turns a node's JSON into a
//!    [`Transaction`], or [`Transaction::from_bytes`] reads a binary payload.
//! 2. **Build**: [`TransactionBuilder`] assembles an envelope around a body.
//! 3. **Encode**: [`Transaction::encode`] produces the canonical payload.
//! 4. **Sign**: [`sign_transaction`] signs that payload for one network.
//!
//! Aggregate inner transactions always carry their aggregate's deadline,
//! fee and signature. [`Transaction::new`] and [`Transaction::set_signature`]
//! keep that true.

pub mod account;
pub mod aggregate;
pub mod body;
pub mod builder;
pub(crate) mod common;
pub mod contract;
pub mod entity_type;
pub mod envelope;
pub mod error;
pub mod exchange;
pub mod liquidity;
pub mod lock;
pub mod metadata;
pub mod mosaic;
pub mod multisig;
pub mod namespace;
pub mod registry;
pub mod signing;
pub mod storage;
pub mod transfer;
pub mod upgrade;

use std::fmt;

use serde_json::Value;

pub use aggregate::{AggregateBody, Cosignature};
pub use body::TransactionBody;
pub use builder::TransactionBuilder;
pub use common::{KeyModification, ModificationType, UnknownTag};
pub use entity_type::EntityType;
pub use envelope::{extract_envelope, TransactionEnvelope, TransactionMetadata};
pub use error::{DecodeError, EncodeError};
pub use registry::{decode_transaction, decode_transaction_str, decoder_for, DecodeFn};
pub use signing::{cosign, sign_transaction, transaction_hash, KeyPair, SigningError};

use crate::codec::{FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::{
    EMBEDDED_HEADER_SIZE, MAX_WIRE_ENTITY_VERSION, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
    TRANSACTION_HEADER_SIZE,
};
use crate::model::{
    extract_network_type, extract_version, pack_version, Amount, Deadline, PublicKey, Signature,
};

static HEADER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("size", 4),
        SchemaAttribute::bytes("signature", SIGNATURE_LENGTH),
        SchemaAttribute::bytes("signer", PUBLIC_KEY_LENGTH),
        SchemaAttribute::scalar("version", 4),
        SchemaAttribute::scalar("type", 2),
        SchemaAttribute::uint64("maxFee"),
        SchemaAttribute::uint64("deadline"),
        SchemaAttribute::array("body", 1, Length::Remaining),
    ],
};

static EMBEDDED_HEADER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("size", 4),
        SchemaAttribute::bytes("signer", PUBLIC_KEY_LENGTH),
        SchemaAttribute::scalar("version", 4),
        SchemaAttribute::scalar("type", 2),
        SchemaAttribute::array("body", 1, Length::Remaining),
    ],
};

/// A decoded or constructed transaction: common envelope plus the
/// variant-specific body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub envelope: TransactionEnvelope,
    pub body: TransactionBody,
}

impl Transaction {
    /// Pairs an envelope with a body. Aggregate bodies receive the
    /// envelope's deadline, fee and signature (and metadata where missing).
    pub fn new(envelope: TransactionEnvelope, mut body: TransactionBody) -> Self {
        if let Some(aggregate) = body.as_aggregate_mut() {
            aggregate.propagate(&envelope);
        }
        Self { envelope, body }
    }

    /// Parses a node's `{"transaction": .., "meta": ..}` JSON object.
    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        decode_transaction(value)
    }

    pub fn from_json_str(text: &str) -> Result<Self, DecodeError> {
        decode_transaction_str(text)
    }

    pub fn entity_type(&self) -> EntityType {
        self.body.entity_type()
    }

    /// Byte length of the standalone payload produced by [`Self::encode`].
    pub fn size(&self) -> usize {
        TRANSACTION_HEADER_SIZE + self.body.body_size()
    }

    /// Byte length of this transaction as an aggregate inner transaction.
    pub fn embedded_size(&self) -> usize {
        EMBEDDED_HEADER_SIZE + self.body.body_size()
    }

    /// Attaches a signature and hands it down to inner transactions.
    pub fn set_signature(&mut self, signature: Signature) {
        self.envelope.signature = Some(signature);
        if let Some(aggregate) = self.body.as_aggregate_mut() {
            aggregate.propagate(&self.envelope);
        }
    }

    fn wire_version(&self) -> Result<u32, EncodeError> {
        let version = self.envelope.version;
        if version.0 > MAX_WIRE_ENTITY_VERSION {
            return Err(EncodeError::VersionOutOfRange(version.0));
        }
        // Fits: 24 version bits plus the network byte.
        Ok(pack_version(self.envelope.network_type, version) as u32)
    }

    // -----------------------------------------------------------------------
    // Encode
    // -----------------------------------------------------------------------

    /// Canonical binary payload: 122-byte header followed by the body.
    /// Unset signature and deadline are written as zeros.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let body = self.body.encode_body()?;
        let signature = self
            .envelope
            .signature
            .map(|s| *s.as_bytes())
            .unwrap_or([0; SIGNATURE_LENGTH]);
        let deadline = self.envelope.deadline.map(|d| d.to_raw()).unwrap_or(0);

        let mut fields = FieldBuffer::new();
        fields
            .put_count("size", 4, TRANSACTION_HEADER_SIZE + body.len())?
            .put_bytes("signature", &signature)
            .put_bytes("signer", self.envelope.signer.public_key.as_bytes())
            .put_u32("version", self.wire_version()?)
            .put_u16("type", self.entity_type().code())
            .put_u64("maxFee", self.envelope.max_fee.value())
            .put_u64("deadline", deadline)
            .put_bytes("body", &body);
        HEADER_SCHEMA.serialize(&fields)
    }

    /// Payload of this transaction inside an aggregate: signer, version and
    /// type only.
    pub fn encode_embedded(&self) -> Result<Vec<u8>, EncodeError> {
        let body = self.body.encode_body()?;

        let mut fields = FieldBuffer::new();
        fields
            .put_count("size", 4, EMBEDDED_HEADER_SIZE + body.len())?
            .put_bytes("signer", self.envelope.signer.public_key.as_bytes())
            .put_u32("version", self.wire_version()?)
            .put_u16("type", self.entity_type().code())
            .put_bytes("body", &body);
        EMBEDDED_HEADER_SCHEMA.serialize(&fields)
    }

    // -----------------------------------------------------------------------
    // Decode
    // -----------------------------------------------------------------------

    /// Reads a standalone payload produced by [`Self::encode`].
    ///
    /// Node metadata is not part of the payload, so the result has none.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let fields = HEADER_SCHEMA.parse(bytes)?;
        check_size(&fields, bytes.len())?;

        let (entity_type, mut envelope) = read_header(&fields)?;
        let signature = Signature::from_bytes(fields.array("signature")?);
        envelope.signature = (!signature.is_zero()).then_some(signature);
        envelope.max_fee = Amount::new(fields.u64("maxFee")?);
        envelope.deadline = match fields.u64("deadline")? {
            0 => None,
            raw => Some(
                Deadline::from_raw(raw)
                    .map_err(|e| DecodeError::MalformedEnvelope(format!("deadline: {e}")))?,
            ),
        };

        let body = TransactionBody::decode_body(entity_type, fields.bytes("body")?)?;
        Ok(Self::new(envelope, body))
    }

    /// Reads one inner transaction of an aggregate. Deadline, fee and
    /// signature stay unset until the enclosing aggregate supplies them.
    pub fn from_embedded_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let fields = EMBEDDED_HEADER_SCHEMA.parse(bytes)?;
        check_size(&fields, bytes.len())?;

        let (entity_type, envelope) = read_header(&fields)?;
        let body = TransactionBody::decode_body(entity_type, fields.bytes("body")?)?;
        Ok(Self::new(envelope, body))
    }
}

fn check_size(fields: &FieldBuffer, actual: usize) -> Result<(), DecodeError> {
    let declared = fields.u32("size")? as usize;
    if declared != actual {
        return Err(DecodeError::SizeMismatch { declared, actual });
    }
    Ok(())
}

/// Type code plus the envelope fields both header layouts share.
fn read_header(fields: &FieldBuffer) -> Result<(EntityType, TransactionEnvelope), DecodeError> {
    let entity_type = EntityType::try_from(fields.u16("type")?)?;
    let packed = u64::from(fields.u32("version")?);
    let network_type = extract_network_type(packed);
    let signer = PublicKey::from_bytes(fields.array("signer")?);

    Ok((
        entity_type,
        TransactionEnvelope::new(network_type, extract_version(packed), signer),
    ))
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{} on {} by {}",
            self.entity_type(),
            self.envelope.version,
            self.envelope.network_type,
            self.envelope.signer.public_key.to_hex()
        )
    }
}
