//! Hash locks and secret locks.

use serde::{Deserialize, Serialize};

use super::common::{mosaic_fields, read_mosaic, wire_enum, MOSAIC_SCHEMA, MOSAIC_SIZE};
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::{ADDRESS_LENGTH, HASH_LENGTH};
use crate::model::{hex_bytes, Address, BlockDuration, Hash256, Mosaic};

wire_enum! {
    /// Hash function a secret lock is opened with.
    pub enum HashAlgorithm: u8, "hash algorithm" {
        Sha3_256 = 0,
        Keccak256 = 1,
        Hash160 = 2,
        Hash256 = 3,
    }
}

// ---------------------------------------------------------------------------
// HashLock
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::HashLock`]: locks funds until the bonded
/// aggregate with `hash` completes or the lock expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashLockBody {
    pub mosaic: Mosaic,
    pub duration: BlockDuration,
    pub hash: Hash256,
}

static HASH_LOCK_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::table("mosaic", &MOSAIC_SCHEMA),
        SchemaAttribute::uint64("duration"),
        SchemaAttribute::bytes("hash", HASH_LENGTH),
    ],
};

impl BodyCodec for HashLockBody {
    fn body_size(&self) -> usize {
        MOSAIC_SIZE + 8 + HASH_LENGTH
    }

    fn schema() -> &'static Schema {
        &HASH_LOCK_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_table("mosaic", mosaic_fields(&self.mosaic))
            .put_u64("duration", self.duration.value())
            .put_bytes("hash", self.hash.as_bytes());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            mosaic: read_mosaic(fields.table("mosaic")?)?,
            duration: BlockDuration::new(fields.u64("duration")?),
            hash: Hash256::from_bytes(fields.array("hash")?),
        })
    }
}

// ---------------------------------------------------------------------------
// SecretLock
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::SecretLock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretLockBody {
    pub mosaic: Mosaic,
    pub duration: BlockDuration,
    pub hash_algorithm: HashAlgorithm,
    pub secret: Hash256,
    pub recipient: Address,
}

static SECRET_LOCK_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::table("mosaic", &MOSAIC_SCHEMA),
        SchemaAttribute::uint64("duration"),
        SchemaAttribute::scalar("hashAlgorithm", 1),
        SchemaAttribute::bytes("secret", HASH_LENGTH),
        SchemaAttribute::bytes("recipient", ADDRESS_LENGTH),
    ],
};

impl BodyCodec for SecretLockBody {
    fn body_size(&self) -> usize {
        MOSAIC_SIZE + 8 + 1 + HASH_LENGTH + ADDRESS_LENGTH
    }

    fn schema() -> &'static Schema {
        &SECRET_LOCK_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_table("mosaic", mosaic_fields(&self.mosaic))
            .put_u64("duration", self.duration.value())
            .put_u8("hashAlgorithm", self.hash_algorithm.to_raw())
            .put_bytes("secret", self.secret.as_bytes())
            .put_bytes("recipient", self.recipient.as_bytes());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            mosaic: read_mosaic(fields.table("mosaic")?)?,
            duration: BlockDuration::new(fields.u64("duration")?),
            hash_algorithm: HashAlgorithm::try_from(fields.u8("hashAlgorithm")?)?,
            secret: Hash256::from_bytes(fields.array("secret")?),
            recipient: Address::from_bytes(fields.array("recipient")?),
        })
    }
}

// ---------------------------------------------------------------------------
// SecretProof
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::SecretProof`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretProofBody {
    pub hash_algorithm: HashAlgorithm,
    pub secret: Hash256,
    pub recipient: Address,
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

static SECRET_PROOF_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("hashAlgorithm", 1),
        SchemaAttribute::bytes("secret", HASH_LENGTH),
        SchemaAttribute::bytes("recipient", ADDRESS_LENGTH),
        SchemaAttribute::scalar("proofSize", 2),
        SchemaAttribute::array("proof", 1, Length::Field("proofSize")),
    ],
};

impl BodyCodec for SecretProofBody {
    fn body_size(&self) -> usize {
        1 + HASH_LENGTH + ADDRESS_LENGTH + 2 + self.proof.len()
    }

    fn schema() -> &'static Schema {
        &SECRET_PROOF_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u8("hashAlgorithm", self.hash_algorithm.to_raw())
            .put_bytes("secret", self.secret.as_bytes())
            .put_bytes("recipient", self.recipient.as_bytes())
            .put_count("proofSize", 2, self.proof.len())?
            .put_bytes("proof", &self.proof);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            hash_algorithm: HashAlgorithm::try_from(fields.u8("hashAlgorithm")?)?,
            secret: Hash256::from_bytes(fields.array("secret")?),
            recipient: Address::from_bytes(fields.array("recipient")?),
            proof: fields.bytes("proof")?.to_vec(),
        })
    }
}
