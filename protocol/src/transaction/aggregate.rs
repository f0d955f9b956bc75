//! Aggregate transactions and their resolver.
//!
//! An aggregate bundles inner transactions that succeed or fail together,
//! plus the cosignatures of every account besides the aggregate signer.
//! Inner transactions travel without deadline, fee or signature of their
//! own; once decoded they take the aggregate's. Inner metadata is kept when
//! the node sent some and inherited from the aggregate otherwise.
//!
//! Nesting is rejected: an aggregate inside an aggregate, or any inner
//! transaction that fails to decode, fails the whole aggregate with
//! [`DecodeError::AggregateIntegrity`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::body::TransactionBody;
use super::entity_type::EntityType;
use super::envelope::{extract_envelope, TransactionEnvelope};
use super::error::{DecodeError, EncodeError};
use super::registry::decoder_for;
use super::Transaction;
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::{COSIGNATURE_SIZE, EMBEDDED_HEADER_SIZE, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::model::{PublicKey, Signature};

/// A cosigner's signature over the aggregate hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosignature {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// Body of [`EntityType::AggregateCompleted`] and
/// [`EntityType::AggregateBonded`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateBody {
    pub transactions: Vec<Transaction>,
    pub cosignatures: Vec<Cosignature>,
}

impl AggregateBody {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            cosignatures: Vec::new(),
        }
    }

    /// Copies the aggregate's deadline, fee and signature into every inner
    /// transaction and hands down metadata to inner transactions without
    /// their own.
    pub fn propagate(&mut self, envelope: &TransactionEnvelope) {
        for inner in &mut self.transactions {
            inner.envelope.deadline = envelope.deadline;
            inner.envelope.max_fee = envelope.max_fee;
            inner.envelope.signature = envelope.signature;
            if inner.envelope.metadata.is_none() {
                inner.envelope.metadata = envelope.metadata.clone();
            }
        }
    }
}

static COSIGNATURE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("signer", PUBLIC_KEY_LENGTH),
        SchemaAttribute::bytes("signature", SIGNATURE_LENGTH),
    ],
};

static AGGREGATE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("payloadSize", 4),
        SchemaAttribute::array("transactions", 1, Length::Field("payloadSize")),
        SchemaAttribute::table_array("cosignatures", &COSIGNATURE_SCHEMA, Length::Remaining),
    ],
};

impl BodyCodec for AggregateBody {
    fn body_size(&self) -> usize {
        4 + self
            .transactions
            .iter()
            .map(Transaction::embedded_size)
            .sum::<usize>()
            + COSIGNATURE_SIZE * self.cosignatures.len()
    }

    fn schema() -> &'static Schema {
        &AGGREGATE_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let mut payload = Vec::new();
        for inner in &self.transactions {
            payload.extend(inner.encode_embedded()?);
        }
        let cosignatures = self
            .cosignatures
            .iter()
            .map(|cosignature| {
                let mut row = FieldBuffer::new();
                row.put_bytes("signer", cosignature.signer.as_bytes())
                    .put_bytes("signature", cosignature.signature.as_bytes());
                row
            })
            .collect();
        fields
            .put_count("payloadSize", 4, payload.len())?
            .put_bytes("transactions", &payload)
            .put_table_array("cosignatures", cosignatures);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        let mut payload = fields.bytes("transactions")?;
        let mut transactions = Vec::new();
        while !payload.is_empty() {
            let index = transactions.len();
            let (inner, rest) = split_embedded(payload).map_err(|e| integrity(index, e))?;
            transactions.push(decode_embedded(inner).map_err(|e| integrity(index, e))?);
            payload = rest;
        }

        let cosignatures = fields
            .table_array("cosignatures")?
            .iter()
            .map(|row| {
                Ok(Cosignature {
                    signer: PublicKey::from_bytes(row.array("signer")?),
                    signature: Signature::from_bytes(row.array("signature")?),
                })
            })
            .collect::<Result<_, DecodeError>>()?;

        Ok(Self {
            transactions,
            cosignatures,
        })
    }
}

/// Cuts the next embedded transaction off the aggregate payload using its
/// leading size field.
fn split_embedded(payload: &[u8]) -> Result<(&[u8], &[u8]), DecodeError> {
    let Some(size) = payload.get(..4) else {
        return Err(DecodeError::Truncated {
            field: "size",
            needed: 4,
            available: payload.len(),
        });
    };
    let size = u32::from_le_bytes([size[0], size[1], size[2], size[3]]) as usize;
    if size < EMBEDDED_HEADER_SIZE || size > payload.len() {
        return Err(DecodeError::SizeMismatch {
            declared: size,
            actual: payload.len(),
        });
    }
    Ok(payload.split_at(size))
}

/// Rejects nested aggregates before any body parsing happens.
fn decode_embedded(bytes: &[u8]) -> Result<Transaction, DecodeError> {
    let code = u16::from_le_bytes([bytes[EMBEDDED_HEADER_SIZE - 2], bytes[EMBEDDED_HEADER_SIZE - 1]]);
    if EntityType::try_from(code)?.is_aggregate() {
        return Err(nested());
    }
    Transaction::from_embedded_bytes(bytes)
}

fn nested() -> DecodeError {
    DecodeError::MalformedBody {
        entity_type: EntityType::AggregateCompleted,
        reason: "aggregates cannot contain aggregates".into(),
    }
}

fn integrity(index: usize, err: DecodeError) -> DecodeError {
    DecodeError::AggregateIntegrity {
        index,
        reason: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AggregateJson {
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default)]
    cosignatures: Vec<Cosignature>,
}

/// Decodes the JSON form of either aggregate kind. Inner transactions are
/// `{"transaction": {..}, "meta": {..}}` objects resolved through the type
/// registry.
pub(crate) fn decode_aggregate_json(
    entity_type: EntityType,
    value: &Value,
    envelope: TransactionEnvelope,
) -> Result<Transaction, DecodeError> {
    let json = AggregateJson::deserialize(value).map_err(|e| DecodeError::MalformedBody {
        entity_type,
        reason: e.to_string(),
    })?;

    let transactions = json
        .transactions
        .iter()
        .enumerate()
        .map(|(index, item)| decode_inner_json(item).map_err(|e| integrity(index, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let body = AggregateBody {
        transactions,
        cosignatures: json.cosignatures,
    };
    let body = match entity_type {
        EntityType::AggregateBonded => TransactionBody::AggregateBonded(body),
        _ => TransactionBody::AggregateCompleted(body),
    };
    Ok(Transaction::new(envelope, body))
}

fn decode_inner_json(item: &Value) -> Result<Transaction, DecodeError> {
    let transaction = item
        .get("transaction")
        .ok_or_else(|| DecodeError::MalformedEnvelope("missing `transaction` object".into()))?;
    let (entity_type, mut envelope) = extract_envelope(transaction, item.get("meta"))?;
    if entity_type.is_aggregate() {
        return Err(nested());
    }
    envelope.deadline = None;
    envelope.signature = None;
    decoder_for(entity_type)(transaction, envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosignature_rows_are_96_bytes() {
        assert_eq!(COSIGNATURE_SCHEMA.fixed_size(), Some(COSIGNATURE_SIZE));
    }

    #[test]
    fn empty_aggregate_is_four_bytes() {
        let body = AggregateBody::default();
        assert_eq!(body.encode_body().unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(AggregateBody::decode_body(&[0, 0, 0, 0]).unwrap(), body);
    }

    #[test]
    fn short_inner_size_is_an_integrity_error() {
        let mut bytes = vec![8, 0, 0, 0];
        bytes.extend([8, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            AggregateBody::decode_body(&bytes),
            Err(DecodeError::AggregateIntegrity { index: 0, .. })
        ));
    }

    #[test]
    fn cosignatures_fill_the_tail() {
        let body = AggregateBody {
            transactions: vec![],
            cosignatures: vec![
                Cosignature {
                    signer: PublicKey::from_bytes([1; 32]),
                    signature: Signature::from_bytes([2; 64]),
                },
                Cosignature {
                    signer: PublicKey::from_bytes([3; 32]),
                    signature: Signature::from_bytes([4; 64]),
                },
            ],
        };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), 4 + 2 * 96);
        assert_eq!(AggregateBody::decode_body(&bytes).unwrap(), body);
    }
}
