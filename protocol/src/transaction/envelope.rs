//! Common transaction envelope and its extraction from JSON.
//!
//! Every variant shares the same outer fields: the packed network/version
//! integer, signer, maximum fee, deadline and signature, plus the optional
//! `meta` object a node attaches once it has seen the transaction. The
//! extractor turns those into a [`TransactionEnvelope`] before any
//! variant-specific field is looked at.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity_type::EntityType;
use super::error::DecodeError;
use crate::model::{
    extract_network_type, extract_version, Amount, Deadline, EntityVersion, Hash256, Height,
    NetworkType, PublicAccount, PublicKey, Signature, Uint64Pair,
};

/// Correlating data a node attaches to a transaction it has seen.
///
/// Every field is optional: unconfirmed transactions have no height, inner
/// transactions carry their aggregate's id and hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    #[serde(default)]
    pub height: Option<Height>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub hash: Option<Hash256>,
    #[serde(default)]
    pub merkle_component_hash: Option<Hash256>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub aggregate_hash: Option<Hash256>,
    #[serde(default)]
    pub aggregate_id: Option<String>,
}

/// Fields common to every transaction variant.
///
/// `deadline` and `signature` are unset on transactions that have not been
/// prepared for broadcast and on inner transactions before the aggregate
/// resolver fills them in; the encoder writes zeros for both, and binary
/// decoding reads zeros back as unset. An absent fee is a zero fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub network_type: NetworkType,
    pub version: EntityVersion,
    pub deadline: Option<Deadline>,
    pub max_fee: Amount,
    pub signature: Option<Signature>,
    pub signer: PublicAccount,
    pub metadata: Option<TransactionMetadata>,
}

impl TransactionEnvelope {
    /// An unsigned envelope with no deadline, fee or metadata.
    pub fn new(network_type: NetworkType, version: EntityVersion, signer: PublicKey) -> Self {
        Self {
            network_type,
            version,
            deadline: None,
            max_fee: Amount::default(),
            signature: None,
            signer: PublicAccount::new(signer, network_type),
            metadata: None,
        }
    }

    /// Whether a signature has been attached.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Hash the node reported for this transaction, if any.
    pub fn hash(&self) -> Option<Hash256> {
        self.metadata.as_ref().and_then(|meta| meta.hash)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Raw envelope fields as they appear on the JSON wire. Keys and signatures
/// stay text here so each failure can be reported against its field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    version: u64,
    signer: String,
    #[serde(default)]
    max_fee: Option<Uint64Pair>,
    #[serde(default)]
    deadline: Option<Uint64Pair>,
    #[serde(default)]
    signature: Option<String>,
}

/// Reads the type code and envelope of `transaction`, attaching `meta` when
/// present and not `null`.
///
/// The type code is checked first, so an unsupported transaction reports
/// [`DecodeError::UnrecognizedType`] even when its other fields are odd.
pub fn extract_envelope(
    transaction: &Value,
    meta: Option<&Value>,
) -> Result<(EntityType, TransactionEnvelope), DecodeError> {
    let code = transaction
        .get("type")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed("missing or non-numeric `type`"))?;
    let code =
        u16::try_from(code).map_err(|_| malformed(format!("type {code} is out of range")))?;
    let entity_type = EntityType::try_from(code)?;

    let raw = RawEnvelope::deserialize(transaction).map_err(|e| malformed(e.to_string()))?;

    let network_type = extract_network_type(raw.version);
    let signer = PublicKey::from_hex(&raw.signer)
        .map_err(|e| malformed(format!("signer: {e}")))?;
    let signature = match raw.signature.as_deref() {
        None | Some("") => None,
        Some(text) => {
            let signature =
                Signature::from_hex(text).map_err(|e| malformed(format!("signature: {e}")))?;
            (!signature.is_zero()).then_some(signature)
        }
    };
    let deadline = raw
        .deadline
        .map(u64::from)
        .filter(|offset| *offset != 0)
        .map(Deadline::from_raw)
        .transpose()
        .map_err(|e| malformed(format!("deadline: {e}")))?;
    let metadata = match meta {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            TransactionMetadata::deserialize(value)
                .map_err(|e| malformed(format!("meta: {e}")))?,
        ),
    };

    Ok((
        entity_type,
        TransactionEnvelope {
            network_type,
            version: extract_version(raw.version),
            deadline,
            max_fee: raw.max_fee.map(|pair| Amount::new(pair.into())).unwrap_or_default(),
            signature,
            signer: PublicAccount::new(signer, network_type),
            metadata,
        },
    ))
}

fn malformed(reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedEnvelope(reason.into())
}
