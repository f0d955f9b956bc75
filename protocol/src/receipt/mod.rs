//! # Receipts
//!
//! Side effects the node records while executing a block: fees moved
//! between accounts, balances credited or debited by locks, artifacts that
//! expired, and currency minted by inflation.
//!
//! Every receipt type code carries its shape in the top nibble:
//!
//! ```text
//! 0x1___  balance transfer   sender → recipient
//! 0x2___  balance credit     account +
//! 0x3___  balance debit      account −
//! 0x4___  artifact expiry    mosaic / namespace id
//! 0x5___  inflation          minted mosaic
//! ```
//!
//! [`ReceiptType`] is the registry of known codes; [`ReceiptBody`] is the
//! closed set of shapes. Both the JSON read model and the binary layout
//! decode through a `match`, never a lookup table.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::{ADDRESS_LENGTH, PUBLIC_KEY_LENGTH};
use crate::model::{uint64, Address, Amount, MosaicId, PublicKey};
use crate::transaction::error::{DecodeError, EncodeError};

/// Failures while reading a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    #[error("unsupported receipt type: 0x{0:04X}")]
    UnrecognizedType(u16),

    #[error("malformed {receipt_type:?} receipt: {reason}")]
    Malformed {
        receipt_type: Option<ReceiptType>,
        reason: String,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Shape of a receipt, taken from the top nibble of its type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiptKind {
    BalanceTransfer,
    BalanceCredit,
    BalanceDebit,
    ArtifactExpiry,
    Inflation,
}

macro_rules! receipt_types {
    ($($(#[$meta:meta])* $variant:ident = $code:literal,)+) => {
        /// Known receipt type codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u16", into = "u16")]
        pub enum ReceiptType {
            $($(#[$meta])* $variant,)+
        }

        impl ReceiptType {
            pub const ALL: &'static [ReceiptType] = &[$(ReceiptType::$variant,)+];

            pub fn code(&self) -> u16 {
                match self {
                    $(ReceiptType::$variant => $code,)+
                }
            }
        }

        impl TryFrom<u16> for ReceiptType {
            type Error = ReceiptError;

            fn try_from(code: u16) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(ReceiptType::$variant),)+
                    other => Err(ReceiptError::UnrecognizedType(other)),
                }
            }
        }
    };
}

receipt_types! {
    HarvestFee = 0x2143,
    LockHashCreated = 0x3148,
    LockHashCompleted = 0x2248,
    LockHashExpired = 0x2348,
    LockSecretCreated = 0x3152,
    LockSecretCompleted = 0x2252,
    LockSecretExpired = 0x2352,
    MosaicLevy = 0x124D,
    MosaicRentalFee = 0x134D,
    NamespaceRentalFee = 0x134E,
    MosaicExpired = 0x414D,
    NamespaceExpired = 0x414E,
    Inflation = 0x5143,
}

impl From<ReceiptType> for u16 {
    fn from(value: ReceiptType) -> Self {
        value.code()
    }
}

impl ReceiptType {
    pub fn kind(&self) -> ReceiptKind {
        match self.code() >> 12 {
            0x1 => ReceiptKind::BalanceTransfer,
            0x2 => ReceiptKind::BalanceCredit,
            0x3 => ReceiptKind::BalanceDebit,
            0x4 => ReceiptKind::ArtifactExpiry,
            _ => ReceiptKind::Inflation,
        }
    }
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// Mosaics moved from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceTransferReceipt {
    pub sender: PublicKey,
    pub recipient: Address,
    pub mosaic_id: MosaicId,
    pub amount: Amount,
}

static BALANCE_TRANSFER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("sender", PUBLIC_KEY_LENGTH),
        SchemaAttribute::bytes("recipient", ADDRESS_LENGTH),
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::uint64("amount"),
    ],
};

impl BodyCodec for BalanceTransferReceipt {
    fn body_size(&self) -> usize {
        PUBLIC_KEY_LENGTH + ADDRESS_LENGTH + 16
    }

    fn schema() -> &'static Schema {
        &BALANCE_TRANSFER_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("sender", self.sender.as_bytes())
            .put_bytes("recipient", self.recipient.as_bytes())
            .put_u64("mosaicId", self.mosaic_id.value())
            .put_u64("amount", self.amount.value());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            sender: PublicKey::from_bytes(fields.array("sender")?),
            recipient: Address::from_bytes(fields.array("recipient")?),
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
            amount: Amount::new(fields.u64("amount")?),
        })
    }
}

/// One account credited or debited. The direction is the receipt type's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChangeReceipt {
    pub account: PublicKey,
    pub mosaic_id: MosaicId,
    pub amount: Amount,
}

static BALANCE_CHANGE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("account", PUBLIC_KEY_LENGTH),
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::uint64("amount"),
    ],
};

impl BodyCodec for BalanceChangeReceipt {
    fn body_size(&self) -> usize {
        PUBLIC_KEY_LENGTH + 16
    }

    fn schema() -> &'static Schema {
        &BALANCE_CHANGE_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("account", self.account.as_bytes())
            .put_u64("mosaicId", self.mosaic_id.value())
            .put_u64("amount", self.amount.value());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            account: PublicKey::from_bytes(fields.array("account")?),
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
            amount: Amount::new(fields.u64("amount")?),
        })
    }
}

/// A mosaic or namespace that reached the end of its duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactExpiryReceipt {
    #[serde(with = "uint64::pair")]
    pub artifact_id: u64,
}

static ARTIFACT_EXPIRY_SCHEMA: Schema = Schema {
    fields: &[SchemaAttribute::uint64("artifactId")],
};

impl BodyCodec for ArtifactExpiryReceipt {
    fn body_size(&self) -> usize {
        8
    }

    fn schema() -> &'static Schema {
        &ARTIFACT_EXPIRY_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields.put_u64("artifactId", self.artifact_id);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            artifact_id: fields.u64("artifactId")?,
        })
    }
}

/// Currency created by block inflation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationReceipt {
    pub mosaic_id: MosaicId,
    pub amount: Amount,
}

static INFLATION_SCHEMA: Schema = Schema {
    fields: &[SchemaAttribute::uint64("mosaicId"), SchemaAttribute::uint64("amount")],
};

impl BodyCodec for InflationReceipt {
    fn body_size(&self) -> usize {
        16
    }

    fn schema() -> &'static Schema {
        &INFLATION_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u64("mosaicId", self.mosaic_id.value())
            .put_u64("amount", self.amount.value());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
            amount: Amount::new(fields.u64("amount")?),
        })
    }
}

/// The closed set of receipt shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptBody {
    BalanceTransfer(BalanceTransferReceipt),
    BalanceChange(BalanceChangeReceipt),
    ArtifactExpiry(ArtifactExpiryReceipt),
    Inflation(InflationReceipt),
}

impl ReceiptBody {
    fn fits(&self, kind: ReceiptKind) -> bool {
        matches!(
            (self, kind),
            (Self::BalanceTransfer(_), ReceiptKind::BalanceTransfer)
                | (
                    Self::BalanceChange(_),
                    ReceiptKind::BalanceCredit | ReceiptKind::BalanceDebit
                )
                | (Self::ArtifactExpiry(_), ReceiptKind::ArtifactExpiry)
                | (Self::Inflation(_), ReceiptKind::Inflation)
        )
    }

    fn body_size(&self) -> usize {
        match self {
            Self::BalanceTransfer(body) => body.body_size(),
            Self::BalanceChange(body) => body.body_size(),
            Self::ArtifactExpiry(body) => body.body_size(),
            Self::Inflation(body) => body.body_size(),
        }
    }

    fn encode_body(&self) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::BalanceTransfer(body) => body.encode_body(),
            Self::BalanceChange(body) => body.encode_body(),
            Self::ArtifactExpiry(body) => body.encode_body(),
            Self::Inflation(body) => body.encode_body(),
        }
    }

    fn decode_body(kind: ReceiptKind, bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(match kind {
            ReceiptKind::BalanceTransfer => {
                Self::BalanceTransfer(BalanceTransferReceipt::decode_body(bytes)?)
            }
            ReceiptKind::BalanceCredit | ReceiptKind::BalanceDebit => {
                Self::BalanceChange(BalanceChangeReceipt::decode_body(bytes)?)
            }
            ReceiptKind::ArtifactExpiry => {
                Self::ArtifactExpiry(ArtifactExpiryReceipt::decode_body(bytes)?)
            }
            ReceiptKind::Inflation => Self::Inflation(InflationReceipt::decode_body(bytes)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// A typed receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub version: u16,
    pub receipt_type: ReceiptType,
    pub body: ReceiptBody,
}

/// `size u32, version u16, type u16, body`
static RECEIPT_HEADER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("size", 4),
        SchemaAttribute::scalar("version", 2),
        SchemaAttribute::scalar("type", 2),
        SchemaAttribute::array("body", 1, Length::Remaining),
    ],
};

const RECEIPT_HEADER_SIZE: usize = 8;

impl Receipt {
    /// Pairs a type with a body, rejecting bodies of the wrong shape.
    pub fn new(version: u16, receipt_type: ReceiptType, body: ReceiptBody) -> Result<Self, ReceiptError> {
        if !body.fits(receipt_type.kind()) {
            return Err(ReceiptError::Malformed {
                receipt_type: Some(receipt_type),
                reason: "body shape does not match receipt type".into(),
            });
        }
        Ok(Self {
            version,
            receipt_type,
            body,
        })
    }

    pub fn size(&self) -> usize {
        RECEIPT_HEADER_SIZE + self.body.body_size()
    }

    pub fn encode(&self) -> Result<Vec<u8>, ReceiptError> {
        let body = self.body.encode_body()?;
        let mut fields = FieldBuffer::new();
        fields
            .put_count("size", 4, RECEIPT_HEADER_SIZE + body.len())?
            .put_u16("version", self.version)
            .put_u16("type", self.receipt_type.code())
            .put_bytes("body", &body);
        Ok(RECEIPT_HEADER_SCHEMA.serialize(&fields)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReceiptError> {
        let fields = RECEIPT_HEADER_SCHEMA.parse(bytes)?;
        let declared = fields.u32("size")? as usize;
        if declared != bytes.len() {
            return Err(DecodeError::SizeMismatch {
                declared,
                actual: bytes.len(),
            }
            .into());
        }
        let receipt_type = ReceiptType::try_from(fields.u16("type")?)?;
        let body = ReceiptBody::decode_body(receipt_type.kind(), fields.bytes("body")?)?;
        Ok(Self {
            version: fields.u16("version")?,
            receipt_type,
            body,
        })
    }

    /// Decodes the node's JSON form: `{"version", "type", ...body fields}`.
    pub fn from_json(value: &Value) -> Result<Self, ReceiptError> {
        let code = value
            .get("type")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .ok_or_else(|| ReceiptError::Malformed {
                receipt_type: None,
                reason: "missing or invalid `type`".into(),
            })?;
        let receipt_type = ReceiptType::try_from(code)?;
        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|version| u16::try_from(version).ok())
            .unwrap_or(1);

        let body = match receipt_type.kind() {
            ReceiptKind::BalanceTransfer => {
                ReceiptBody::BalanceTransfer(json_body(receipt_type, value)?)
            }
            ReceiptKind::BalanceCredit | ReceiptKind::BalanceDebit => {
                ReceiptBody::BalanceChange(json_body(receipt_type, value)?)
            }
            ReceiptKind::ArtifactExpiry => ReceiptBody::ArtifactExpiry(json_body(receipt_type, value)?),
            ReceiptKind::Inflation => ReceiptBody::Inflation(json_body(receipt_type, value)?),
        };
        Ok(Self {
            version,
            receipt_type,
            body,
        })
    }
}

fn json_body<T: DeserializeOwned>(receipt_type: ReceiptType, value: &Value) -> Result<T, ReceiptError> {
    T::deserialize(value).map_err(|e| ReceiptError::Malformed {
        receipt_type: Some(receipt_type),
        reason: e.to_string(),
    })
}
