//! Building blocks shared by several variant bodies: one-byte wire enums,
//! mosaic rows, cosignatory-style modification rows and a few field readers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::DecodeError;
use crate::codec::{FieldBuffer, Schema, SchemaAttribute};
use crate::config::PUBLIC_KEY_LENGTH;
use crate::model::{Amount, Mosaic, MosaicId, PublicKey};

/// A tag byte outside the set its field accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} tag {value}")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: u64,
}

impl From<UnknownTag> for DecodeError {
    fn from(err: UnknownTag) -> Self {
        DecodeError::InvalidValue {
            field: err.kind,
            reason: err.to_string(),
        }
    }
}

/// Declares a closed enum carried as one integer on both wires.
///
/// JSON accepts the bare number; an unknown value fails deserialization
/// instead of falling back to a default.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            pub fn to_raw(self) -> $repr {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl TryFrom<$repr> for $name {
            type Error = $crate::transaction::common::UnknownTag;

            fn try_from(value: $repr) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err($crate::transaction::common::UnknownTag {
                        kind: $kind,
                        value: u64::from(other),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&self.to_raw(), serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <$repr as serde::Deserialize>::deserialize(deserializer)?;
                Self::try_from(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Whether a modification row adds or removes its entry.
    pub enum ModificationType: u8, "modification type" {
        Add = 0,
        Remove = 1,
    }
}

// ---------------------------------------------------------------------------
// Mosaic rows
// ---------------------------------------------------------------------------

/// `{id u64, amount u64}`
pub static MOSAIC_SCHEMA: Schema = Schema {
    fields: &[SchemaAttribute::uint64("id"), SchemaAttribute::uint64("amount")],
};

pub const MOSAIC_SIZE: usize = 16;

pub fn mosaic_fields(mosaic: &Mosaic) -> FieldBuffer {
    let mut row = FieldBuffer::new();
    row.put_u64("id", mosaic.id.value())
        .put_u64("amount", mosaic.amount.value());
    row
}

pub fn read_mosaic(row: &FieldBuffer) -> Result<Mosaic, DecodeError> {
    Ok(Mosaic::new(
        MosaicId::new(row.u64("id")?),
        Amount::new(row.u64("amount")?),
    ))
}

// ---------------------------------------------------------------------------
// Key modifications
// ---------------------------------------------------------------------------

/// Adds or removes one public key from a participant set (multisig
/// cosignatories, contract customers/executors/verifiers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyModification {
    #[serde(rename = "type")]
    pub modification_type: ModificationType,
    #[serde(alias = "cosignatoryPublicKey")]
    pub public_key: PublicKey,
}

impl KeyModification {
    pub fn add(public_key: PublicKey) -> Self {
        Self {
            modification_type: ModificationType::Add,
            public_key,
        }
    }

    pub fn remove(public_key: PublicKey) -> Self {
        Self {
            modification_type: ModificationType::Remove,
            public_key,
        }
    }
}

/// `{type u8, key Key}`
pub static KEY_MODIFICATION_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("type", 1),
        SchemaAttribute::bytes("key", PUBLIC_KEY_LENGTH),
    ],
};

pub const KEY_MODIFICATION_SIZE: usize = 1 + PUBLIC_KEY_LENGTH;

pub fn key_modification_fields(modification: &KeyModification) -> FieldBuffer {
    let mut row = FieldBuffer::new();
    row.put_u8("type", modification.modification_type.to_raw())
        .put_bytes("key", modification.public_key.as_bytes());
    row
}

pub fn read_key_modification(row: &FieldBuffer) -> Result<KeyModification, DecodeError> {
    Ok(KeyModification {
        modification_type: ModificationType::try_from(row.u8("type")?)?,
        public_key: PublicKey::from_bytes(row.array("key")?),
    })
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Reads a byte field as UTF-8 text.
pub fn read_utf8(fields: &FieldBuffer, name: &'static str) -> Result<String, DecodeError> {
    String::from_utf8(fields.bytes(name)?.to_vec()).map_err(|e| DecodeError::InvalidValue {
        field: name,
        reason: e.to_string(),
    })
}

/// Maps each row of a table array through `read`.
pub fn read_rows<T>(
    fields: &FieldBuffer,
    name: &'static str,
    read: impl Fn(&FieldBuffer) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    fields.table_array(name)?.iter().map(read).collect()
}
