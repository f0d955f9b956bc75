//! Key/value metadata attached to accounts, mosaics and namespaces.
//!
//! A metadata transaction does not carry the new value itself but the byte
//! difference against the stored one, together with how much the value grows
//! or shrinks (`value_size_delta`). The three variants differ only in the
//! target id that follows the scoped key.

use serde::{Deserialize, Serialize};

use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::PUBLIC_KEY_LENGTH;
use crate::model::{hex_bytes, uint64, MosaicId, NamespaceId, PublicKey};

/// Body of [`super::EntityType::AccountMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadataBody {
    pub target_key: PublicKey,
    #[serde(with = "uint64::pair")]
    pub scoped_metadata_key: u64,
    pub value_size_delta: i16,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// Body of [`super::EntityType::MosaicMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicMetadataBody {
    pub target_key: PublicKey,
    #[serde(with = "uint64::pair")]
    pub scoped_metadata_key: u64,
    #[serde(alias = "targetId")]
    pub target_mosaic_id: MosaicId,
    pub value_size_delta: i16,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// Body of [`super::EntityType::NamespaceMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceMetadataBody {
    pub target_key: PublicKey,
    #[serde(with = "uint64::pair")]
    pub scoped_metadata_key: u64,
    #[serde(alias = "targetId")]
    pub target_namespace_id: NamespaceId,
    pub value_size_delta: i16,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

static ACCOUNT_METADATA_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("targetKey", PUBLIC_KEY_LENGTH),
        SchemaAttribute::uint64("scopedMetadataKey"),
        SchemaAttribute::scalar("valueSizeDelta", 2),
        SchemaAttribute::scalar("valueSize", 2),
        SchemaAttribute::array("value", 1, Length::Field("valueSize")),
    ],
};

static TARGETED_METADATA_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("targetKey", PUBLIC_KEY_LENGTH),
        SchemaAttribute::uint64("scopedMetadataKey"),
        SchemaAttribute::uint64("targetId"),
        SchemaAttribute::scalar("valueSizeDelta", 2),
        SchemaAttribute::scalar("valueSize", 2),
        SchemaAttribute::array("value", 1, Length::Field("valueSize")),
    ],
};

const ACCOUNT_METADATA_FIXED: usize = PUBLIC_KEY_LENGTH + 8 + 2 + 2;

fn write_value(fields: &mut FieldBuffer, delta: i16, value: &[u8]) -> Result<(), EncodeError> {
    fields
        .put_u16("valueSizeDelta", delta as u16)
        .put_count("valueSize", 2, value.len())?
        .put_bytes("value", value);
    Ok(())
}

impl BodyCodec for AccountMetadataBody {
    fn body_size(&self) -> usize {
        ACCOUNT_METADATA_FIXED + self.value.len()
    }

    fn schema() -> &'static Schema {
        &ACCOUNT_METADATA_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("targetKey", self.target_key.as_bytes())
            .put_u64("scopedMetadataKey", self.scoped_metadata_key);
        write_value(fields, self.value_size_delta, &self.value)
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            target_key: PublicKey::from_bytes(fields.array("targetKey")?),
            scoped_metadata_key: fields.u64("scopedMetadataKey")?,
            value_size_delta: fields.u16("valueSizeDelta")? as i16,
            value: fields.bytes("value")?.to_vec(),
        })
    }
}

impl BodyCodec for MosaicMetadataBody {
    fn body_size(&self) -> usize {
        ACCOUNT_METADATA_FIXED + 8 + self.value.len()
    }

    fn schema() -> &'static Schema {
        &TARGETED_METADATA_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("targetKey", self.target_key.as_bytes())
            .put_u64("scopedMetadataKey", self.scoped_metadata_key)
            .put_u64("targetId", self.target_mosaic_id.value());
        write_value(fields, self.value_size_delta, &self.value)
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            target_key: PublicKey::from_bytes(fields.array("targetKey")?),
            scoped_metadata_key: fields.u64("scopedMetadataKey")?,
            target_mosaic_id: MosaicId::new(fields.u64("targetId")?),
            value_size_delta: fields.u16("valueSizeDelta")? as i16,
            value: fields.bytes("value")?.to_vec(),
        })
    }
}

impl BodyCodec for NamespaceMetadataBody {
    fn body_size(&self) -> usize {
        ACCOUNT_METADATA_FIXED + 8 + self.value.len()
    }

    fn schema() -> &'static Schema {
        &TARGETED_METADATA_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("targetKey", self.target_key.as_bytes())
            .put_u64("scopedMetadataKey", self.scoped_metadata_key)
            .put_u64("targetId", self.target_namespace_id.value());
        write_value(fields, self.value_size_delta, &self.value)
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            target_key: PublicKey::from_bytes(fields.array("targetKey")?),
            scoped_metadata_key: fields.u64("scopedMetadataKey")?,
            target_namespace_id: NamespaceId::new(fields.u64("targetId")?),
            value_size_delta: fields.u16("valueSizeDelta")? as i16,
            value: fields.bytes("value")?.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinking_value_keeps_a_negative_delta() {
        let body = AccountMetadataBody {
            target_key: PublicKey::from_bytes([9; 32]),
            scoped_metadata_key: 0xFFFF_FFFF_0000_0001,
            value_size_delta: -3,
            value: b"abc".to_vec(),
        };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), body.body_size());
        assert_eq!(&bytes[40..42], &[0xFD, 0xFF]);
        assert_eq!(AccountMetadataBody::decode_body(&bytes).unwrap(), body);
    }

    #[test]
    fn targeted_variants_share_a_layout() {
        let mosaic = MosaicMetadataBody {
            target_key: PublicKey::from_bytes([1; 32]),
            scoped_metadata_key: 7,
            target_mosaic_id: MosaicId::new(42),
            value_size_delta: 2,
            value: vec![1, 2],
        };
        let namespace = NamespaceMetadataBody {
            target_key: PublicKey::from_bytes([1; 32]),
            scoped_metadata_key: 7,
            target_namespace_id: NamespaceId::new(42),
            value_size_delta: 2,
            value: vec![1, 2],
        };
        let bytes = mosaic.encode_body().unwrap();
        assert_eq!(bytes, namespace.encode_body().unwrap());
        assert_eq!(MosaicMetadataBody::decode_body(&bytes).unwrap(), mosaic);
        assert_eq!(NamespaceMetadataBody::decode_body(&bytes).unwrap(), namespace);
    }

    #[test]
    fn reads_node_json() {
        let json = format!(
            r#"{{"targetKey":"{}","scopedMetadataKey":[1,0],"targetId":[2,0],"valueSizeDelta":5,"value":"68656C6C6F"}}"#,
            "CC".repeat(32)
        );
        let body: MosaicMetadataBody = serde_json::from_str(&json).unwrap();
        assert_eq!(body.value, b"hello");
        assert_eq!(body.target_mosaic_id, MosaicId::new(2));
    }
}
