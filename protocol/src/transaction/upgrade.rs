//! Network upgrade and configuration transactions.

use serde::{Deserialize, Serialize};

use super::common::read_utf8;
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::model::{uint64, BlockDuration};

/// Body of [`super::EntityType::BlockchainUpgrade`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainUpgradeBody {
    pub upgrade_period: BlockDuration,
    #[serde(with = "uint64::pair")]
    pub new_blockchain_version: u64,
}

static BLOCKCHAIN_UPGRADE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("upgradePeriod"),
        SchemaAttribute::uint64("newBlockchainVersion"),
    ],
};

impl BodyCodec for BlockchainUpgradeBody {
    fn body_size(&self) -> usize {
        16
    }

    fn schema() -> &'static Schema {
        &BLOCKCHAIN_UPGRADE_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u64("upgradePeriod", self.upgrade_period.value())
            .put_u64("newBlockchainVersion", self.new_blockchain_version);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            upgrade_period: BlockDuration::new(fields.u64("upgradePeriod")?),
            new_blockchain_version: fields.u64("newBlockchainVersion")?,
        })
    }
}

/// Body of [`super::EntityType::NetworkConfig`]. Both documents are opaque
/// text (node configuration and the supported-entity-version table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfigBody {
    pub apply_height_delta: BlockDuration,
    pub network_config: String,
    pub supported_entity_versions: String,
}

static NETWORK_CONFIG_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("applyHeightDelta"),
        SchemaAttribute::scalar("networkConfigSize", 2),
        SchemaAttribute::scalar("supportedEntityVersionsSize", 2),
        SchemaAttribute::array("networkConfig", 1, Length::Field("networkConfigSize")),
        SchemaAttribute::array(
            "supportedEntityVersions",
            1,
            Length::Field("supportedEntityVersionsSize"),
        ),
    ],
};

impl BodyCodec for NetworkConfigBody {
    fn body_size(&self) -> usize {
        8 + 2 + 2 + self.network_config.len() + self.supported_entity_versions.len()
    }

    fn schema() -> &'static Schema {
        &NETWORK_CONFIG_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u64("applyHeightDelta", self.apply_height_delta.value())
            .put_count("networkConfigSize", 2, self.network_config.len())?
            .put_count(
                "supportedEntityVersionsSize",
                2,
                self.supported_entity_versions.len(),
            )?
            .put_bytes("networkConfig", self.network_config.as_bytes())
            .put_bytes(
                "supportedEntityVersions",
                self.supported_entity_versions.as_bytes(),
            );
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            apply_height_delta: BlockDuration::new(fields.u64("applyHeightDelta")?),
            network_config: read_utf8(fields, "networkConfig")?,
            supported_entity_versions: read_utf8(fields, "supportedEntityVersions")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_documents_round_trip() {
        let body = NetworkConfigBody {
            apply_height_delta: BlockDuration::new(360),
            network_config: "[network]\nidentifier = mijin-test\n".into(),
            supported_entity_versions: "{}".into(),
        };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), body.body_size());
        assert_eq!(NetworkConfigBody::decode_body(&bytes).unwrap(), body);
    }

    #[test]
    fn oversized_document_is_an_encode_error() {
        let body = NetworkConfigBody {
            apply_height_delta: BlockDuration::new(1),
            network_config: "x".repeat(70_000),
            supported_entity_versions: String::new(),
        };
        assert!(matches!(
            body.encode_body(),
            Err(EncodeError::LengthOverflow {
                field: "networkConfigSize",
                ..
            })
        ));
    }
}
