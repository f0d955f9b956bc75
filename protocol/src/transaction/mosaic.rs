//! Mosaic definition, supply and levy transactions.

use serde::{Deserialize, Serialize};

use super::common::wire_enum;
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::ADDRESS_LENGTH;
use crate::model::{Address, Amount, BlockDuration, MosaicId};

/// Mosaic flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MosaicFlags(pub u8);

impl MosaicFlags {
    pub const SUPPLY_MUTABLE: u8 = 0x01;
    pub const TRANSFERABLE: u8 = 0x02;

    pub fn new(supply_mutable: bool, transferable: bool) -> Self {
        let mut bits = 0;
        if supply_mutable {
            bits |= Self::SUPPLY_MUTABLE;
        }
        if transferable {
            bits |= Self::TRANSFERABLE;
        }
        Self(bits)
    }

    pub fn supply_mutable(&self) -> bool {
        self.0 & Self::SUPPLY_MUTABLE != 0
    }

    pub fn transferable(&self) -> bool {
        self.0 & Self::TRANSFERABLE != 0
    }
}

/// Required and optional mosaic properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicProperties {
    pub flags: MosaicFlags,
    pub divisibility: u8,
    /// `None` for mosaics that never expire.
    pub duration: Option<BlockDuration>,
}

const PROPERTY_FLAGS: u8 = 0;
const PROPERTY_DIVISIBILITY: u8 = 1;
const PROPERTY_DURATION: u8 = 2;

// ---------------------------------------------------------------------------
// MosaicDefinition
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::MosaicDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "MosaicDefinitionJson")]
pub struct MosaicDefinitionBody {
    pub nonce: u32,
    pub mosaic_id: MosaicId,
    pub properties: MosaicProperties,
}

/// Nodes report properties as `{id, value}` pairs, each value a `[lo, hi]`.
#[derive(Deserialize)]
struct PropertyJson {
    id: u8,
    value: Amount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MosaicDefinitionJson {
    #[serde(alias = "nonce")]
    mosaic_nonce: u32,
    mosaic_id: MosaicId,
    properties: Vec<PropertyJson>,
}

impl TryFrom<MosaicDefinitionJson> for MosaicDefinitionBody {
    type Error = String;

    fn try_from(json: MosaicDefinitionJson) -> Result<Self, Self::Error> {
        let mut properties = MosaicProperties {
            flags: MosaicFlags::default(),
            divisibility: 0,
            duration: None,
        };
        for property in json.properties {
            let (id, value) = (property.id, property.value.value());
            let narrow = || {
                u8::try_from(value).map_err(|_| format!("property {id} value {value} exceeds a byte"))
            };
            match id {
                PROPERTY_FLAGS => properties.flags = MosaicFlags(narrow()?),
                PROPERTY_DIVISIBILITY => properties.divisibility = narrow()?,
                PROPERTY_DURATION => properties.duration = Some(BlockDuration::new(value)),
                other => return Err(format!("unknown mosaic property id {other}")),
            }
        }
        Ok(Self {
            nonce: json.mosaic_nonce,
            mosaic_id: json.mosaic_id,
            properties,
        })
    }
}

static OPTIONAL_PROPERTY_SCHEMA: Schema = Schema {
    fields: &[SchemaAttribute::scalar("id", 1), SchemaAttribute::uint64("value")],
};

static MOSAIC_DEFINITION_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("nonce", 4),
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::scalar("numOptionalProperties", 1),
        SchemaAttribute::scalar("flags", 1),
        SchemaAttribute::scalar("divisibility", 1),
        SchemaAttribute::table_array(
            "optionalProperties",
            &OPTIONAL_PROPERTY_SCHEMA,
            Length::Field("numOptionalProperties"),
        ),
    ],
};

impl BodyCodec for MosaicDefinitionBody {
    fn body_size(&self) -> usize {
        4 + 8 + 1 + 1 + 1 + 9 * usize::from(self.properties.duration.is_some())
    }

    fn schema() -> &'static Schema {
        &MOSAIC_DEFINITION_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let optional: Vec<FieldBuffer> = self
            .properties
            .duration
            .iter()
            .map(|duration| {
                let mut row = FieldBuffer::new();
                row.put_u8("id", PROPERTY_DURATION)
                    .put_u64("value", duration.value());
                row
            })
            .collect();

        fields
            .put_u32("nonce", self.nonce)
            .put_u64("mosaicId", self.mosaic_id.value())
            .put_count("numOptionalProperties", 1, optional.len())?
            .put_u8("flags", self.properties.flags.0)
            .put_u8("divisibility", self.properties.divisibility)
            .put_table_array("optionalProperties", optional);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        let mut duration = None;
        for row in fields.table_array("optionalProperties")? {
            match row.u8("id")? {
                PROPERTY_DURATION => duration = Some(BlockDuration::new(row.u64("value")?)),
                other => {
                    return Err(DecodeError::InvalidValue {
                        field: "optionalProperties",
                        reason: format!("unknown optional property id {other}"),
                    })
                }
            }
        }
        Ok(Self {
            nonce: fields.u32("nonce")?,
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
            properties: MosaicProperties {
                flags: MosaicFlags(fields.u8("flags")?),
                divisibility: fields.u8("divisibility")?,
                duration,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// MosaicSupplyChange
// ---------------------------------------------------------------------------

wire_enum! {
    pub enum SupplyDirection: u8, "supply direction" {
        Decrease = 0,
        Increase = 1,
    }
}

/// Body of [`super::EntityType::MosaicSupplyChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicSupplyChangeBody {
    pub mosaic_id: MosaicId,
    pub direction: SupplyDirection,
    pub delta: Amount,
}

static MOSAIC_SUPPLY_CHANGE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::scalar("direction", 1),
        SchemaAttribute::uint64("delta"),
    ],
};

impl BodyCodec for MosaicSupplyChangeBody {
    fn body_size(&self) -> usize {
        8 + 1 + 8
    }

    fn schema() -> &'static Schema {
        &MOSAIC_SUPPLY_CHANGE_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u64("mosaicId", self.mosaic_id.value())
            .put_u8("direction", self.direction.to_raw())
            .put_u64("delta", self.delta.value());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
            direction: SupplyDirection::try_from(fields.u8("direction")?)?,
            delta: Amount::new(fields.u64("delta")?),
        })
    }
}

// ---------------------------------------------------------------------------
// Levies
// ---------------------------------------------------------------------------

wire_enum! {
    /// How a levy fee is computed.
    pub enum LevyType: u8, "levy type" {
        None = 0,
        Absolute = 1,
        Percentile = 2,
    }
}

/// Fee charged on every transfer of a mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicLevy {
    #[serde(rename = "type")]
    pub levy_type: LevyType,
    pub recipient: Address,
    pub mosaic_id: MosaicId,
    pub fee: Amount,
}

/// Body of [`super::EntityType::ModifyMosaicLevy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyMosaicLevyBody {
    pub mosaic_id: MosaicId,
    pub levy: MosaicLevy,
}

static LEVY_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("type", 1),
        SchemaAttribute::bytes("recipient", ADDRESS_LENGTH),
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::uint64("fee"),
    ],
};

static MODIFY_MOSAIC_LEVY_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::table("levy", &LEVY_SCHEMA),
    ],
};

impl BodyCodec for ModifyMosaicLevyBody {
    fn body_size(&self) -> usize {
        8 + 1 + ADDRESS_LENGTH + 8 + 8
    }

    fn schema() -> &'static Schema {
        &MODIFY_MOSAIC_LEVY_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let mut levy = FieldBuffer::new();
        levy.put_u8("type", self.levy.levy_type.to_raw())
            .put_bytes("recipient", self.levy.recipient.as_bytes())
            .put_u64("mosaicId", self.levy.mosaic_id.value())
            .put_u64("fee", self.levy.fee.value());
        fields
            .put_u64("mosaicId", self.mosaic_id.value())
            .put_table("levy", levy);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        let levy = fields.table("levy")?;
        Ok(Self {
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
            levy: MosaicLevy {
                levy_type: LevyType::try_from(levy.u8("type")?)?,
                recipient: Address::from_bytes(levy.array("recipient")?),
                mosaic_id: MosaicId::new(levy.u64("mosaicId")?),
                fee: Amount::new(levy.u64("fee")?),
            },
        })
    }
}

/// Body of [`super::EntityType::RemoveMosaicLevy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMosaicLevyBody {
    pub mosaic_id: MosaicId,
}

static REMOVE_MOSAIC_LEVY_SCHEMA: Schema = Schema {
    fields: &[SchemaAttribute::uint64("mosaicId")],
};

impl BodyCodec for RemoveMosaicLevyBody {
    fn body_size(&self) -> usize {
        8
    }

    fn schema() -> &'static Schema {
        &REMOVE_MOSAIC_LEVY_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields.put_u64("mosaicId", self.mosaic_id.value());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_json_reads_property_pairs() {
        let body: MosaicDefinitionBody = serde_json::from_str(
            r#"{
                "mosaicNonce": 7,
                "mosaicId": [1, 2],
                "properties": [
                    {"id": 0, "value": [3, 0]},
                    {"id": 1, "value": [6, 0]},
                    {"id": 2, "value": [1000, 0]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(body.nonce, 7);
        assert!(body.properties.flags.supply_mutable());
        assert!(body.properties.flags.transferable());
        assert_eq!(body.properties.divisibility, 6);
        assert_eq!(body.properties.duration, Some(BlockDuration::new(1000)));
    }

    #[test]
    fn duration_is_the_only_optional_property() {
        let mut body = MosaicDefinitionBody {
            nonce: 1,
            mosaic_id: MosaicId::new(99),
            properties: MosaicProperties {
                flags: MosaicFlags::new(true, false),
                divisibility: 3,
                duration: None,
            },
        };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), 15);
        assert_eq!(MosaicDefinitionBody::decode_body(&bytes).unwrap(), body);

        body.properties.duration = Some(BlockDuration::new(42));
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), body.body_size());
        assert_eq!(bytes[12], 1);
        assert_eq!(MosaicDefinitionBody::decode_body(&bytes).unwrap(), body);
    }

    #[test]
    fn unknown_json_property_is_rejected() {
        let err = serde_json::from_str::<MosaicDefinitionBody>(
            r#"{"mosaicNonce":1,"mosaicId":[1,0],"properties":[{"id":9,"value":[0,0]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown mosaic property"));
    }

    #[test]
    fn levy_is_a_nested_table() {
        let body = ModifyMosaicLevyBody {
            mosaic_id: MosaicId::new(5),
            levy: MosaicLevy {
                levy_type: LevyType::Percentile,
                recipient: Address::from_bytes([0xA8; 25]),
                mosaic_id: MosaicId::new(6),
                fee: Amount::new(150),
            },
        };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), body.body_size());
        assert_eq!(bytes[8], 2);
        assert_eq!(ModifyMosaicLevyBody::decode_body(&bytes).unwrap(), body);
    }

    #[test]
    fn supply_change_json() {
        let body: MosaicSupplyChangeBody =
            serde_json::from_str(r#"{"mosaicId":[1,0],"direction":1,"delta":[500,0]}"#).unwrap();
        assert_eq!(body.direction, SupplyDirection::Increase);
        assert_eq!(body.delta, Amount::new(500));
    }
}
