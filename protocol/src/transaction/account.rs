//! Account properties (allow/block lists) and remote key links.
//!
//! The three property transactions share one body shape and differ only in
//! the value each modification row carries: an address, a mosaic id or an
//! entity type. [`AccountPropertiesBody`] is generic over that value.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::common::{read_rows, wire_enum, ModificationType};
use super::entity_type::EntityType;
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::{ADDRESS_LENGTH, PUBLIC_KEY_LENGTH};
use crate::model::{Address, MosaicId, PublicKey};

wire_enum! {
    /// Which list a property transaction edits, and whether it allows or blocks.
    pub enum PropertyType: u8, "property type" {
        AllowAddress = 0x01,
        AllowMosaic = 0x02,
        AllowTransaction = 0x04,
        Sentinel = 0x05,
        BlockAddress = 0x81,
        BlockMosaic = 0x82,
        BlockTransaction = 0x84,
    }
}

/// A value an account property list can hold.
pub trait PropertyValue: Debug + Clone + PartialEq + Eq + Serialize + DeserializeOwned {
    /// Encoded width of the value.
    const WIDTH: usize;

    /// Layout of the whole body for this value type.
    fn body_schema() -> &'static Schema;

    fn write_value(&self, row: &mut FieldBuffer);

    fn read_value(row: &FieldBuffer) -> Result<Self, DecodeError>;
}

macro_rules! property_body_schema {
    ($row:ident, $body:ident, $value:expr) => {
        static $row: Schema = Schema {
            fields: &[SchemaAttribute::scalar("type", 1), $value],
        };

        static $body: Schema = Schema {
            fields: &[
                SchemaAttribute::scalar("propertyType", 1),
                SchemaAttribute::scalar("modificationsCount", 1),
                SchemaAttribute::table_array("modifications", &$row, Length::Field("modificationsCount")),
            ],
        };
    };
}

property_body_schema!(
    ADDRESS_ROW_SCHEMA,
    ADDRESS_PROPERTY_SCHEMA,
    SchemaAttribute::bytes("value", ADDRESS_LENGTH)
);
property_body_schema!(
    MOSAIC_ROW_SCHEMA,
    MOSAIC_PROPERTY_SCHEMA,
    SchemaAttribute::uint64("value")
);
property_body_schema!(
    ENTITY_TYPE_ROW_SCHEMA,
    ENTITY_TYPE_PROPERTY_SCHEMA,
    SchemaAttribute::scalar("value", 2)
);

impl PropertyValue for Address {
    const WIDTH: usize = ADDRESS_LENGTH;

    fn body_schema() -> &'static Schema {
        &ADDRESS_PROPERTY_SCHEMA
    }

    fn write_value(&self, row: &mut FieldBuffer) {
        row.put_bytes("value", self.as_bytes());
    }

    fn read_value(row: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Address::from_bytes(row.array("value")?))
    }
}

impl PropertyValue for MosaicId {
    const WIDTH: usize = 8;

    fn body_schema() -> &'static Schema {
        &MOSAIC_PROPERTY_SCHEMA
    }

    fn write_value(&self, row: &mut FieldBuffer) {
        row.put_u64("value", self.value());
    }

    fn read_value(row: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(MosaicId::new(row.u64("value")?))
    }
}

impl PropertyValue for EntityType {
    const WIDTH: usize = 2;

    fn body_schema() -> &'static Schema {
        &ENTITY_TYPE_PROPERTY_SCHEMA
    }

    fn write_value(&self, row: &mut FieldBuffer) {
        row.put_u16("value", self.code());
    }

    fn read_value(row: &FieldBuffer) -> Result<Self, DecodeError> {
        EntityType::try_from(row.u16("value")?)
    }
}

/// One change to a property list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyModification<T> {
    #[serde(rename = "type")]
    pub modification_type: ModificationType,
    pub value: T,
}

/// Body shared by the three account property transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPropertiesBody<T> {
    pub property_type: PropertyType,
    #[serde(default = "Vec::new")]
    pub modifications: Vec<PropertyModification<T>>,
}

/// Body of [`super::EntityType::AccountPropertyAddress`].
pub type AccountPropertyAddressBody = AccountPropertiesBody<Address>;
/// Body of [`super::EntityType::AccountPropertyMosaic`].
pub type AccountPropertyMosaicBody = AccountPropertiesBody<MosaicId>;
/// Body of [`super::EntityType::AccountPropertyEntityType`].
pub type AccountPropertyEntityTypeBody = AccountPropertiesBody<EntityType>;

impl<T: PropertyValue> BodyCodec for AccountPropertiesBody<T> {
    fn body_size(&self) -> usize {
        2 + (1 + T::WIDTH) * self.modifications.len()
    }

    fn schema() -> &'static Schema {
        T::body_schema()
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let rows = self
            .modifications
            .iter()
            .map(|modification| {
                let mut row = FieldBuffer::new();
                row.put_u8("type", modification.modification_type.to_raw());
                modification.value.write_value(&mut row);
                row
            })
            .collect();
        fields
            .put_u8("propertyType", self.property_type.to_raw())
            .put_count("modificationsCount", 1, self.modifications.len())?
            .put_table_array("modifications", rows);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            property_type: PropertyType::try_from(fields.u8("propertyType")?)?,
            modifications: read_rows(fields, "modifications", |row| {
                Ok(PropertyModification {
                    modification_type: ModificationType::try_from(row.u8("type")?)?,
                    value: T::read_value(row)?,
                })
            })?,
        })
    }
}

// ---------------------------------------------------------------------------
// AccountLink
// ---------------------------------------------------------------------------

wire_enum! {
    pub enum LinkAction: u8, "link action" {
        Link = 0,
        Unlink = 1,
    }
}

/// Body of [`super::EntityType::AccountLink`]: delegates harvesting to a
/// remote key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLinkBody {
    pub remote_public_key: PublicKey,
    #[serde(alias = "action")]
    pub link_action: LinkAction,
}

static ACCOUNT_LINK_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("remotePublicKey", PUBLIC_KEY_LENGTH),
        SchemaAttribute::scalar("linkAction", 1),
    ],
};

impl BodyCodec for AccountLinkBody {
    fn body_size(&self) -> usize {
        PUBLIC_KEY_LENGTH + 1
    }

    fn schema() -> &'static Schema {
        &ACCOUNT_LINK_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("remotePublicKey", self.remote_public_key.as_bytes())
            .put_u8("linkAction", self.link_action.to_raw());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            remote_public_key: PublicKey::from_bytes(fields.array("remotePublicKey")?),
            link_action: LinkAction::try_from(fields.u8("linkAction")?)?,
        })
    }
}
