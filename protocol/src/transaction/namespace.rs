//! Namespace registration and aliases.

use serde::{Deserialize, Serialize};

use super::common::{read_utf8, wire_enum};
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::ADDRESS_LENGTH;
use crate::model::{Address, BlockDuration, MosaicId, NamespaceId};

wire_enum! {
    pub enum NamespaceType: u8, "namespace type" {
        Root = 0,
        Sub = 1,
    }
}

wire_enum! {
    /// Whether an alias is being created or removed.
    pub enum AliasAction: u8, "alias action" {
        Link = 0,
        Unlink = 1,
    }
}

/// Root namespaces are rented for a duration; sub namespaces live under a
/// parent and share its lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceRegistration {
    Root { duration: BlockDuration },
    Sub { parent_id: NamespaceId },
}

impl NamespaceRegistration {
    pub fn namespace_type(&self) -> NamespaceType {
        match self {
            Self::Root { .. } => NamespaceType::Root,
            Self::Sub { .. } => NamespaceType::Sub,
        }
    }

    /// The shared `durationOrParentId` wire field.
    fn raw(&self) -> u64 {
        match self {
            Self::Root { duration } => duration.value(),
            Self::Sub { parent_id } => parent_id.value(),
        }
    }
}

// ---------------------------------------------------------------------------
// RegisterNamespace
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::RegisterNamespace`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RegisterNamespaceJson")]
pub struct RegisterNamespaceBody {
    pub registration: NamespaceRegistration,
    pub namespace_id: NamespaceId,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterNamespaceJson {
    namespace_type: NamespaceType,
    #[serde(default)]
    duration: Option<BlockDuration>,
    #[serde(default)]
    parent_id: Option<NamespaceId>,
    namespace_id: NamespaceId,
    name: String,
}

impl TryFrom<RegisterNamespaceJson> for RegisterNamespaceBody {
    type Error = String;

    fn try_from(json: RegisterNamespaceJson) -> Result<Self, Self::Error> {
        let registration = match (json.namespace_type, json.duration, json.parent_id) {
            (NamespaceType::Root, Some(duration), _) => NamespaceRegistration::Root { duration },
            (NamespaceType::Sub, _, Some(parent_id)) => NamespaceRegistration::Sub { parent_id },
            (NamespaceType::Root, None, _) => return Err("root namespace without `duration`".into()),
            (NamespaceType::Sub, _, None) => return Err("sub namespace without `parentId`".into()),
        };
        Ok(Self {
            registration,
            namespace_id: json.namespace_id,
            name: json.name,
        })
    }
}

static REGISTER_NAMESPACE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("namespaceType", 1),
        SchemaAttribute::uint64("durationOrParentId"),
        SchemaAttribute::uint64("namespaceId"),
        SchemaAttribute::scalar("nameSize", 1),
        SchemaAttribute::array("name", 1, Length::Field("nameSize")),
    ],
};

impl BodyCodec for RegisterNamespaceBody {
    fn body_size(&self) -> usize {
        1 + 8 + 8 + 1 + self.name.len()
    }

    fn schema() -> &'static Schema {
        &REGISTER_NAMESPACE_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u8("namespaceType", self.registration.namespace_type().to_raw())
            .put_u64("durationOrParentId", self.registration.raw())
            .put_u64("namespaceId", self.namespace_id.value())
            .put_count("nameSize", 1, self.name.len())?
            .put_bytes("name", self.name.as_bytes());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        let raw = fields.u64("durationOrParentId")?;
        let registration = match NamespaceType::try_from(fields.u8("namespaceType")?)? {
            NamespaceType::Root => NamespaceRegistration::Root {
                duration: BlockDuration::new(raw),
            },
            NamespaceType::Sub => NamespaceRegistration::Sub {
                parent_id: NamespaceId::new(raw),
            },
        };
        Ok(Self {
            registration,
            namespace_id: NamespaceId::new(fields.u64("namespaceId")?),
            name: read_utf8(fields, "name")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Aliases
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::AddressAlias`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressAliasBody {
    pub alias_action: AliasAction,
    pub namespace_id: NamespaceId,
    pub address: Address,
}

static ADDRESS_ALIAS_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("aliasAction", 1),
        SchemaAttribute::uint64("namespaceId"),
        SchemaAttribute::bytes("address", ADDRESS_LENGTH),
    ],
};

impl BodyCodec for AddressAliasBody {
    fn body_size(&self) -> usize {
        1 + 8 + ADDRESS_LENGTH
    }

    fn schema() -> &'static Schema {
        &ADDRESS_ALIAS_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u8("aliasAction", self.alias_action.to_raw())
            .put_u64("namespaceId", self.namespace_id.value())
            .put_bytes("address", self.address.as_bytes());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            alias_action: AliasAction::try_from(fields.u8("aliasAction")?)?,
            namespace_id: NamespaceId::new(fields.u64("namespaceId")?),
            address: Address::from_bytes(fields.array("address")?),
        })
    }
}

/// Body of [`super::EntityType::MosaicAlias`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicAliasBody {
    pub alias_action: AliasAction,
    pub namespace_id: NamespaceId,
    pub mosaic_id: MosaicId,
}

static MOSAIC_ALIAS_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("aliasAction", 1),
        SchemaAttribute::uint64("namespaceId"),
        SchemaAttribute::uint64("mosaicId"),
    ],
};

impl BodyCodec for MosaicAliasBody {
    fn body_size(&self) -> usize {
        1 + 8 + 8
    }

    fn schema() -> &'static Schema {
        &MOSAIC_ALIAS_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u8("aliasAction", self.alias_action.to_raw())
            .put_u64("namespaceId", self.namespace_id.value())
            .put_u64("mosaicId", self.mosaic_id.value());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            alias_action: AliasAction::try_from(fields.u8("aliasAction")?)?,
            namespace_id: NamespaceId::new(fields.u64("namespaceId")?),
            mosaic_id: MosaicId::new(fields.u64("mosaicId")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_sub_registrations_share_one_wire_field() {
        let root = RegisterNamespaceBody {
            registration: NamespaceRegistration::Root {
                duration: BlockDuration::new(1000),
            },
            namespace_id: NamespaceId::new(0xABCD),
            name: "catena".into(),
        };
        let bytes = root.encode_body().unwrap();
        assert_eq!(bytes.len(), root.body_size());
        assert_eq!(bytes[0], 0);
        assert_eq!(RegisterNamespaceBody::decode_body(&bytes).unwrap(), root);

        let sub = RegisterNamespaceBody {
            registration: NamespaceRegistration::Sub {
                parent_id: NamespaceId::new(0xABCD),
            },
            namespace_id: NamespaceId::new(0xEF01),
            name: "docs".into(),
        };
        let bytes = sub.encode_body().unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(RegisterNamespaceBody::decode_body(&bytes).unwrap(), sub);
    }

    #[test]
    fn json_root_needs_a_duration() {
        let err = serde_json::from_str::<RegisterNamespaceBody>(
            r#"{"namespaceType":0,"namespaceId":[1,0],"name":"x"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duration"));

        let body: RegisterNamespaceBody = serde_json::from_str(
            r#"{"namespaceType":1,"parentId":[5,0],"namespaceId":[1,0],"name":"x"}"#,
        )
        .unwrap();
        assert_eq!(
            body.registration,
            NamespaceRegistration::Sub {
                parent_id: NamespaceId::new(5)
            }
        );
    }

    #[test]
    fn invalid_utf8_name_is_rejected() {
        let mut bytes = RegisterNamespaceBody {
            registration: NamespaceRegistration::Root {
                duration: BlockDuration::new(1),
            },
            namespace_id: NamespaceId::new(1),
            name: "ab".into(),
        }
        .encode_body()
        .unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 0xFF;
        assert!(matches!(
            RegisterNamespaceBody::decode_body(&bytes),
            Err(DecodeError::InvalidValue { field: "name", .. })
        ));
    }

    #[test]
    fn unknown_alias_action_is_rejected() {
        let body = MosaicAliasBody {
            alias_action: AliasAction::Unlink,
            namespace_id: NamespaceId::new(1),
            mosaic_id: MosaicId::new(2),
        };
        let mut bytes = body.encode_body().unwrap();
        assert_eq!(MosaicAliasBody::decode_body(&bytes).unwrap(), body);
        bytes[0] = 9;
        assert!(matches!(
            MosaicAliasBody::decode_body(&bytes),
            Err(DecodeError::InvalidValue { field: "alias action", .. })
        ));
    }
}
