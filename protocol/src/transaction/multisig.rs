//! Multisig account modification.

use serde::{Deserialize, Serialize};

use super::common::{
    key_modification_fields, read_key_modification, read_rows, KeyModification,
    KEY_MODIFICATION_SCHEMA, KEY_MODIFICATION_SIZE,
};
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};

/// Body of [`super::EntityType::ModifyMultisigAccount`].
///
/// Deltas are relative changes to the approval and removal thresholds and
/// may be negative; they travel as two's-complement bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyMultisigAccountBody {
    pub min_removal_delta: i8,
    pub min_approval_delta: i8,
    #[serde(default)]
    pub modifications: Vec<KeyModification>,
}

static MODIFY_MULTISIG_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("minRemovalDelta", 1),
        SchemaAttribute::scalar("minApprovalDelta", 1),
        SchemaAttribute::scalar("numModifications", 1),
        SchemaAttribute::table_array(
            "modifications",
            &KEY_MODIFICATION_SCHEMA,
            Length::Field("numModifications"),
        ),
    ],
};

impl BodyCodec for ModifyMultisigAccountBody {
    fn body_size(&self) -> usize {
        3 + KEY_MODIFICATION_SIZE * self.modifications.len()
    }

    fn schema() -> &'static Schema {
        &MODIFY_MULTISIG_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u8("minRemovalDelta", self.min_removal_delta as u8)
            .put_u8("minApprovalDelta", self.min_approval_delta as u8)
            .put_count("numModifications", 1, self.modifications.len())?
            .put_table_array(
                "modifications",
                self.modifications.iter().map(key_modification_fields).collect(),
            );
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            min_removal_delta: fields.u8("minRemovalDelta")? as i8,
            min_approval_delta: fields.u8("minApprovalDelta")? as i8,
            modifications: read_rows(fields, "modifications", read_key_modification)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PublicKey;

    #[test]
    fn negative_deltas_survive_the_wire() {
        let body = ModifyMultisigAccountBody {
            min_removal_delta: -1,
            min_approval_delta: 2,
            modifications: vec![
                KeyModification::add(PublicKey::from_bytes([1; 32])),
                KeyModification::remove(PublicKey::from_bytes([2; 32])),
            ],
        };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), body.body_size());
        assert_eq!(&bytes[..3], &[0xFF, 2, 2]);
        assert_eq!(ModifyMultisigAccountBody::decode_body(&bytes).unwrap(), body);
    }

    #[test]
    fn reads_node_json() {
        let json = format!(
            r#"{{"minRemovalDelta":1,"minApprovalDelta":-1,"modifications":[{{"type":0,"cosignatoryPublicKey":"{}"}}]}}"#,
            "AA".repeat(32)
        );
        let body: ModifyMultisigAccountBody = serde_json::from_str(&json).unwrap();
        assert_eq!(body.min_approval_delta, -1);
        assert_eq!(body.modifications.len(), 1);
    }
}
