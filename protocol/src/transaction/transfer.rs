//! Transfer transactions: mosaics and an optional message to one recipient.

use serde::{Deserialize, Serialize};

use super::common::{mosaic_fields, read_mosaic, read_rows, wire_enum, MOSAIC_SCHEMA, MOSAIC_SIZE};
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::ADDRESS_LENGTH;
use crate::model::{hex_bytes, Address, Mosaic};

wire_enum! {
    /// How a message payload is to be read.
    pub enum MessageType: u8, "message type" {
        Plain = 0,
        Secure = 1,
        PersistentHarvestingDelegation = 0xFE,
    }
}

/// A message attached to a transfer. Secure payloads are opaque ciphertext
/// here; encryption is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(with = "hex_bytes", default)]
    pub payload: Vec<u8>,
}

impl Message {
    pub fn plain(text: &str) -> Self {
        Self {
            message_type: MessageType::Plain,
            payload: text.as_bytes().to_vec(),
        }
    }

    pub fn empty() -> Self {
        Self {
            message_type: MessageType::Plain,
            payload: Vec::new(),
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::empty()
    }
}

/// Body of [`super::EntityType::Transfer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferBody {
    pub recipient: Address,
    #[serde(default)]
    pub mosaics: Vec<Mosaic>,
    #[serde(default)]
    pub message: Message,
}

static MESSAGE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("type", 1),
        SchemaAttribute::array("payload", 1, Length::FieldMinus("messageSize", 1)),
    ],
};

static TRANSFER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("recipient", ADDRESS_LENGTH),
        SchemaAttribute::scalar("messageSize", 2),
        SchemaAttribute::scalar("numMosaics", 1),
        SchemaAttribute::table("message", &MESSAGE_SCHEMA),
        SchemaAttribute::table_array("mosaics", &MOSAIC_SCHEMA, Length::Field("numMosaics")),
    ],
};

impl BodyCodec for TransferBody {
    fn body_size(&self) -> usize {
        ADDRESS_LENGTH + 2 + 1 + 1 + self.message.payload.len() + MOSAIC_SIZE * self.mosaics.len()
    }

    fn schema() -> &'static Schema {
        &TRANSFER_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let mut message = FieldBuffer::new();
        message
            .put_u8("type", self.message.message_type.to_raw())
            .put_bytes("payload", &self.message.payload);

        fields
            .put_bytes("recipient", self.recipient.as_bytes())
            .put_count("messageSize", 2, self.message.payload.len() + 1)?
            .put_count("numMosaics", 1, self.mosaics.len())?
            .put_table("message", message)
            .put_table_array("mosaics", self.mosaics.iter().map(mosaic_fields).collect());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        let message = fields.table("message")?;
        Ok(Self {
            recipient: Address::from_bytes(fields.array("recipient")?),
            mosaics: read_rows(fields, "mosaics", read_mosaic)?,
            message: Message {
                message_type: MessageType::try_from(message.u8("type")?)?,
                payload: message.bytes("payload")?.to_vec(),
            },
        })
    }
}
