//! # Binary Codec
//!
//! Two-pass canonical encoding shared by every transaction variant:
//!
//! 1. A population routine writes named fields into a [`FieldBuffer`]
//!    (scalars, fixed byte arrays, nested tables, table arrays).
//! 2. A declarative [`Schema`] walks its ordered descriptors and packs the
//!    buffer into the little-endian wire layout.
//!
//! Parsing reverses both passes with the same schema, which is what makes
//! `decode(encode(tx)) == tx` hold for every variant without per-variant
//! packing code.

pub mod buffer;
pub mod schema;

pub use buffer::{FieldBuffer, FieldValue};
pub use schema::{AttributeKind, Length, Schema, SchemaAttribute};

use crate::transaction::error::{DecodeError, EncodeError};

/// A transaction body that can be written to and read from the wire.
///
/// Implementors supply the exact body length, their schema, and the two
/// field-population routines. Packing is left to the schema.
pub trait BodyCodec: Sized {
    /// Exact byte length of the encoded body.
    fn body_size(&self) -> usize;

    /// Wire layout of the body.
    fn schema() -> &'static Schema;

    /// Populates `fields` with every field the schema lists.
    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError>;

    /// Rebuilds the body from parsed fields.
    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError>;

    /// Populates and packs the body.
    fn encode_body(&self) -> Result<Vec<u8>, EncodeError> {
        let mut fields = FieldBuffer::new();
        self.write_fields(&mut fields)?;
        Self::schema().serialize(&fields)
    }

    /// Parses and reads the body.
    fn decode_body(bytes: &[u8]) -> Result<Self, DecodeError> {
        let fields = Self::schema().parse(bytes)?;
        Self::read_fields(&fields)
    }
}
