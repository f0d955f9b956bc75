//! Declarative wire layouts.
//!
//! A [`Schema`] is an ordered list of [`SchemaAttribute`]s. Each attribute
//! names a field of the [`FieldBuffer`] and says how wide it is and how its
//! length is determined. The schema holds no variant logic: serializing a
//! new transaction type needs a new schema and a population routine, never
//! new packing code.
//!
//! ```text
//! Scalar     fixed width integer, little-endian
//! Array      `length` elements of `width` bytes (keys, hashes, u64 halves, blobs)
//! Table      one nested record with its own schema
//! TableArray `length` nested records
//! ```
//!
//! Lengths are fixed, read from an earlier count field (optionally minus a
//! constant), or run to the end of the body. Count lookups walk outwards
//! through enclosing tables, so a nested record may size itself from a field
//! of its parent.

use super::buffer::{FieldBuffer, FieldValue};
use crate::config::UINT64_HALF_WIDTH;
use crate::transaction::error::{DecodeError, EncodeError};

/// How many elements an array or table array holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Always this many elements.
    Fixed(usize),
    /// As many elements as the named count field says.
    Field(&'static str),
    /// The named count field minus a constant.
    FieldMinus(&'static str, usize),
    /// Everything up to the end of the body.
    Remaining,
}

/// Shape of one field.
#[derive(Debug, Clone, Copy)]
pub enum AttributeKind {
    Scalar { width: usize },
    Array { width: usize, length: Length },
    Table(&'static Schema),
    TableArray { schema: &'static Schema, length: Length },
}

/// One named field descriptor.
#[derive(Debug, Clone, Copy)]
pub struct SchemaAttribute {
    pub name: &'static str,
    pub kind: AttributeKind,
}

impl SchemaAttribute {
    pub const fn scalar(name: &'static str, width: usize) -> Self {
        Self {
            name,
            kind: AttributeKind::Scalar { width },
        }
    }

    /// A 64-bit value: two 32-bit halves.
    pub const fn uint64(name: &'static str) -> Self {
        Self::array(name, UINT64_HALF_WIDTH, Length::Fixed(2))
    }

    /// A fixed-length byte string (key, hash, address, signature).
    pub const fn bytes(name: &'static str, len: usize) -> Self {
        Self::array(name, 1, Length::Fixed(len))
    }

    pub const fn array(name: &'static str, width: usize, length: Length) -> Self {
        Self {
            name,
            kind: AttributeKind::Array { width, length },
        }
    }

    pub const fn table(name: &'static str, schema: &'static Schema) -> Self {
        Self {
            name,
            kind: AttributeKind::Table(schema),
        }
    }

    pub const fn table_array(name: &'static str, schema: &'static Schema, length: Length) -> Self {
        Self {
            name,
            kind: AttributeKind::TableArray { schema, length },
        }
    }
}

/// Ordered field descriptors for one record layout.
#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [SchemaAttribute],
}

/// Chain of tables being walked, innermost first.
#[derive(Clone, Copy)]
struct Scope<'a> {
    fields: &'a FieldBuffer,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<u64> {
        self.fields
            .uint(name)
            .or_else(|| self.parent.and_then(|parent| parent.lookup(name)))
    }

    /// Element count for `length`; `Ok(None)` for [`Length::Remaining`].
    /// Errors carry the offending count field name and its value, if any.
    fn count(&self, length: Length) -> Result<Option<usize>, (&'static str, Option<u64>)> {
        match length {
            Length::Fixed(n) => Ok(Some(n)),
            Length::Field(name) => self
                .lookup(name)
                .map(|n| Some(n as usize))
                .ok_or((name, None)),
            Length::FieldMinus(name, k) => {
                let n = self.lookup(name).ok_or((name, None))?;
                n.checked_sub(k as u64)
                    .map(|n| Some(n as usize))
                    .ok_or((name, Some(n)))
            }
            Length::Remaining => Ok(None),
        }
    }
}

impl Schema {
    /// Byte length of a record, if it does not depend on any count.
    pub fn fixed_size(&self) -> Option<usize> {
        self.fields.iter().try_fold(0usize, |acc, attr| {
            let size = match attr.kind {
                AttributeKind::Scalar { width } => width,
                AttributeKind::Array {
                    width,
                    length: Length::Fixed(n),
                } => width * n,
                AttributeKind::Table(schema) => schema.fixed_size()?,
                AttributeKind::TableArray {
                    schema,
                    length: Length::Fixed(n),
                } => schema.fixed_size()? * n,
                _ => return None,
            };
            Some(acc + size)
        })
    }

    // -----------------------------------------------------------------------
    // Serialize
    // -----------------------------------------------------------------------

    /// Repacks `fields` into the tightly packed wire layout.
    pub fn serialize(&self, fields: &FieldBuffer) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.write_table(fields, None, &mut out)?;
        Ok(out)
    }

    fn write_table(
        &self,
        fields: &FieldBuffer,
        parent: Option<&Scope<'_>>,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let scope = Scope { fields, parent };
        for attr in self.fields {
            let value = fields
                .get(attr.name)
                .ok_or(EncodeError::MissingField(attr.name))?;
            match (attr.kind, value) {
                (AttributeKind::Scalar { width }, FieldValue::Bytes(bytes)) => {
                    check_width(attr.name, width, bytes.len())?;
                    out.extend_from_slice(bytes);
                }
                (AttributeKind::Array { width, length }, FieldValue::Bytes(bytes)) => {
                    match scope.count(length).map_err(encode_count_error)? {
                        Some(count) => check_width(attr.name, count * width, bytes.len())?,
                        None if bytes.len() % width != 0 => {
                            return Err(EncodeError::FieldWidth {
                                field: attr.name,
                                expected: bytes.len() - bytes.len() % width,
                                actual: bytes.len(),
                            })
                        }
                        None => {}
                    }
                    out.extend_from_slice(bytes);
                }
                (AttributeKind::Table(schema), FieldValue::Table(table)) => {
                    schema.write_table(table, Some(&scope), out)?;
                }
                (AttributeKind::TableArray { schema, length }, FieldValue::TableArray(rows)) => {
                    if let Some(count) = scope.count(length).map_err(encode_count_error)? {
                        check_width(attr.name, count, rows.len())?;
                    }
                    for row in rows {
                        schema.write_table(row, Some(&scope), out)?;
                    }
                }
                (kind, value) => {
                    return Err(EncodeError::FieldKind {
                        field: attr.name,
                        expected: kind_name(kind),
                        actual: value.kind_name(),
                    })
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    /// Reads `bytes` back into a field buffer. Every byte must be consumed.
    pub fn parse(&self, bytes: &[u8]) -> Result<FieldBuffer, DecodeError> {
        let mut cursor = 0;
        let fields = self.read_table(bytes, &mut cursor, None)?;
        if cursor != bytes.len() {
            return Err(DecodeError::TrailingBytes(bytes.len() - cursor));
        }
        Ok(fields)
    }

    fn read_table(
        &self,
        bytes: &[u8],
        cursor: &mut usize,
        parent: Option<&Scope<'_>>,
    ) -> Result<FieldBuffer, DecodeError> {
        let mut fields = FieldBuffer::new();
        for attr in self.fields {
            let value = {
                let scope = Scope {
                    fields: &fields,
                    parent,
                };
                match attr.kind {
                    AttributeKind::Scalar { width } => {
                        FieldValue::Bytes(take(bytes, cursor, width, attr.name)?.to_vec())
                    }
                    AttributeKind::Array { width, length } => {
                        let len = match scope.count(length).map_err(decode_count_error)? {
                            Some(count) => count * width,
                            None => {
                                let rest = bytes.len() - *cursor;
                                rest - rest % width
                            }
                        };
                        FieldValue::Bytes(take(bytes, cursor, len, attr.name)?.to_vec())
                    }
                    AttributeKind::Table(schema) => {
                        FieldValue::Table(schema.read_table(bytes, cursor, Some(&scope))?)
                    }
                    AttributeKind::TableArray { schema, length } => {
                        let mut rows = Vec::new();
                        match scope.count(length).map_err(decode_count_error)? {
                            Some(count) => {
                                for _ in 0..count {
                                    rows.push(schema.read_table(bytes, cursor, Some(&scope))?);
                                }
                            }
                            None => {
                                while *cursor < bytes.len() {
                                    rows.push(schema.read_table(bytes, cursor, Some(&scope))?);
                                }
                            }
                        }
                        FieldValue::TableArray(rows)
                    }
                }
            };
            fields.put(attr.name, value);
        }
        Ok(fields)
    }
}

fn take<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    field: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let available = bytes.len() - *cursor;
    if len > available {
        return Err(DecodeError::Truncated {
            field,
            needed: len,
            available,
        });
    }
    let slice = &bytes[*cursor..*cursor + len];
    *cursor += len;
    Ok(slice)
}

fn check_width(field: &'static str, expected: usize, actual: usize) -> Result<(), EncodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(EncodeError::FieldWidth {
            field,
            expected,
            actual,
        })
    }
}

fn encode_count_error((field, value): (&'static str, Option<u64>)) -> EncodeError {
    match value {
        Some(count) => EncodeError::InvalidCount { field, count },
        None => EncodeError::MissingField(field),
    }
}

fn decode_count_error((field, value): (&'static str, Option<u64>)) -> DecodeError {
    match value {
        Some(count) => DecodeError::InvalidCount { field, count },
        None => DecodeError::MissingField(field),
    }
}

fn kind_name(kind: AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Scalar { .. } | AttributeKind::Array { .. } => "bytes",
        AttributeKind::Table(_) => "a table",
        AttributeKind::TableArray { .. } => "a table array",
    }
}
