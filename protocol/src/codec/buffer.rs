//! The intermediate, field-tagged buffer.
//!
//! Population routines append named fields here without worrying about the
//! final layout; the schema pass then walks its descriptor list and pulls
//! the fields out in wire order. Parsing runs the other way: the schema
//! fills a `FieldBuffer` from raw bytes and the variant reads it back by
//! name.
//!
//! Scalars are stored as their little-endian bytes at their declared width.
//! 64-bit values are stored as two little-endian 32-bit halves, low half
//! first, the same two words the JSON wire carries as `[lo, hi]`.

use crate::model::Uint64Pair;
use crate::transaction::error::{DecodeError, EncodeError};

/// One stored field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A scalar or a byte array, already in wire byte order.
    Bytes(Vec<u8>),
    /// A single nested record.
    Table(FieldBuffer),
    /// A repeated nested record.
    TableArray(Vec<FieldBuffer>),
}

impl FieldValue {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Table(_) => "a table",
            Self::TableArray(_) => "a table array",
        }
    }
}

/// Named fields in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldBuffer {
    fields: Vec<(&'static str, FieldValue)>,
}

impl FieldBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stores `value`, replacing any earlier field of the same name.
    pub fn put(&mut self, name: &'static str, value: FieldValue) -> &mut Self {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    // -----------------------------------------------------------------------
    // Writers
    // -----------------------------------------------------------------------

    pub fn put_u8(&mut self, name: &'static str, value: u8) -> &mut Self {
        self.put(name, FieldValue::Bytes(vec![value]))
    }

    pub fn put_u16(&mut self, name: &'static str, value: u16) -> &mut Self {
        self.put(name, FieldValue::Bytes(value.to_le_bytes().to_vec()))
    }

    pub fn put_u32(&mut self, name: &'static str, value: u32) -> &mut Self {
        self.put(name, FieldValue::Bytes(value.to_le_bytes().to_vec()))
    }

    /// Stores a 64-bit value as its two 32-bit halves.
    pub fn put_u64(&mut self, name: &'static str, value: u64) -> &mut Self {
        let pair = Uint64Pair::from(value);
        let mut bytes = Vec::with_capacity(8);
        bytes.extend_from_slice(&pair.lo().to_le_bytes());
        bytes.extend_from_slice(&pair.hi().to_le_bytes());
        self.put(name, FieldValue::Bytes(bytes))
    }

    pub fn put_bytes(&mut self, name: &'static str, bytes: &[u8]) -> &mut Self {
        self.put(name, FieldValue::Bytes(bytes.to_vec()))
    }

    pub fn put_table(&mut self, name: &'static str, table: FieldBuffer) -> &mut Self {
        self.put(name, FieldValue::Table(table))
    }

    pub fn put_table_array(&mut self, name: &'static str, rows: Vec<FieldBuffer>) -> &mut Self {
        self.put(name, FieldValue::TableArray(rows))
    }

    /// Stores a count into a scalar of `width` bytes, failing if it does not fit.
    pub fn put_count(
        &mut self,
        name: &'static str,
        width: usize,
        count: usize,
    ) -> Result<&mut Self, EncodeError> {
        let max = match width {
            1 => u8::MAX as usize,
            2 => u16::MAX as usize,
            _ => u32::MAX as usize,
        };
        if count > max {
            return Err(EncodeError::LengthOverflow {
                field: name,
                len: count,
                max,
            });
        }
        let bytes = (count as u32).to_le_bytes()[..width.min(4)].to_vec();
        Ok(self.put(name, FieldValue::Bytes(bytes)))
    }

    // -----------------------------------------------------------------------
    // Readers
    // -----------------------------------------------------------------------

    pub fn bytes(&self, name: &'static str) -> Result<&[u8], DecodeError> {
        match self.get(name) {
            Some(FieldValue::Bytes(bytes)) => Ok(bytes),
            _ => Err(DecodeError::MissingField(name)),
        }
    }

    /// Reads a fixed-width field into an array.
    pub fn array<const N: usize>(&self, name: &'static str) -> Result<[u8; N], DecodeError> {
        let bytes = self.bytes(name)?;
        bytes.try_into().map_err(|_| DecodeError::Truncated {
            field: name,
            needed: N,
            available: bytes.len(),
        })
    }

    pub fn u8(&self, name: &'static str) -> Result<u8, DecodeError> {
        Ok(self.array::<1>(name)?[0])
    }

    pub fn u16(&self, name: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array(name)?))
    }

    pub fn u32(&self, name: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array(name)?))
    }

    /// Reads a 64-bit value stored as two 32-bit halves.
    pub fn u64(&self, name: &'static str) -> Result<u64, DecodeError> {
        let raw: [u8; 8] = self.array(name)?;
        let lo = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let hi = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        Ok(Uint64Pair([lo, hi]).into())
    }

    pub fn table(&self, name: &'static str) -> Result<&FieldBuffer, DecodeError> {
        match self.get(name) {
            Some(FieldValue::Table(table)) => Ok(table),
            _ => Err(DecodeError::MissingField(name)),
        }
    }

    pub fn table_array(&self, name: &'static str) -> Result<&[FieldBuffer], DecodeError> {
        match self.get(name) {
            Some(FieldValue::TableArray(rows)) => Ok(rows),
            _ => Err(DecodeError::MissingField(name)),
        }
    }

    /// Interprets a byte field of up to 8 bytes as a little-endian unsigned
    /// integer. Used by the schema to resolve counted lengths.
    pub(crate) fn uint(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(FieldValue::Bytes(bytes)) if bytes.len() <= 8 => Some(
                bytes
                    .iter()
                    .rev()
                    .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)),
            ),
            _ => None,
        }
    }
}
