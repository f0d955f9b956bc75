//! Error types for the transaction codec.
//!
//! Decoding and encoding fail independently: a bad message only fails its own
//! decode, a bad field only fails its own transaction's encode. Nothing in
//! the codec retries or substitutes defaults.

use thiserror::Error;

use super::entity_type::EntityType;

/// Failures while turning JSON or binary wire data into a [`super::Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The entity-type code has no registered decoder.
    #[error("unsupported transaction type: 0x{0:04X}")]
    UnrecognizedType(u16),

    /// A common envelope field is missing or unparsable.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A variant-specific field is missing or unparsable.
    #[error("malformed {entity_type} body: {reason}")]
    MalformedBody {
        entity_type: EntityType,
        reason: String,
    },

    /// A binary field holds a value outside its domain (unknown enum tag,
    /// invalid UTF-8).
    #[error("invalid value in `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// An inner transaction of an aggregate failed to decode, or was itself
    /// an aggregate. The whole aggregate is rejected.
    #[error("aggregate inner transaction #{index} rejected: {reason}")]
    AggregateIntegrity { index: usize, reason: String },

    /// The binary payload ended before a field could be read.
    #[error("truncated payload: `{field}` needs {needed} bytes, {available} left")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// A field the variant needs was absent from the parsed field buffer.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A count or size field holds a value its dependent field cannot use.
    #[error("field `{field}` holds unusable count {count}")]
    InvalidCount { field: &'static str, count: u64 },

    /// The body was longer than its schema describes.
    #[error("{0} trailing bytes after body")]
    TrailingBytes(usize),

    /// The leading size field disagrees with the payload length.
    #[error("size field declares {declared} bytes but payload holds {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    /// The input was not JSON of the expected shape.
    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Failures while producing the canonical binary payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The population routine did not provide a field the schema lists.
    #[error("field `{0}` missing from field buffer")]
    MissingField(&'static str),

    /// A field's byte length disagrees with its schema descriptor.
    #[error("field `{field}` holds {actual} bytes, schema expects {expected}")]
    FieldWidth {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A field was stored as the wrong kind (bytes vs. table vs. table array).
    #[error("field `{field}` is {actual}, schema expects {expected}")]
    FieldKind {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// A count field holds a value its dependent field cannot use.
    #[error("field `{field}` holds unusable count {count}")]
    InvalidCount { field: &'static str, count: u64 },

    /// A variable-length field is longer than its size field can express.
    #[error("`{field}` length {len} exceeds the limit {max} of its size field")]
    LengthOverflow {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// The entity version does not fit the packed 32-bit version field.
    #[error("entity version {0} does not fit the wire version field")]
    VersionOutOfRange(u64),
}
