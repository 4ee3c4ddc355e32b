//! Error types for the mapping and codec stages.

use thiserror::Error;

/// Errors raised while translating a proxy hyperblock into canonical records.
///
/// Every variant names the offending field so a failed block can be traced
/// back to the exact source value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A hex-encoded hash could not be decoded or had the wrong length.
    #[error("invalid hash in `{field}`: {reason}")]
    InvalidHash {
        /// Source field name.
        field: &'static str,
        /// What was wrong with the value.
        reason: String,
    },

    /// A decimal big-integer string could not be parsed.
    #[error("invalid {field}: {value:?} is not a non-negative decimal integer")]
    InvalidAmount {
        /// Source field name (e.g. `"balance"`, `"total supply"`).
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Any other malformed field (base64 payloads, integer overflow).
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Source field name.
        field: &'static str,
        /// What was wrong with the value.
        reason: String,
    },
}

/// Errors raised by the binary schema codec.
///
/// Encode-side failures are always [`CodecError::SchemaViolation`]; the
/// remaining variants describe malformed input on the decode side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A value does not conform to the declared schema (wrong type, wrong
    /// fixed length, null for a non-nullable field, missing fields).
    #[error("schema violation at `{path}`: {reason}")]
    SchemaViolation {
        /// Dotted field path from the record root.
        path: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// Input bytes are not a valid encoding.
    #[error("malformed input at offset {offset}: {reason}")]
    Malformed {
        /// Byte offset where decoding failed.
        offset: usize,
        /// What was wrong with the input.
        reason: String,
    },

    /// Input ended before the record was complete.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where more input was expected.
        offset: usize,
    },

    /// Input continued after a complete record.
    #[error("{remaining} trailing bytes after record")]
    TrailingBytes {
        /// Number of unread bytes.
        remaining: usize,
    },
}

impl CodecError {
    pub(crate) fn violation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for encode-side schema violations.
    #[must_use]
    pub const fn is_schema_violation(&self) -> bool {
        matches!(self, Self::SchemaViolation { .. })
    }
}
