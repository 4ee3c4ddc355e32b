//! Schema-driven binary encoding of [`Datum`] trees.
//!
//! The wire format is Avro's binary encoding:
//! - integers are zigzag varints;
//! - bytes and strings are a length followed by the raw bytes;
//! - fixed-size bytes are the raw bytes only;
//! - records are their fields in declaration order;
//! - arrays are blocks of `count, items...` terminated by a zero count;
//! - a nullable field is a union index (`0` = null, `1` = value) followed by
//!   the value.

use arrow_schema::{DataType, Field, Fields};

use crate::error::CodecError;

/// A schema-less value tree, validated against a schema on encode and
/// produced from one on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datum {
    /// Absent value of a nullable field.
    Null,
    /// `Int32`.
    Int(i32),
    /// `Int64`.
    Long(i64),
    /// `Binary` or `FixedSizeBinary`.
    Bytes(Vec<u8>),
    /// `Utf8`.
    String(String),
    /// `Struct` field values in declaration order.
    Record(Vec<Datum>),
    /// `List` items.
    Array(Vec<Datum>),
}

impl Datum {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
        }
    }
}

impl CodecError {
    /// Prefix the path of a schema violation with an enclosing field name
    /// or array index.
    pub(crate) fn within(self, segment: &str) -> Self {
        match self {
            Self::SchemaViolation { path, reason } => {
                let path = if path.is_empty() || path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                Self::SchemaViolation { path, reason }
            }
            other => other,
        }
    }
}

/// Encode a record's field values against its declared fields.
pub(crate) fn encode_record(
    out: &mut Vec<u8>,
    fields: &Fields,
    datum: &Datum,
) -> Result<(), CodecError> {
    let Datum::Record(values) = datum else {
        return Err(CodecError::violation(
            "",
            format!("expected record, found {}", datum.kind()),
        ));
    };
    if values.len() != fields.len() {
        return Err(CodecError::violation(
            "",
            format!("expected {} fields, found {}", fields.len(), values.len()),
        ));
    }
    for (field, value) in fields.iter().zip(values) {
        encode_field(out, field, value).map_err(|e| e.within(field.name()))?;
    }
    Ok(())
}

fn encode_field(out: &mut Vec<u8>, field: &Field, value: &Datum) -> Result<(), CodecError> {
    if field.is_nullable() {
        if *value == Datum::Null {
            write_long(out, 0);
            return Ok(());
        }
        write_long(out, 1);
    } else if *value == Datum::Null {
        return Err(CodecError::violation("", "null for non-nullable field"));
    }
    encode_value(out, field.data_type(), value)
}

fn encode_value(out: &mut Vec<u8>, data_type: &DataType, value: &Datum) -> Result<(), CodecError> {
    match (data_type, value) {
        (DataType::Int32, Datum::Int(v)) => write_long(out, i64::from(*v)),
        (DataType::Int64, Datum::Long(v)) => write_long(out, *v),
        (DataType::Binary, Datum::Bytes(b)) => write_bytes(out, b),
        (DataType::Utf8, Datum::String(s)) => write_bytes(out, s.as_bytes()),
        (DataType::FixedSizeBinary(width), Datum::Bytes(b)) => {
            if usize::try_from(*width).ok() != Some(b.len()) {
                return Err(CodecError::violation(
                    "",
                    format!("fixed field requires {width} bytes, got {}", b.len()),
                ));
            }
            out.extend_from_slice(b);
        }
        (DataType::Struct(fields), Datum::Record(_)) => encode_record(out, fields, value)?,
        (DataType::List(item), Datum::Array(items)) => {
            if !items.is_empty() {
                write_long(out, len_to_long(items.len()));
                for (i, element) in items.iter().enumerate() {
                    encode_field(out, item, element).map_err(|e| e.within(&format!("[{i}]")))?;
                }
            }
            write_long(out, 0);
        }
        (expected, found) => {
            return Err(CodecError::violation(
                "",
                format!("expected {expected}, found {}", found.kind()),
            ));
        }
    }
    Ok(())
}

fn len_to_long(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "zigzag varint bit manipulation"
)]
fn write_long(out: &mut Vec<u8>, value: i64) {
    let mut n = ((value << 1) ^ (value >> 63)) as u64;
    while n >= 0x80 {
        out.push((n as u8) | 0x80);
        n >>= 7;
    }
    out.push(n as u8);
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_long(out, len_to_long(bytes.len()));
    out.extend_from_slice(bytes);
}

/// Cursor over an encoded record.
pub(crate) struct Decoder<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) const fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    const fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    /// Fail unless the whole input was consumed.
    pub(crate) fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(CodecError::TrailingBytes { remaining }),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> CodecError {
        CodecError::Malformed {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn decode_record(&mut self, fields: &Fields) -> Result<Datum, CodecError> {
        fields
            .iter()
            .map(|field| self.decode_field(field))
            .collect::<Result<Vec<_>, _>>()
            .map(Datum::Record)
    }

    fn decode_field(&mut self, field: &Field) -> Result<Datum, CodecError> {
        if field.is_nullable() {
            match self.read_long()? {
                0 => return Ok(Datum::Null),
                1 => {}
                index => {
                    return Err(self.malformed(format!(
                        "union index {index} out of range for `{}`",
                        field.name()
                    )));
                }
            }
        }
        self.decode_value(field.data_type())
    }

    fn decode_value(&mut self, data_type: &DataType) -> Result<Datum, CodecError> {
        Ok(match data_type {
            DataType::Int32 => {
                let value = self.read_long()?;
                Datum::Int(
                    i32::try_from(value)
                        .map_err(|_| self.malformed(format!("{value} overflows int")))?,
                )
            }
            DataType::Int64 => Datum::Long(self.read_long()?),
            DataType::Binary => Datum::Bytes(self.read_bytes()?.to_vec()),
            DataType::Utf8 => {
                let bytes = self.read_bytes()?;
                Datum::String(
                    String::from_utf8(bytes.to_vec())
                        .map_err(|e| self.malformed(format!("invalid utf-8: {e}")))?,
                )
            }
            DataType::FixedSizeBinary(width) => {
                let width = usize::try_from(*width)
                    .map_err(|_| self.malformed(format!("negative fixed width {width}")))?;
                Datum::Bytes(self.take(width)?.to_vec())
            }
            DataType::Struct(fields) => self.decode_record(fields)?,
            DataType::List(item) => Datum::Array(self.decode_array(item)?),
            other => return Err(self.malformed(format!("unsupported schema type {other}"))),
        })
    }

    fn decode_array(&mut self, item: &Field) -> Result<Vec<Datum>, CodecError> {
        let mut items = Vec::new();
        loop {
            let mut count = self.read_long()?;
            if count == 0 {
                return Ok(items);
            }
            if count < 0 {
                // Negative counts are followed by the block's byte size.
                count = count
                    .checked_neg()
                    .ok_or_else(|| self.malformed("array block count overflow"))?;
                self.read_long()?;
            }
            let count = usize::try_from(count)
                .map_err(|_| self.malformed("array block count overflow"))?;
            // Every item encodes to at least one byte.
            if count > self.remaining() {
                return Err(self.malformed(format!(
                    "array block of {count} items exceeds remaining input"
                )));
            }
            items.reserve(count);
            for _ in 0..count {
                items.push(self.decode_field(item)?);
            }
        }
    }

    fn read_byte(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .input
            .get(self.offset)
            .ok_or(CodecError::UnexpectedEof {
                offset: self.offset,
            })?;
        self.offset += 1;
        Ok(byte)
    }

    #[allow(
        clippy::cast_possible_wrap,
        reason = "zigzag varint bit manipulation"
    )]
    fn read_long(&mut self) -> Result<i64, CodecError> {
        let mut n = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            if shift == 63 && byte > 1 {
                return Err(self.malformed("varint overflows 64 bits"));
            }
            n |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(((n >> 1) as i64) ^ -((n & 1) as i64))
    }

    fn read_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_long()?;
        let len = usize::try_from(len).map_err(|_| self.malformed(format!("negative length {len}")))?;
        self.take(len)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let eof = CodecError::UnexpectedEof {
            offset: self.offset,
        };
        let end = self.offset.checked_add(len).ok_or_else(|| eof.clone())?;
        let slice = self.input.get(self.offset..end).ok_or(eof)?;
        self.offset = end;
        Ok(slice)
    }
}
