//! Binary schema codec for canonical records.
//!
//! Every [`Record`] declares its fields in [`schema`]; [`encode`] validates
//! the record against those fields while writing, and [`decode`] reads the
//! same layout back. Fixed-length fields must carry exactly their declared
//! width, so a missing hash or address fails here rather than producing a
//! short payload.

mod record;
pub mod schema;
mod wire;

pub use record::Record;
pub use wire::Datum;

use crate::error::CodecError;
use crate::model::HyperBlock;

/// Encode a record against its declared schema.
///
/// # Errors
///
/// Returns [`CodecError::SchemaViolation`] with the dotted path of the first
/// field that does not conform.
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    wire::encode_record(&mut out, R::fields(), &record.to_datum())
        .map_err(|e| e.within(R::NAME))?;
    Ok(out)
}

/// Decode a record previously produced by [`encode`].
///
/// # Errors
///
/// Returns [`CodecError`] if the input is truncated, malformed or followed
/// by trailing bytes.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, CodecError> {
    let mut decoder = wire::Decoder::new(bytes);
    let datum = decoder.decode_record(R::fields())?;
    decoder.finish()?;
    R::from_datum(datum)
}

/// Encode a [`HyperBlock`].
///
/// # Errors
///
/// See [`encode`].
pub fn encode_hyperblock(block: &HyperBlock) -> Result<Vec<u8>, CodecError> {
    encode(block)
}

/// Decode a [`HyperBlock`].
///
/// # Errors
///
/// See [`decode`].
pub fn decode_hyperblock(bytes: &[u8]) -> Result<HyperBlock, CodecError> {
    decode(bytes)
}
