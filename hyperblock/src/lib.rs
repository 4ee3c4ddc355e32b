//! Hyperblock mapping and binary encoding.
//!
//! Turns the JSON hyperblocks served by a blockchain proxy into canonical,
//! fixed-shape records and encodes those records into a compact binary
//! format for analytics consumers.
//!
//! The pipeline has three pure, synchronous stages:
//!
//! 1. [`api`]: deserialize the proxy response into raw types.
//! 2. [`mapper`]: normalize hex hashes, decimal amounts and nested
//!    structures into [`model`] records.
//! 3. [`codec`]: encode records against the statically declared schema and
//!    decode them back.
//!
//! ```no_run
//! # fn run(body: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let raw = hyperblock::api::HyperBlockData::from_response_body(body)?;
//! let block = hyperblock::mapper::map_hyperblock(&raw)?;
//! let payload = hyperblock::codec::encode_hyperblock(&block)?;
//! assert_eq!(hyperblock::codec::decode_hyperblock(&payload)?, block);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod codec;
pub mod error;
pub mod mapper;
pub mod model;

pub use error::{CodecError, MapError};
