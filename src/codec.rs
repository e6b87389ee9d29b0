//! Record codec
//!
//! Every on-disk record goes through one bincode configuration: fixed-width
//! little-endian integers, trailing bytes allowed. With fixed-width fields a
//! record type always encodes to the same number of bytes, which is what the
//! allocator's size classes rely on.

use bincode::config::{AllowTrailing, FixintEncoding, WithOtherIntEncoding, WithOtherTrailing};
use bincode::{DefaultOptions, Options};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

type Codec = WithOtherIntEncoding<WithOtherTrailing<DefaultOptions, AllowTrailing>, FixintEncoding>;

fn codec() -> Codec {
    DefaultOptions::new()
        .allow_trailing_bytes()
        .with_fixint_encoding()
}

/// Encode a record to bytes
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(codec().serialize(value)?)
}

/// Decode a record from the front of `bytes`
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(codec().deserialize(bytes)?)
}

/// Number of bytes `value` encodes to
pub(crate) fn encoded_size<T: Serialize>(value: &T) -> Result<usize> {
    Ok(codec().serialized_size(value)? as usize)
}
