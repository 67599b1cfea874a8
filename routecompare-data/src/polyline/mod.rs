//! Decoders for the compressed geometries routing services return.
//!
//! Google and OSRM use the classic encoded polyline format with five decimal
//! places; HERE uses its flexible polyline format, which carries its own
//! precision header. Both decoders return `geo::Coord` values with
//! `x = longitude` and `y = latitude`.

mod flexible;
mod google;

use thiserror::Error;

pub use flexible::decode_flexible;
pub use google::decode_polyline;

/// Errors raised while decoding an encoded geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    /// A character outside the format's alphabet.
    #[error("invalid character {character:?} at position {position}")]
    InvalidCharacter {
        /// Offending character.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },
    /// The input ended in the middle of a value or coordinate.
    #[error("encoded geometry ended unexpectedly")]
    Truncated,
    /// A value needed more bits than a coordinate can hold.
    #[error("encoded value overflows 64 bits")]
    Overflow,
    /// The flexible polyline header names a version this decoder cannot read.
    #[error("unsupported flexible polyline version {version}")]
    UnsupportedVersion {
        /// Version found in the header.
        version: u64,
    },
}

/// Undo zig-zag encoding of a signed delta.
const fn unzigzag(value: u64) -> i64 {
    let magnitude = (value >> 1) as i64;
    if value & 1 == 1 { !magnitude } else { magnitude }
}

/// Accumulates 5-bit chunks into unsigned values.
#[derive(Debug, Default)]
struct VarintReader {
    value: u64,
    shift: u32,
}

impl VarintReader {
    /// Feed one decoded chunk; returns the finished value when the chunk
    /// carries no continuation bit.
    fn push(&mut self, chunk: u64) -> Result<Option<u64>, PolylineError> {
        if self.shift > 60 {
            return Err(PolylineError::Overflow);
        }
        self.value |= (chunk & 0x1f) << self.shift;
        if chunk & 0x20 == 0 {
            let finished = self.value;
            *self = Self::default();
            Ok(Some(finished))
        } else {
            self.shift += 5;
            Ok(None)
        }
    }

    const fn is_idle(&self) -> bool {
        self.shift == 0 && self.value == 0
    }
}
