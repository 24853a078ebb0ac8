//! Error types for framing and discovery.

use std::fmt;

use thiserror::Error;

/// Result type for wire decoding operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Which of the three nested length fields a framing error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    ComPacket,
    Packet,
    SubPacket,
}

impl fmt::Display for LengthField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ComPacket => "ComPacket",
            Self::Packet => "Packet",
            Self::SubPacket => "SubPacket",
        };
        f.write_str(name)
    }
}

/// Structural errors found while decoding a response buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Buffer is too small to contain the fixed headers.
    #[error("buffer too small: {actual} bytes, need at least {required}")]
    PacketTooSmall { actual: usize, required: usize },

    /// A declared length does not fit the region that encloses it.
    #[error("{field} length {declared} does not match enclosing bound {bound}")]
    FrameLengthMismatch {
        field: LengthField,
        declared: usize,
        bound: usize,
    },

    /// The TPer returned an empty ComPacket: the response is not ready yet.
    #[error("empty ComPacket (outstanding data {outstanding_data})")]
    NoPayload { outstanding_data: u32 },

    /// Level-0 discovery data ends before its declared length, or a
    /// descriptor runs past it.
    #[error("discovery data truncated: need {needed} bytes, have {available}")]
    DiscoveryTruncated { needed: usize, available: usize },

    /// No SSC feature descriptor carrying a ComID was reported.
    #[error("no SSC feature with a base ComID in discovery data")]
    ComIdNotFound,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("length overflow: {length}")]
    LengthOverflow { length: usize },
}
