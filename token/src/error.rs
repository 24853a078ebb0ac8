//! Error types for token stream operations.

use thiserror::Error;

/// Result type for token stream operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Errors that can occur while encoding or decoding Opal tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// An atom declared more payload bytes than the buffer holds.
    #[error("truncated atom at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        /// Offset of the atom header.
        offset: usize,
        /// Bytes the atom header claims (header included).
        needed: usize,
        /// Bytes left in the buffer from the atom header on.
        available: usize,
    },

    /// A byte that is neither a valid atom header nor a defined marker.
    #[error("reserved token byte 0x{byte:02X} at offset {offset}")]
    ReservedByte {
        /// Offset of the offending byte.
        offset: usize,
        /// The byte itself.
        byte: u8,
    },

    /// An integer atom carries more than eight bytes of magnitude.
    #[error("integer atom of {len} bytes at offset {offset} does not fit in 64 bits")]
    IntegerTooWide {
        /// Offset of the atom header.
        offset: usize,
        /// Payload length of the atom.
        len: usize,
    },

    /// A byte string is too long for any atom form.
    #[error("byte string of {len} bytes exceeds the long atom limit")]
    AtomTooLong {
        /// Length of the rejected byte string.
        len: usize,
    },

    /// A structural marker appeared where a value was required.
    #[error("unexpected {marker} at offset {offset}")]
    UnexpectedMarker {
        /// Offset of the marker byte.
        offset: usize,
        /// Marker name.
        marker: &'static str,
    },

    /// A value atom appeared where a marker or a different atom kind was required.
    #[error("unexpected atom at offset {offset} while expecting {expected}")]
    UnexpectedAtom {
        /// Offset of the atom header.
        offset: usize,
        /// What the reader was looking for.
        expected: &'static str,
    },

    /// The stream ended where another token was required.
    #[error("token stream ended at offset {offset} while expecting {expected}")]
    UnexpectedEnd {
        /// Offset at which the stream ended.
        offset: usize,
        /// What the reader was looking for.
        expected: &'static str,
    },

    /// Lists and names nest deeper than the reader allows.
    #[error("nesting deeper than {max_depth} levels at offset {offset}")]
    NestingTooDeep {
        /// Offset of the list or name that crossed the limit.
        offset: usize,
        /// Configured maximum depth.
        max_depth: usize,
    },
}

impl TokenError {
    /// Returns the buffer offset the error refers to, if any.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::Truncated { offset, .. }
            | Self::ReservedByte { offset, .. }
            | Self::IntegerTooWide { offset, .. }
            | Self::UnexpectedMarker { offset, .. }
            | Self::UnexpectedAtom { offset, .. }
            | Self::UnexpectedEnd { offset, .. }
            | Self::NestingTooDeep { offset, .. } => Some(*offset),
            Self::AtomTooLong { .. } => None,
        }
    }
}
