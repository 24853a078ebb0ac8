//! Atom header classification and structural markers.

use std::fmt;

use crate::error::{TokenError, TokenResult};

/// Largest integer carried by a tiny atom.
pub const TINY_MAX: u64 = 0x3F;

/// Longest byte string carried by a short atom.
pub const SHORT_MAX_LEN: usize = 0x0F;

/// Longest byte string carried by a medium atom.
pub const MEDIUM_MAX_LEN: usize = 0x07FF;

/// Longest byte string carried by a long atom.
pub const LONG_MAX_LEN: usize = 0x00FF_FFFF;

pub(crate) const SHORT_TAG: u8 = 0b1000_0000;
pub(crate) const MEDIUM_TAG: u8 = 0b1100_0000;
pub(crate) const LONG_TAG: u8 = 0b1110_0000;

/// Structural tokens. Each is a single reserved byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Marker {
    StartList = 0xF0,
    EndList = 0xF1,
    StartName = 0xF2,
    EndName = 0xF3,
    Call = 0xF8,
    EndOfData = 0xF9,
    EndOfSession = 0xFA,
    StartTransaction = 0xFB,
    EndTransaction = 0xFC,
    Empty = 0xFF,
}

impl Marker {
    /// Parses a marker from a raw byte. Reserved values yield `None`.
    #[must_use]
    pub const fn parse(byte: u8) -> Option<Self> {
        match byte {
            0xF0 => Some(Self::StartList),
            0xF1 => Some(Self::EndList),
            0xF2 => Some(Self::StartName),
            0xF3 => Some(Self::EndName),
            0xF8 => Some(Self::Call),
            0xF9 => Some(Self::EndOfData),
            0xFA => Some(Self::EndOfSession),
            0xFB => Some(Self::StartTransaction),
            0xFC => Some(Self::EndTransaction),
            0xFF => Some(Self::Empty),
            _ => None,
        }
    }

    /// Returns the wire byte.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Returns a stable display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartList => "StartList",
            Self::EndList => "EndList",
            Self::StartName => "StartName",
            Self::EndName => "EndName",
            Self::Call => "Call",
            Self::EndOfData => "EndOfData",
            Self::EndOfSession => "EndOfSession",
            Self::StartTransaction => "StartTransaction",
            Self::EndTransaction => "EndTransaction",
            Self::Empty => "Empty",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the fixed byte for a structural token.
#[must_use]
pub const fn encode_marker(marker: Marker) -> u8 {
    marker.byte()
}

/// Atom size class, selected by the high bits of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AtomKind {
    /// `0b0S_VVVVVV`: six-bit integer stored in the header byte.
    Tiny,
    /// `0b10BS_LLLL`: up to 15 payload bytes.
    Short,
    /// `0b110B_SLLL LLLLLLLL`: up to 2047 payload bytes.
    Medium,
    /// `0b1110_00BS` + 24-bit length.
    Long,
}

/// Decoded atom header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomHeader {
    pub kind: AtomKind,
    /// Payload is a byte string rather than an integer.
    pub bytes: bool,
    /// Sign flag. Opal integers are unsigned; the flag is reported, not applied.
    pub signed: bool,
    /// Header length in bytes.
    pub header_len: usize,
    /// Payload length in bytes (zero for tiny atoms).
    pub len: usize,
}

impl AtomHeader {
    /// Classifies the atom starting at `offset`.
    ///
    /// Returns `Ok(None)` when the byte is a marker (`0xF0..=0xFF`), leaving
    /// marker validation to the caller. Length fields are read but not checked
    /// against the rest of the buffer.
    pub fn parse(buf: &[u8], offset: usize) -> TokenResult<Option<Self>> {
        let Some(&first) = buf.get(offset) else {
            return Err(TokenError::UnexpectedEnd {
                offset,
                expected: "atom",
            });
        };

        if first & 0x80 == 0 {
            return Ok(Some(Self {
                kind: AtomKind::Tiny,
                bytes: false,
                signed: first & 0x40 != 0,
                header_len: 1,
                len: 0,
            }));
        }
        if first & 0x40 == 0 {
            return Ok(Some(Self {
                kind: AtomKind::Short,
                bytes: first & 0x20 != 0,
                signed: first & 0x10 != 0,
                header_len: 1,
                len: usize::from(first & 0x0F),
            }));
        }
        if first & 0x20 == 0 {
            let low = header_byte(buf, offset, 1, 2)?;
            return Ok(Some(Self {
                kind: AtomKind::Medium,
                bytes: first & 0x10 != 0,
                signed: first & 0x08 != 0,
                header_len: 2,
                len: (usize::from(first & 0x07) << 8) | usize::from(low),
            }));
        }
        if first & 0x10 == 0 {
            if first & 0x0C != 0 {
                return Err(TokenError::ReservedByte {
                    offset,
                    byte: first,
                });
            }
            let b1 = header_byte(buf, offset, 1, 4)?;
            let b2 = header_byte(buf, offset, 2, 4)?;
            let b3 = header_byte(buf, offset, 3, 4)?;
            return Ok(Some(Self {
                kind: AtomKind::Long,
                bytes: first & 0x02 != 0,
                signed: first & 0x01 != 0,
                header_len: 4,
                len: (usize::from(b1) << 16) | (usize::from(b2) << 8) | usize::from(b3),
            }));
        }
        Ok(None)
    }

    /// Total encoded size of the atom, header included.
    #[must_use]
    pub const fn total_len(&self) -> usize {
        self.header_len + self.len
    }
}

fn header_byte(buf: &[u8], offset: usize, index: usize, header_len: usize) -> TokenResult<u8> {
    buf.get(offset + index)
        .copied()
        .ok_or(TokenError::Truncated {
            offset,
            needed: header_len,
            available: buf.len().saturating_sub(offset),
        })
}
