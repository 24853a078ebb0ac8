//! ComPacket, Packet and SubPacket headers.
//!
//! All fields are big-endian. The three headers are laid out back to back,
//! so the token payload of the single SubPacket starts at [`PAYLOAD_OFFSET`].

use std::fmt;

use crate::error::{DecodeError, EncodeError, WireResult};

/// ComPacket header size in bytes.
pub const COM_PACKET_HEADER_SIZE: usize = 20;

/// Packet header size in bytes.
pub const PACKET_HEADER_SIZE: usize = 24;

/// SubPacket header size in bytes.
pub const SUB_PACKET_HEADER_SIZE: usize = 12;

/// Offset of the SubPacket payload (0x38).
pub const PAYLOAD_OFFSET: usize =
    COM_PACKET_HEADER_SIZE + PACKET_HEADER_SIZE + SUB_PACKET_HEADER_SIZE;

/// A 16-bit communication identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComId(u16);

impl ComId {
    /// ComID used for Level-0 discovery (security protocol 1).
    pub const DISCOVERY: Self = Self(0x0001);

    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for ComId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<ComId> for u16 {
    fn from(comid: ComId) -> Self {
        comid.0
    }
}

impl fmt::Display for ComId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Host and TPer session numbers scoping every call inside a session.
///
/// Both are zero outside a session (Session Manager calls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionIds {
    /// Host session number, chosen by the host in StartSession.
    pub hsn: u32,
    /// TPer session number, assigned by the TPer in SyncSession.
    pub tsn: u32,
}

impl SessionIds {
    /// Session numbers for Session Manager calls.
    pub const NONE: Self = Self { hsn: 0, tsn: 0 };

    #[must_use]
    pub const fn new(hsn: u32, tsn: u32) -> Self {
        Self { hsn, tsn }
    }

    /// Returns `true` for the Session Manager pair.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.hsn == 0 && self.tsn == 0
    }
}

impl fmt::Display for SessionIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsn=0x{:X} tsn=0x{:X}", self.hsn, self.tsn)
    }
}

/// Outer header carrying the ComID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComPacketHeader {
    pub comid: u16,
    pub comid_extension: u16,
    /// Bytes the TPer still holds for the host.
    pub outstanding_data: u32,
    /// Minimum transfer size the TPer needs to return them.
    pub min_transfer: u32,
    /// Length of everything after this header.
    pub length: u32,
}

impl ComPacketHeader {
    #[must_use]
    pub const fn new(comid: ComId) -> Self {
        Self {
            comid: comid.raw(),
            comid_extension: 0,
            outstanding_data: 0,
            min_transfer: 0,
            length: 0,
        }
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<usize, EncodeError> {
        ensure_space(out, COM_PACKET_HEADER_SIZE)?;
        out[0..4].fill(0);
        out[4..6].copy_from_slice(&self.comid.to_be_bytes());
        out[6..8].copy_from_slice(&self.comid_extension.to_be_bytes());
        out[8..12].copy_from_slice(&self.outstanding_data.to_be_bytes());
        out[12..16].copy_from_slice(&self.min_transfer.to_be_bytes());
        out[16..20].copy_from_slice(&self.length.to_be_bytes());
        Ok(COM_PACKET_HEADER_SIZE)
    }

    pub fn decode(buf: &[u8]) -> WireResult<Self> {
        ensure_len(buf, COM_PACKET_HEADER_SIZE)?;
        Ok(Self {
            comid: be_u16(buf, 4),
            comid_extension: be_u16(buf, 6),
            outstanding_data: be_u32(buf, 8),
            min_transfer: be_u32(buf, 12),
            length: be_u32(buf, 16),
        })
    }
}

/// Middle header carrying the session numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketHeader {
    pub tsn: u32,
    pub hsn: u32,
    pub seq_number: u32,
    pub ack_type: u16,
    pub acknowledgement: u32,
    /// Length of everything after this header, SubPacket padding included.
    pub length: u32,
}

impl PacketHeader {
    #[must_use]
    pub const fn new(ids: SessionIds) -> Self {
        Self {
            tsn: ids.tsn,
            hsn: ids.hsn,
            seq_number: 0,
            ack_type: 0,
            acknowledgement: 0,
            length: 0,
        }
    }

    #[must_use]
    pub const fn ids(&self) -> SessionIds {
        SessionIds::new(self.hsn, self.tsn)
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<usize, EncodeError> {
        ensure_space(out, PACKET_HEADER_SIZE)?;
        out[0..4].copy_from_slice(&self.tsn.to_be_bytes());
        out[4..8].copy_from_slice(&self.hsn.to_be_bytes());
        out[8..12].copy_from_slice(&self.seq_number.to_be_bytes());
        out[12..14].fill(0);
        out[14..16].copy_from_slice(&self.ack_type.to_be_bytes());
        out[16..20].copy_from_slice(&self.acknowledgement.to_be_bytes());
        out[20..24].copy_from_slice(&self.length.to_be_bytes());
        Ok(PACKET_HEADER_SIZE)
    }

    pub fn decode(buf: &[u8]) -> WireResult<Self> {
        ensure_len(buf, PACKET_HEADER_SIZE)?;
        Ok(Self {
            tsn: be_u32(buf, 0),
            hsn: be_u32(buf, 4),
            seq_number: be_u32(buf, 8),
            ack_type: be_u16(buf, 14),
            acknowledgement: be_u32(buf, 16),
            length: be_u32(buf, 20),
        })
    }
}

/// Inner header describing the token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubPacketHeader {
    pub kind: u16,
    /// Payload length, padding excluded.
    pub length: u32,
}

impl SubPacketHeader {
    /// Kind of a SubPacket carrying a token stream.
    pub const KIND_DATA: u16 = 0x0000;
    /// Kind of a SubPacket carrying a credit-control token.
    pub const KIND_CREDIT_CONTROL: u16 = 0x8001;

    pub fn encode(&self, out: &mut [u8]) -> Result<usize, EncodeError> {
        ensure_space(out, SUB_PACKET_HEADER_SIZE)?;
        out[0..6].fill(0);
        out[6..8].copy_from_slice(&self.kind.to_be_bytes());
        out[8..12].copy_from_slice(&self.length.to_be_bytes());
        Ok(SUB_PACKET_HEADER_SIZE)
    }

    pub fn decode(buf: &[u8]) -> WireResult<Self> {
        ensure_len(buf, SUB_PACKET_HEADER_SIZE)?;
        Ok(Self {
            kind: be_u16(buf, 6),
            length: be_u32(buf, 8),
        })
    }
}

fn ensure_space(out: &[u8], needed: usize) -> Result<(), EncodeError> {
    if out.len() < needed {
        return Err(EncodeError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }
    Ok(())
}

fn ensure_len(buf: &[u8], required: usize) -> WireResult<()> {
    if buf.len() < required {
        return Err(DecodeError::PacketTooSmall {
            actual: buf.len(),
            required,
        });
    }
    Ok(())
}

// Callers check lengths first.
pub(crate) fn be_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn be_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
