//! Framing a token payload into a ComPacket, and back.

use crate::error::{DecodeError, EncodeError, LengthField, WireResult};
use crate::header::{
    ComId, ComPacketHeader, PacketHeader, SessionIds, SubPacketHeader, COM_PACKET_HEADER_SIZE,
    PACKET_HEADER_SIZE, PAYLOAD_OFFSET, SUB_PACKET_HEADER_SIZE,
};
use crate::limits::Limits;

const COM_LENGTH_OFFSET: usize = 16;
const PACKET_LENGTH_OFFSET: usize = COM_PACKET_HEADER_SIZE + 20;
const SUB_LENGTH_OFFSET: usize = COM_PACKET_HEADER_SIZE + PACKET_HEADER_SIZE + 8;

/// Rounds a payload length up to the 4-byte SubPacket alignment.
#[must_use]
pub const fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// A decoded response buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub com_packet: ComPacketHeader,
    pub packet: PacketHeader,
    pub sub_packet: SubPacketHeader,
    /// Token payload, padding excluded.
    pub payload: &'a [u8],
}

impl Frame<'_> {
    #[must_use]
    pub const fn comid(&self) -> ComId {
        ComId::new(self.com_packet.comid)
    }

    #[must_use]
    pub const fn ids(&self) -> SessionIds {
        self.packet.ids()
    }
}

/// Frames `payload` for `comid` and the session pair `ids`.
///
/// The result is always `limits.transfer_size` bytes long. Headers are
/// written with zero lengths, the payload is copied in, and the three length
/// fields are then patched: SubPacket = payload, Packet = SubPacket header +
/// padded payload, ComPacket = Packet header + Packet length.
pub fn frame(
    comid: ComId,
    ids: SessionIds,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodeError> {
    let padded = padded_len(payload.len());
    let needed = PAYLOAD_OFFSET + padded;
    if needed > limits.transfer_size {
        return Err(EncodeError::BufferTooSmall {
            needed,
            available: limits.transfer_size,
        });
    }
    let sub_len = length_u32(payload.len())?;
    let packet_len = length_u32(SUB_PACKET_HEADER_SIZE + padded)?;
    let com_len = length_u32(PACKET_HEADER_SIZE + SUB_PACKET_HEADER_SIZE + padded)?;

    let mut buf = vec![0u8; limits.transfer_size];
    let mut offset = ComPacketHeader::new(comid).encode(&mut buf)?;
    offset += PacketHeader::new(ids).encode(&mut buf[offset..])?;
    let sub = SubPacketHeader {
        kind: SubPacketHeader::KIND_DATA,
        length: 0,
    };
    offset += sub.encode(&mut buf[offset..])?;
    buf[offset..offset + payload.len()].copy_from_slice(payload);

    patch_u32(&mut buf, SUB_LENGTH_OFFSET, sub_len);
    patch_u32(&mut buf, PACKET_LENGTH_OFFSET, packet_len);
    patch_u32(&mut buf, COM_LENGTH_OFFSET, com_len);
    Ok(buf)
}

/// Decodes a response buffer, bounded by its declared lengths.
///
/// Bytes past the declared ComPacket length are ignored. An empty ComPacket
/// is [`DecodeError::NoPayload`].
pub fn unframe(buf: &[u8]) -> WireResult<Frame<'_>> {
    if buf.len() < COM_PACKET_HEADER_SIZE {
        return Err(DecodeError::PacketTooSmall {
            actual: buf.len(),
            required: PAYLOAD_OFFSET,
        });
    }
    let com_packet = ComPacketHeader::decode(buf)?;
    if com_packet.length == 0 {
        return Err(DecodeError::NoPayload {
            outstanding_data: com_packet.outstanding_data,
        });
    }
    if buf.len() < PAYLOAD_OFFSET {
        return Err(DecodeError::PacketTooSmall {
            actual: buf.len(),
            required: PAYLOAD_OFFSET,
        });
    }

    let com_len = com_packet.length as usize;
    let com_bound = buf.len() - COM_PACKET_HEADER_SIZE;
    if com_len > com_bound || com_len < PACKET_HEADER_SIZE + SUB_PACKET_HEADER_SIZE {
        return Err(DecodeError::FrameLengthMismatch {
            field: LengthField::ComPacket,
            declared: com_len,
            bound: com_bound,
        });
    }

    let packet = PacketHeader::decode(&buf[COM_PACKET_HEADER_SIZE..])?;
    let packet_len = packet.length as usize;
    let packet_bound = com_len - PACKET_HEADER_SIZE;
    if packet_len != packet_bound {
        return Err(DecodeError::FrameLengthMismatch {
            field: LengthField::Packet,
            declared: packet_len,
            bound: packet_bound,
        });
    }

    let sub_packet = SubPacketHeader::decode(&buf[COM_PACKET_HEADER_SIZE + PACKET_HEADER_SIZE..])?;
    let sub_len = sub_packet.length as usize;
    let sub_bound = packet_len - SUB_PACKET_HEADER_SIZE;
    if sub_len > sub_bound {
        return Err(DecodeError::FrameLengthMismatch {
            field: LengthField::SubPacket,
            declared: sub_len,
            bound: sub_bound,
        });
    }

    Ok(Frame {
        com_packet,
        packet,
        sub_packet,
        payload: &buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + sub_len],
    })
}

fn length_u32(length: usize) -> Result<u32, EncodeError> {
    u32::try_from(length).map_err(|_| EncodeError::LengthOverflow { length })
}

fn patch_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}
