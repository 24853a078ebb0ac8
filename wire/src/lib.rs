//! ComPacket framing and Level-0 discovery for the TCG Opal SSC.
//!
//! This crate handles the binary envelope around token streams: the nested
//! ComPacket/Packet/SubPacket headers and the Level-0 discovery structure
//! used to find the ComID. It does not know about tokens or methods, only
//! the structure of the buffers exchanged with the TPer.
//!
//! # Design Principles
//!
//! - **Patch after fill** - Length fields are written once the payload is known.
//! - **Bounded decoding** - Parsing is bounded by declared lengths, never by the
//!   physical buffer size, and every length is checked before it is used.
//! - **No domain knowledge** - This crate frames payloads, it does not read them.

mod discovery;
mod error;
mod header;
mod limits;
mod packet;

pub use discovery::{
    parse_level0, FeatureCode, FeatureDescriptor, Level0Discovery, Level0Header, LockingFeature,
    SscFeature, TperFeature, DESCRIPTOR_HEADER_SIZE, LEVEL0_HEADER_SIZE,
};
pub use error::{DecodeError, EncodeError, LengthField, WireResult};
pub use header::{
    ComId, ComPacketHeader, PacketHeader, SessionIds, SubPacketHeader, COM_PACKET_HEADER_SIZE,
    PACKET_HEADER_SIZE, PAYLOAD_OFFSET, SUB_PACKET_HEADER_SIZE,
};
pub use limits::{Limits, DEFAULT_TRANSFER_SIZE};
pub use packet::{frame, padded_len, unframe, Frame};
