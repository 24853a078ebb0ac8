//! Level-0 discovery parsing.
//!
//! The discovery response starts with a 48-byte header (parameter length,
//! version, reserved and vendor bytes) followed by feature descriptors. Each
//! descriptor is a 2-byte feature code, a version byte (high nibble), a
//! 1-byte remainder length and that many payload bytes.

use std::fmt;

use crate::error::{DecodeError, WireResult};
use crate::header::{be_u16, be_u32, ComId};

/// Size of the discovery header; descriptors start here.
pub const LEVEL0_HEADER_SIZE: usize = 48;

/// Size of a feature descriptor header.
pub const DESCRIPTOR_HEADER_SIZE: usize = 4;

/// Feature codes reported in Level-0 discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureCode {
    TPer,
    Locking,
    Geometry,
    Enterprise,
    OpalV1,
    SingleUser,
    DataStore,
    OpalV2,
    Opalite,
    PyriteV1,
    PyriteV2,
    Ruby,
    BlockSid,
    Other(u16),
}

impl FeatureCode {
    /// SSC features in the order a ComID is looked up.
    pub const SSC_PREFERENCE: [Self; 7] = [
        Self::OpalV2,
        Self::OpalV1,
        Self::PyriteV2,
        Self::PyriteV1,
        Self::Opalite,
        Self::Ruby,
        Self::Enterprise,
    ];

    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0x0001 => Self::TPer,
            0x0002 => Self::Locking,
            0x0003 => Self::Geometry,
            0x0100 => Self::Enterprise,
            0x0200 => Self::OpalV1,
            0x0201 => Self::SingleUser,
            0x0202 => Self::DataStore,
            0x0203 => Self::OpalV2,
            0x0301 => Self::Opalite,
            0x0302 => Self::PyriteV1,
            0x0303 => Self::PyriteV2,
            0x0304 => Self::Ruby,
            0x0402 => Self::BlockSid,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        match self {
            Self::TPer => 0x0001,
            Self::Locking => 0x0002,
            Self::Geometry => 0x0003,
            Self::Enterprise => 0x0100,
            Self::OpalV1 => 0x0200,
            Self::SingleUser => 0x0201,
            Self::DataStore => 0x0202,
            Self::OpalV2 => 0x0203,
            Self::Opalite => 0x0301,
            Self::PyriteV1 => 0x0302,
            Self::PyriteV2 => 0x0303,
            Self::Ruby => 0x0304,
            Self::BlockSid => 0x0402,
            Self::Other(raw) => raw,
        }
    }

    /// Returns `true` for features naming a security subsystem class.
    #[must_use]
    pub const fn is_ssc(self) -> bool {
        matches!(
            self,
            Self::Enterprise
                | Self::OpalV1
                | Self::OpalV2
                | Self::Opalite
                | Self::PyriteV1
                | Self::PyriteV2
                | Self::Ruby
        )
    }
}

impl fmt::Display for FeatureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TPer => "TPer",
            Self::Locking => "Locking",
            Self::Geometry => "Geometry",
            Self::Enterprise => "Enterprise",
            Self::OpalV1 => "Opal 1.0",
            Self::SingleUser => "Single User Mode",
            Self::DataStore => "DataStore",
            Self::OpalV2 => "Opal 2.0",
            Self::Opalite => "Opalite",
            Self::PyriteV1 => "Pyrite 1.0",
            Self::PyriteV2 => "Pyrite 2.0",
            Self::Ruby => "Ruby",
            Self::BlockSid => "Block SID",
            Self::Other(raw) => return write!(f, "0x{raw:04X}"),
        };
        f.write_str(name)
    }
}

/// Discovery header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Level0Header {
    /// Parameter length: bytes after this field.
    pub length: u32,
    pub major_version: u16,
    pub minor_version: u16,
}

impl Level0Header {
    /// Total size of the discovery data, header included. `None` if it does
    /// not fit in `usize`.
    #[must_use]
    pub const fn total_len(&self) -> Option<usize> {
        (self.length as usize).checked_add(4)
    }
}

/// One feature descriptor, borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDescriptor<'a> {
    pub code: FeatureCode,
    /// Descriptor version (high nibble of the version byte).
    pub version: u8,
    /// Payload following the 4-byte descriptor header.
    pub data: &'a [u8],
}

impl FeatureDescriptor<'_> {
    fn byte(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        (self.data.len() >= offset + 2).then(|| be_u16(self.data, offset))
    }

    /// Base ComID of an SSC feature.
    #[must_use]
    pub fn base_comid(&self) -> Option<ComId> {
        if !self.code.is_ssc() {
            return None;
        }
        self.u16_at(0).map(ComId::new)
    }
}

/// Parsed Level-0 discovery data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level0Discovery<'a> {
    pub header: Level0Header,
    pub features: Vec<FeatureDescriptor<'a>>,
}

/// Parses Level-0 discovery data.
///
/// Descriptors are read from offset 48 until the declared total length. The
/// descriptor sizes must add up to exactly that length.
pub fn parse_level0(buf: &[u8]) -> WireResult<Level0Discovery<'_>> {
    if buf.len() < LEVEL0_HEADER_SIZE {
        return Err(DecodeError::DiscoveryTruncated {
            needed: LEVEL0_HEADER_SIZE,
            available: buf.len(),
        });
    }
    let header = Level0Header {
        length: be_u32(buf, 0),
        major_version: be_u16(buf, 4),
        minor_version: be_u16(buf, 6),
    };
    let Some(total) = header.total_len() else {
        return Err(DecodeError::DiscoveryTruncated {
            needed: usize::MAX,
            available: buf.len(),
        });
    };
    if total > buf.len() {
        return Err(DecodeError::DiscoveryTruncated {
            needed: total,
            available: buf.len(),
        });
    }
    if total < LEVEL0_HEADER_SIZE {
        return Err(DecodeError::DiscoveryTruncated {
            needed: LEVEL0_HEADER_SIZE,
            available: total,
        });
    }

    let mut features = Vec::new();
    let mut offset = LEVEL0_HEADER_SIZE;
    while offset < total {
        if offset + DESCRIPTOR_HEADER_SIZE > total {
            return Err(DecodeError::DiscoveryTruncated {
                needed: offset + DESCRIPTOR_HEADER_SIZE,
                available: total,
            });
        }
        // Feature code 0 is reserved; a zeroed header is transfer padding.
        if buf[offset..offset + DESCRIPTOR_HEADER_SIZE] == [0; DESCRIPTOR_HEADER_SIZE] {
            return Err(DecodeError::DiscoveryTruncated {
                needed: total,
                available: offset,
            });
        }
        let code = FeatureCode::from_raw(be_u16(buf, offset));
        let version = buf[offset + 2] >> 4;
        let len = usize::from(buf[offset + 3]);
        let end = offset + DESCRIPTOR_HEADER_SIZE + len;
        if end > total {
            return Err(DecodeError::DiscoveryTruncated {
                needed: end,
                available: total,
            });
        }
        features.push(FeatureDescriptor {
            code,
            version,
            data: &buf[offset + DESCRIPTOR_HEADER_SIZE..end],
        });
        offset = end;
    }

    Ok(Level0Discovery { header, features })
}

impl<'a> Level0Discovery<'a> {
    /// First descriptor with the given code.
    #[must_use]
    pub fn feature(&self, code: FeatureCode) -> Option<&FeatureDescriptor<'a>> {
        self.features.iter().find(|f| f.code == code)
    }

    /// Returns `true` if the given feature was reported.
    #[must_use]
    pub fn supports(&self, code: FeatureCode) -> bool {
        self.feature(code).is_some()
    }

    /// The SSC descriptor used for communication, by
    /// [`FeatureCode::SSC_PREFERENCE`].
    #[must_use]
    pub fn ssc_descriptor(&self) -> Option<&FeatureDescriptor<'a>> {
        FeatureCode::SSC_PREFERENCE
            .iter()
            .filter_map(|&code| self.feature(code))
            .find(|f| f.base_comid().is_some())
    }

    /// Base ComID of the Opal 2.0 feature, or of another SSC feature when
    /// Opal 2.0 is absent.
    #[must_use]
    pub fn comid(&self) -> Option<ComId> {
        self.ssc_descriptor().and_then(FeatureDescriptor::base_comid)
    }

    /// Like [`comid`](Self::comid), failing with
    /// [`DecodeError::ComIdNotFound`].
    pub fn require_comid(&self) -> WireResult<ComId> {
        self.comid().ok_or(DecodeError::ComIdNotFound)
    }

    /// Typed view of the SSC feature.
    #[must_use]
    pub fn ssc(&self) -> Option<SscFeature> {
        self.ssc_descriptor().and_then(SscFeature::parse)
    }

    /// Typed view of the Locking feature.
    #[must_use]
    pub fn locking(&self) -> Option<LockingFeature> {
        self.feature(FeatureCode::Locking)
            .and_then(|f| f.byte(0))
            .map(LockingFeature::from_bits)
    }

    /// Typed view of the TPer feature.
    #[must_use]
    pub fn tper(&self) -> Option<TperFeature> {
        self.feature(FeatureCode::TPer)
            .and_then(|f| f.byte(0))
            .map(TperFeature::from_bits)
    }
}

/// TPer feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TperFeature {
    pub sync_supported: bool,
    pub async_supported: bool,
    pub ack_nak_supported: bool,
    pub buffer_mgmt_supported: bool,
    pub streaming_supported: bool,
    pub comid_mgmt_supported: bool,
}

impl TperFeature {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            sync_supported: bits & 0x01 != 0,
            async_supported: bits & 0x02 != 0,
            ack_nak_supported: bits & 0x04 != 0,
            buffer_mgmt_supported: bits & 0x08 != 0,
            streaming_supported: bits & 0x10 != 0,
            comid_mgmt_supported: bits & 0x40 != 0,
        }
    }
}

/// Locking feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LockingFeature {
    pub supported: bool,
    /// The Locking SP has been activated.
    pub enabled: bool,
    /// At least one range is locked.
    pub locked: bool,
    pub media_encryption: bool,
    pub mbr_enabled: bool,
    pub mbr_done: bool,
}

impl LockingFeature {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            supported: bits & 0x01 != 0,
            enabled: bits & 0x02 != 0,
            locked: bits & 0x04 != 0,
            media_encryption: bits & 0x08 != 0,
            mbr_enabled: bits & 0x10 != 0,
            mbr_done: bits & 0x20 != 0,
        }
    }
}

/// Common fields of the SSC feature descriptors.
///
/// Fields a given SSC version does not define are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SscFeature {
    pub code: FeatureCode,
    pub base_comid: ComId,
    pub num_comids: u16,
    pub range_crossing: Option<bool>,
    pub admin_authorities: Option<u16>,
    pub user_authorities: Option<u16>,
    /// `Some(true)` when the initial C_PIN_SID PIN equals the MSID.
    pub initial_sid_is_msid: Option<bool>,
    /// `Some(true)` when a TPer revert resets C_PIN_SID to the MSID.
    pub sid_reverts_to_msid: Option<bool>,
}

impl SscFeature {
    fn parse(descriptor: &FeatureDescriptor<'_>) -> Option<Self> {
        let code = descriptor.code;
        let base_comid = descriptor.base_comid()?;
        let num_comids = descriptor.u16_at(2)?;

        let range_crossing = match code {
            FeatureCode::Enterprise
            | FeatureCode::OpalV1
            | FeatureCode::OpalV2
            | FeatureCode::Ruby => descriptor.byte(4).map(|b| b & 0x01 != 0),
            _ => None,
        };
        let (admin_authorities, user_authorities) = match code {
            FeatureCode::OpalV2 | FeatureCode::Ruby => (descriptor.u16_at(5), descriptor.u16_at(7)),
            _ => (None, None),
        };
        let (initial_sid_is_msid, sid_reverts_to_msid) = match code {
            FeatureCode::OpalV2
            | FeatureCode::Ruby
            | FeatureCode::Opalite
            | FeatureCode::PyriteV1
            | FeatureCode::PyriteV2 => (
                descriptor.byte(9).map(|b| b == 0),
                descriptor.byte(10).map(|b| b == 0),
            ),
            _ => (None, None),
        };

        Some(Self {
            code,
            base_comid,
            num_comids,
            range_crossing,
            admin_authorities,
            user_authorities,
            initial_sid_is_msid,
            sid_reverts_to_msid,
        })
    }
}
