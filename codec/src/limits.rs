//! Host-side limits and the properties advertised to the TPer.

use token::{Value, DEFAULT_MAX_DEPTH};

/// Limits enforced while decoding responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum list/name nesting accepted in a response.
    pub max_token_depth: usize,
    /// Maximum number of values accepted in a single result list.
    pub max_results: usize,
    /// Extra receives issued while the TPer answers with an empty ComPacket.
    pub max_receive_polls: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_token_depth: DEFAULT_MAX_DEPTH,
            max_results: 1024,
            max_receive_polls: 16,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_token_depth: 8,
            max_results: 64,
            max_receive_polls: 2,
        }
    }
}

/// Communication properties the host announces through the Properties method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostProperties {
    pub max_com_packet_size: u32,
    pub max_packet_size: u32,
    pub max_ind_token_size: u32,
}

impl Default for HostProperties {
    fn default() -> Self {
        Self {
            max_com_packet_size: 4096,
            max_packet_size: 4076,
            max_ind_token_size: 4040,
        }
    }
}

impl HostProperties {
    /// The smallest values every Opal TPer must accept.
    #[must_use]
    pub const fn minimum() -> Self {
        Self {
            max_com_packet_size: 2048,
            max_packet_size: 2028,
            max_ind_token_size: 1992,
        }
    }

    /// Returns the `HostProperties` parameter list of name/value pairs.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::List(vec![
            Value::named(&b"MaxComPacketSize"[..], self.max_com_packet_size),
            Value::named(&b"MaxPacketSize"[..], self.max_packet_size),
            Value::named(&b"MaxIndTokenSize"[..], self.max_ind_token_size),
        ])
    }
}
