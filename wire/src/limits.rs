//! Transfer sizes for security-protocol exchanges.

/// Default size of every security send/receive buffer.
pub const DEFAULT_TRANSFER_SIZE: usize = 2048;

/// Buffer sizes used when talking to a TPer.
///
/// Requests are always padded to `transfer_size` with a zero tail, and
/// responses are requested at the same size. Decoding is bounded by the
/// declared lengths, never by these sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Size of each ComPacket transfer in bytes.
    pub transfer_size: usize,

    /// Size requested for the Level-0 discovery response.
    pub discovery_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            transfer_size: DEFAULT_TRANSFER_SIZE,
            discovery_size: DEFAULT_TRANSFER_SIZE,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            transfer_size: 512,
            discovery_size: 512,
        }
    }

    /// Largest token payload that fits one transfer.
    #[must_use]
    pub const fn max_payload(&self) -> usize {
        self.transfer_size.saturating_sub(crate::PAYLOAD_OFFSET) & !3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_transfer_size() {
        let limits = Limits::default();
        assert_eq!(limits.transfer_size, 2048);
        assert_eq!(limits.discovery_size, 2048);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();
        assert!(test_limits.transfer_size < default_limits.transfer_size);
    }

    #[test]
    fn max_payload_accounts_for_headers() {
        assert_eq!(Limits::default().max_payload(), 2048 - 56);
        let odd = Limits {
            transfer_size: 63,
            discovery_size: 63,
        };
        assert_eq!(odd.max_payload(), 4);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.transfer_size, 512);
    }
}
