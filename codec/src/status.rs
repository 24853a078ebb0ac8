//! Method status codes.

use std::fmt;

use tracing::Level;

/// Status code carried in the status list that ends every method response.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodStatus(u8);

impl MethodStatus {
    pub const SUCCESS: Self = Self(0x00);
    pub const NOT_AUTHORIZED: Self = Self(0x01);
    pub const OBSOLETE: Self = Self(0x02);
    pub const SP_BUSY: Self = Self(0x03);
    pub const SP_FAILED: Self = Self(0x04);
    pub const SP_DISABLED: Self = Self(0x05);
    pub const SP_FROZEN: Self = Self(0x06);
    pub const NO_SESSIONS_AVAILABLE: Self = Self(0x07);
    pub const UNIQUENESS_CONFLICT: Self = Self(0x08);
    pub const INSUFFICIENT_SPACE: Self = Self(0x09);
    pub const INSUFFICIENT_ROWS: Self = Self(0x0A);
    pub const INVALID_PARAMETER: Self = Self(0x0C);
    pub const TPER_MALFUNCTION: Self = Self(0x0F);
    pub const TRANSACTION_FAILURE: Self = Self(0x10);
    pub const RESPONSE_OVERFLOW: Self = Self(0x11);
    pub const AUTHORITY_LOCKED_OUT: Self = Self(0x12);
    pub const FAIL: Self = Self(0x3F);

    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Statuses after which repeating the same call later may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self.0, 0x03 | 0x07 | 0x10)
    }

    /// Returns the status name used in the TCG documents, or `None` for
    /// reserved codes.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0x00 => "SUCCESS",
            0x01 => "NOT_AUTHORIZED",
            0x02 => "OBSOLETE",
            0x03 => "SP_BUSY",
            0x04 => "SP_FAILED",
            0x05 => "SP_DISABLED",
            0x06 => "SP_FROZEN",
            0x07 => "NO_SESSIONS_AVAILABLE",
            0x08 => "UNIQUENESS_CONFLICT",
            0x09 => "INSUFFICIENT_SPACE",
            0x0A => "INSUFFICIENT_ROWS",
            0x0C => "INVALID_PARAMETER",
            0x0F => "TPER_MALFUNCTION",
            0x10 => "TRANSACTION_FAILURE",
            0x11 => "RESPONSE_OVERFLOW",
            0x12 => "AUTHORITY_LOCKED_OUT",
            0x3F => "FAIL",
            _ => return None,
        })
    }

    /// Returns a human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self.0 {
            0x00 => "method completed successfully",
            0x01 => "authority is not allowed to invoke this method",
            0x02 => "obsolete status",
            0x03 => "SP is busy",
            0x04 => "SP has failed",
            0x05 => "SP is disabled",
            0x06 => "SP is frozen",
            0x07 => "no more sessions available",
            0x08 => "value would violate a uniqueness constraint",
            0x09 => "not enough space",
            0x0A => "not enough free table rows",
            0x0C => "invalid parameter",
            0x0F => "TPer malfunction",
            0x10 => "transaction failed",
            0x11 => "response would overflow the buffer",
            0x12 => "authority is locked out",
            0x3F => "unspecified failure",
            _ => "reserved status",
        }
    }

    /// Level at which a response with this status is logged.
    #[must_use]
    pub const fn tracing_level(self) -> Level {
        match self.0 {
            0x00 => Level::TRACE,
            0x03 | 0x07 | 0x10 => Level::DEBUG,
            0x01 | 0x0C | 0x12 => Level::INFO,
            0x04 | 0x0F | 0x3F => Level::ERROR,
            _ => Level::WARN,
        }
    }
}

impl From<u8> for MethodStatus {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MethodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:02X})", self.0),
            None => write!(f, "reserved (0x{:02X})", self.0),
        }
    }
}

impl fmt::Debug for MethodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodStatus({self})")
    }
}
