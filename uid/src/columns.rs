//! Column numbers, cell-block names, parameter names and life cycle states.

/// Column numbers, grouped by table.
pub mod column {
    /// Common to every object table.
    pub const UID: u64 = 0x00;

    /// `C_PIN` table.
    pub const PIN: u64 = 0x03;

    /// `Authority` table.
    pub const ENABLED: u64 = 0x05;

    /// `SP` table.
    pub const LIFECYCLE: u64 = 0x06;

    /// `Locking` table.
    pub const RANGE_START: u64 = 0x03;
    pub const RANGE_LENGTH: u64 = 0x04;
    pub const READ_LOCK_ENABLED: u64 = 0x05;
    pub const WRITE_LOCK_ENABLED: u64 = 0x06;
    pub const READ_LOCKED: u64 = 0x07;
    pub const WRITE_LOCKED: u64 = 0x08;
    pub const ACTIVE_KEY: u64 = 0x0A;

    /// `LockingInfo` table.
    pub const MAX_RANGES: u64 = 0x04;

    /// `MBRControl` table.
    pub const MBR_ENABLE: u64 = 0x01;
    pub const MBR_DONE: u64 = 0x02;
}

/// Names inside the `Cellblock` parameter of Get.
pub mod cell {
    pub const TABLE: u64 = 0x00;
    pub const START_ROW: u64 = 0x01;
    pub const END_ROW: u64 = 0x02;
    pub const START_COLUMN: u64 = 0x03;
    pub const END_COLUMN: u64 = 0x04;
}

/// Names of optional method parameters.
pub mod param {
    /// Set: `Where`.
    pub const WHERE: u64 = 0x00;
    /// Set: `Values`.
    pub const VALUES: u64 = 0x01;
    /// Properties: `HostProperties`.
    pub const HOST_PROPERTIES: u64 = 0x00;
    /// StartSession: `HostChallenge`.
    pub const HOST_CHALLENGE: u64 = 0x00;
    /// StartSession: `HostSigningAuthority`.
    pub const HOST_SIGNING_AUTHORITY: u64 = 0x03;
    /// Authenticate: `Proof`.
    pub const PROOF: u64 = 0x00;
    /// RevertSP: `KeepGlobalRangeKey`.
    pub const KEEP_GLOBAL_RANGE_KEY: u64 = 0x06_0000;
    /// ACE `BooleanExpr` column.
    pub const BOOLEAN_EXPR: u64 = 0x03;
}

/// `LifeCycle` column value of an SP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifeCycleState {
    Issued,
    IssuedDisabled,
    IssuedFrozen,
    IssuedDisabledFrozen,
    IssuedFailed,
    ManufacturedInactive,
    Manufactured,
    ManufacturedDisabled,
    ManufacturedFrozen,
    ManufacturedDisabledFrozen,
    ManufacturedFailed,
}

impl LifeCycleState {
    /// Decodes the column value. Reserved values yield `None`.
    #[must_use]
    pub const fn from_u64(value: u64) -> Option<Self> {
        Some(match value {
            0 => Self::Issued,
            1 => Self::IssuedDisabled,
            2 => Self::IssuedFrozen,
            3 => Self::IssuedDisabledFrozen,
            4 => Self::IssuedFailed,
            8 => Self::ManufacturedInactive,
            9 => Self::Manufactured,
            10 => Self::ManufacturedDisabled,
            11 => Self::ManufacturedFrozen,
            12 => Self::ManufacturedDisabledFrozen,
            13 => Self::ManufacturedFailed,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        match self {
            Self::Issued => 0,
            Self::IssuedDisabled => 1,
            Self::IssuedFrozen => 2,
            Self::IssuedDisabledFrozen => 3,
            Self::IssuedFailed => 4,
            Self::ManufacturedInactive => 8,
            Self::Manufactured => 9,
            Self::ManufacturedDisabled => 10,
            Self::ManufacturedFrozen => 11,
            Self::ManufacturedDisabledFrozen => 12,
            Self::ManufacturedFailed => 13,
        }
    }

    /// `true` once the SP has been activated.
    #[must_use]
    pub const fn is_manufactured(self) -> bool {
        self.as_u64() >= 9
    }
}
