//! The 8-byte identifier type.

use std::fmt;

use token::Value;

use crate::catalog::{Method, Object};

/// An 8-byte TCG identifier naming an SP, table, object, authority or method.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Uid([u8; 8]);

impl Uid {
    /// Size of a UID on the wire.
    pub const LEN: usize = 8;

    /// Creates a UID from its raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Creates a UID from its big-endian integer form.
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    /// Creates a UID from a slice, which must be exactly eight bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 8]>::try_from(bytes).ok().map(Self)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Returns the big-endian integer form.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Returns the table half (upper four bytes) of an object UID.
    #[must_use]
    pub const fn table(self) -> u32 {
        (self.as_u64() >> 32) as u32
    }

    const fn indexed(prefix: u64, index: u16) -> Self {
        Self::from_u64(prefix | index as u64)
    }

    /// `Admin<n>` authority of the Locking SP.
    #[must_use]
    pub const fn admin(n: u16) -> Self {
        Self::indexed(0x0000_0009_0001_0000, n)
    }

    /// `User<n>` authority of the Locking SP.
    #[must_use]
    pub const fn user(n: u16) -> Self {
        Self::indexed(0x0000_0009_0003_0000, n)
    }

    /// `C_PIN_Admin<n>` credential row.
    #[must_use]
    pub const fn c_pin_admin(n: u16) -> Self {
        Self::indexed(0x0000_000B_0001_0000, n)
    }

    /// `C_PIN_User<n>` credential row.
    #[must_use]
    pub const fn c_pin_user(n: u16) -> Self {
        Self::indexed(0x0000_000B_0003_0000, n)
    }

    /// Locking table row for range `n`; range 0 is the global range.
    #[must_use]
    pub const fn locking_range(n: u16) -> Self {
        if n == 0 {
            Object::LockingRangeGlobal.uid()
        } else {
            Self::indexed(0x0000_0802_0003_0000, n)
        }
    }

    /// Media encryption key for range `n`; range 0 is the global range.
    #[must_use]
    pub const fn k_aes_256_range(n: u16) -> Self {
        if n == 0 {
            Object::KAes256GlobalRange.uid()
        } else {
            Self::indexed(0x0000_0806_0003_0000, n)
        }
    }

    /// Catalog name of this UID, if it has one.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Object::from_uid(self)
            .map(Object::name)
            .or_else(|| Method::from_uid(self).map(Method::name))
    }
}

impl From<[u8; 8]> for Uid {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl From<Uid> for [u8; 8] {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl From<Uid> for Value {
    fn from(uid: Uid) -> Self {
        Self::Bytes(uid.0.to_vec())
    }
}

impl AsRef<[u8]> for Uid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.as_u64())
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Uid({self} {name})"),
            None => write!(f, "Uid({self})"),
        }
    }
}
