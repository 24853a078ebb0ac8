//! Owned value trees.

use std::fmt;

use crate::error::TokenResult;
use crate::writer::TokenWriter;

/// An owned token value: an atom, a list, or a name/value pair.
///
/// Method parameters are built from these and decoded results are read back
/// into them. The wire has no distinct boolean atom, so `bool` converts to
/// `Uint(0)` or `Uint(1)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Uint(u64),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Named { name: Box<Value>, value: Box<Value> },
}

impl Value {
    /// Builds a `Named` pair.
    pub fn named(name: impl Into<Self>, value: impl Into<Self>) -> Self {
        Self::Named {
            name: Box::new(name.into()),
            value: Box::new(value.into()),
        }
    }

    /// Builds a list from anything convertible into values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns `Some` for the integers 0 and 1.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Uint(0) => Some(false),
            Self::Uint(1) => Some(true),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the name and value of a `Named` pair.
    #[must_use]
    pub fn as_named(&self) -> Option<(&Self, &Self)> {
        match self {
            Self::Named { name, value } => Some((name, value)),
            _ => None,
        }
    }
}

/// Encodes a value tree using the shortest legal atom forms.
///
/// # Errors
///
/// Returns [`TokenError::AtomTooLong`](crate::TokenError::AtomTooLong) if a
/// byte string is longer than a long atom can describe.
pub fn encode_value(value: &Value) -> TokenResult<Vec<u8>> {
    let mut writer = TokenWriter::new();
    writer.write_value(value)?;
    Ok(writer.finish())
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::Uint(u64::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::Uint(u64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Uint(u64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Uint(u64::from(v))
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(v: [u8; N]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(v: &[u8; N]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::Bytes(b) => {
                f.write_str("h'")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Named { name, value } => write!(f, "{name} = {value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_converts_to_uint() {
        assert_eq!(Value::from(true), Value::Uint(1));
        assert_eq!(Value::from(false), Value::Uint(0));
        assert_eq!(Value::Uint(1).as_bool(), Some(true));
        assert_eq!(Value::Uint(2).as_bool(), None);
    }

    #[test]
    fn accessors() {
        let named = Value::named(3u8, [1u8, 2]);
        let (name, value) = named.as_named().unwrap();
        assert_eq!(name.as_uint(), Some(3));
        assert_eq!(value.as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(named.as_uint(), None);
        assert!(Value::list([1u64, 2]).as_list().is_some());
    }

    #[test]
    fn encode_value_is_shortest_form() {
        assert_eq!(encode_value(&Value::Uint(63)).unwrap(), vec![0x3F]);
        assert_eq!(encode_value(&Value::Uint(64)).unwrap(), vec![0x81, 0x40]);
        assert_eq!(
            encode_value(&Value::from(vec![0u8; 15])).unwrap().len(),
            16
        );
    }

    #[test]
    fn display() {
        let value = Value::List(vec![Value::named(0u8, b"\x01\xff"), Value::Uint(9)]);
        assert_eq!(value.to_string(), "[0 = h'01ff', 9]");
    }
}
