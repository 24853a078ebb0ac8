//! Token writer for building Opal token streams.

use crate::atom::{
    Marker, LONG_MAX_LEN, LONG_TAG, MEDIUM_MAX_LEN, MEDIUM_TAG, SHORT_MAX_LEN, SHORT_TAG, TINY_MAX,
};
use crate::error::{TokenError, TokenResult};
use crate::value::Value;

/// Byte-string flag inside short/medium/long atom headers.
const SHORT_BYTES: u8 = 0b0010_0000;
const MEDIUM_BYTES: u8 = 0b0001_0000;
const LONG_BYTES: u8 = 0b0000_0010;

/// Accumulates encoded tokens in an owned buffer.
///
/// Every write picks the shortest legal atom form. Call
/// [`finish`](Self::finish) to take the encoded bytes.
#[derive(Debug, Default, Clone)]
pub struct TokenWriter {
    bytes: Vec<u8>,
}

impl TokenWriter {
    /// Creates a new empty `TokenWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `TokenWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.bytes.len()
    }

    /// Writes an unsigned integer.
    ///
    /// Values up to 63 use a tiny atom; anything larger uses a short atom
    /// holding the minimal big-endian magnitude.
    pub fn write_uint(&mut self, value: u64) {
        if value <= TINY_MAX {
            // Fits in six bits.
            #[allow(clippy::cast_possible_truncation)]
            self.bytes.push(value as u8);
            return;
        }
        let be = value.to_be_bytes();
        let skip = (value.leading_zeros() / 8) as usize;
        let magnitude = &be[skip..];
        #[allow(clippy::cast_possible_truncation)]
        self.bytes.push(SHORT_TAG | magnitude.len() as u8);
        self.bytes.extend_from_slice(magnitude);
    }

    /// Writes a boolean as the integer 0 or 1.
    pub fn write_bool(&mut self, value: bool) {
        self.write_uint(u64::from(value));
    }

    /// Writes a byte string.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::AtomTooLong`] if `data` is longer than a long
    /// atom can describe (16 MiB - 1).
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_bytes(&mut self, data: &[u8]) -> TokenResult<()> {
        let len = data.len();
        if len <= SHORT_MAX_LEN {
            self.bytes.push(SHORT_TAG | SHORT_BYTES | len as u8);
        } else if len <= MEDIUM_MAX_LEN {
            self.bytes
                .push(MEDIUM_TAG | MEDIUM_BYTES | ((len >> 8) as u8 & 0x07));
            self.bytes.push(len as u8);
        } else if len <= LONG_MAX_LEN {
            self.bytes.push(LONG_TAG | LONG_BYTES);
            self.bytes.push((len >> 16) as u8);
            self.bytes.push((len >> 8) as u8);
            self.bytes.push(len as u8);
        } else {
            return Err(TokenError::AtomTooLong { len });
        }
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Writes a structural marker.
    pub fn write_marker(&mut self, marker: Marker) {
        self.bytes.push(marker.byte());
    }

    /// Opens a list.
    pub fn start_list(&mut self) {
        self.write_marker(Marker::StartList);
    }

    /// Closes a list.
    pub fn end_list(&mut self) {
        self.write_marker(Marker::EndList);
    }

    /// Opens a named value.
    pub fn start_name(&mut self) {
        self.write_marker(Marker::StartName);
    }

    /// Closes a named value.
    pub fn end_name(&mut self) {
        self.write_marker(Marker::EndName);
    }

    /// Writes a whole value tree.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::AtomTooLong`] if any byte string in the tree is
    /// too long to encode. Bytes written before the failure stay in the
    /// buffer.
    pub fn write_value(&mut self, value: &Value) -> TokenResult<()> {
        match value {
            Value::Uint(v) => self.write_uint(*v),
            Value::Bytes(b) => self.write_bytes(b)?,
            Value::List(items) => {
                self.start_list();
                for item in items {
                    self.write_value(item)?;
                }
                self.end_list();
            }
            Value::Named { name, value } => {
                self.start_name();
                self.write_value(name)?;
                self.write_value(value)?;
                self.end_name();
            }
        }
        Ok(())
    }

    /// Finishes writing and returns the byte buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        buf.append(&mut self.bytes);
    }
}
