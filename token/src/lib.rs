//! Opal token stream encoding and decoding.
//!
//! This crate provides [`TokenWriter`] and [`TokenReader`] for the TCG Storage
//! token format: self-describing integer and byte-string atoms plus
//! single-byte structural markers.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Shortest form** - Writers always pick the smallest legal atom.
//! - **Bounded decoding** - Readers never trust a length past the buffer end.
//! - **No domain knowledge** - This crate knows nothing about methods, UIDs, or sessions.
//!
//! # Example
//!
//! ```
//! use token::{decode_stream, Marker, Token, TokenWriter};
//!
//! let mut writer = TokenWriter::new();
//! writer.start_list();
//! writer.write_uint(0x65);
//! writer.write_bytes(b"msid").unwrap();
//! writer.end_list();
//!
//! let bytes = writer.finish();
//! let tokens: Vec<_> = decode_stream(&bytes).collect::<Result<_, _>>().unwrap();
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::Marker(Marker::StartList),
//!         Token::Uint(0x65),
//!         Token::Bytes(b"msid"),
//!         Token::Marker(Marker::EndList),
//!     ]
//! );
//! ```

mod atom;
mod error;
mod reader;
mod value;
mod writer;

pub use atom::{
    encode_marker, AtomHeader, AtomKind, Marker, LONG_MAX_LEN, MEDIUM_MAX_LEN, SHORT_MAX_LEN,
    TINY_MAX,
};
pub use error::{TokenError, TokenResult};
pub use reader::{decode_stream, parse_values, Token, TokenReader, DEFAULT_MAX_DEPTH};
pub use value::{encode_value, Value};
pub use writer::TokenWriter;
