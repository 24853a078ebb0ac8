//! Bounded token reader.

use std::fmt;

use crate::atom::{AtomHeader, AtomKind, Marker};
use crate::error::{TokenError, TokenResult};
use crate::value::Value;

/// Default limit on list/name nesting accepted by [`TokenReader::read_value`].
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// One decoded token, borrowing byte strings from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Integer atom (any size class), as an unsigned magnitude.
    Uint(u64),
    /// Byte-string atom.
    Bytes(&'a [u8]),
    /// Structural marker. `Empty` never appears here; the reader skips it.
    Marker(Marker),
}

impl Token<'_> {
    /// Returns the marker if this token is one.
    #[must_use]
    pub const fn marker(&self) -> Option<Marker> {
        match self {
            Self::Marker(m) => Some(*m),
            _ => None,
        }
    }

    /// Returns `true` if this token is `marker`.
    #[must_use]
    pub fn is_marker(&self, marker: Marker) -> bool {
        self.marker() == Some(marker)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::Bytes(b) => {
                f.write_str("h'")?;
                for byte in *b {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            Self::Marker(m) => write!(f, "{m}"),
        }
    }
}

/// A token reader over a borrowed buffer.
///
/// Reads are bounds-checked against the buffer and never panic. The reader
/// is `Clone`, so a stream can be restarted or peeked by cloning. After the
/// first error the reader is exhausted; as an iterator it yields that error
/// once and then `None`.
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

/// Starts a lazy decode of `data`.
#[must_use]
pub const fn decode_stream(data: &[u8]) -> TokenReader<'_> {
    TokenReader::new(data)
}

/// Reads consecutive values until the stream ends or the next token is a
/// marker that does not open a list or name. That marker is left unread.
pub fn parse_values(reader: &mut TokenReader<'_>) -> TokenResult<Vec<Value>> {
    let mut values = Vec::new();
    while let Some(token) = reader.peek()? {
        match token {
            Token::Marker(Marker::StartList | Marker::StartName)
            | Token::Uint(_)
            | Token::Bytes(_) => values.push(reader.read_value()?),
            Token::Marker(_) => break,
        }
    }
    Ok(values)
}

impl<'a> TokenReader<'a> {
    /// Creates a new `TokenReader` positioned at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the nesting limit used by [`read_value`](Self::read_value).
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns `true` if no bytes are left.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Moves back to the start of the buffer.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Decodes the next token, skipping empty atoms.
    ///
    /// Returns `Ok(None)` at the end of the buffer.
    pub fn next_token(&mut self) -> TokenResult<Option<Token<'a>>> {
        Ok(self.next_spanned()?.map(|(_, token)| token))
    }

    /// Decodes the next token without consuming it.
    pub fn peek(&self) -> TokenResult<Option<Token<'a>>> {
        self.clone().next_token()
    }

    /// Consumes the next token, which must be `marker`.
    pub fn expect_marker(&mut self, marker: Marker) -> TokenResult<()> {
        match self.next_spanned()? {
            Some((_, Token::Marker(m))) if m == marker => Ok(()),
            other => Err(self.unexpected(other, marker.name())),
        }
    }

    /// Consumes the next token if it is `marker`.
    pub fn eat_marker(&mut self, marker: Marker) -> TokenResult<bool> {
        if self.peek()?.is_some_and(|t| t.is_marker(marker)) {
            self.next_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Reads one integer atom.
    pub fn read_uint(&mut self) -> TokenResult<u64> {
        match self.next_spanned()? {
            Some((_, Token::Uint(v))) => Ok(v),
            other => Err(self.unexpected(other, "integer")),
        }
    }

    /// Reads one byte-string atom.
    pub fn read_bytes(&mut self) -> TokenResult<&'a [u8]> {
        match self.next_spanned()? {
            Some((_, Token::Bytes(b))) => Ok(b),
            other => Err(self.unexpected(other, "byte string")),
        }
    }

    /// Reads one complete value, recursing into lists and names.
    ///
    /// Every `StartList` must be closed by `EndList` and every `StartName`
    /// must hold exactly a name and a value before `EndName`.
    pub fn read_value(&mut self) -> TokenResult<Value> {
        self.read_value_at(0)
    }

    fn read_value_at(&mut self, depth: usize) -> TokenResult<Value> {
        let Some((offset, token)) = self.next_spanned()? else {
            return Err(self.fail(TokenError::UnexpectedEnd {
                offset: self.pos,
                expected: "value",
            }));
        };
        match token {
            Token::Uint(v) => Ok(Value::Uint(v)),
            Token::Bytes(b) => Ok(Value::Bytes(b.to_vec())),
            Token::Marker(Marker::StartList) => {
                self.check_depth(offset, depth)?;
                let mut items = Vec::new();
                loop {
                    match self.peek()? {
                        Some(Token::Marker(Marker::EndList)) => {
                            self.next_token()?;
                            return Ok(Value::List(items));
                        }
                        Some(_) => items.push(self.read_value_at(depth + 1)?),
                        None => {
                            return Err(self.fail(TokenError::UnexpectedEnd {
                                offset: self.pos,
                                expected: "EndList",
                            }))
                        }
                    }
                }
            }
            Token::Marker(Marker::StartName) => {
                self.check_depth(offset, depth)?;
                let name = self.read_value_at(depth + 1)?;
                let value = self.read_value_at(depth + 1)?;
                self.expect_marker(Marker::EndName)?;
                Ok(Value::Named {
                    name: Box::new(name),
                    value: Box::new(value),
                })
            }
            Token::Marker(m) => Err(self.fail(TokenError::UnexpectedMarker {
                offset,
                marker: m.name(),
            })),
        }
    }

    fn check_depth(&mut self, offset: usize, depth: usize) -> TokenResult<()> {
        if depth >= self.max_depth {
            return Err(self.fail(TokenError::NestingTooDeep {
                offset,
                max_depth: self.max_depth,
            }));
        }
        Ok(())
    }

    fn unexpected(&mut self, found: Option<(usize, Token<'a>)>, expected: &'static str) -> TokenError {
        let err = match found {
            Some((offset, Token::Marker(m))) => TokenError::UnexpectedMarker {
                offset,
                marker: m.name(),
            },
            Some((offset, _)) => TokenError::UnexpectedAtom { offset, expected },
            None => TokenError::UnexpectedEnd {
                offset: self.pos,
                expected,
            },
        };
        self.fail(err)
    }

    fn fail(&mut self, err: TokenError) -> TokenError {
        self.pos = self.data.len();
        err
    }

    fn next_spanned(&mut self) -> TokenResult<Option<(usize, Token<'a>)>> {
        loop {
            let offset = self.pos;
            let Some(&first) = self.data.get(offset) else {
                return Ok(None);
            };
            let header = match AtomHeader::parse(self.data, offset) {
                Ok(header) => header,
                Err(err) => return Err(self.fail(err)),
            };
            let Some(header) = header else {
                match Marker::parse(first) {
                    Some(Marker::Empty) => {
                        self.pos += 1;
                        continue;
                    }
                    Some(marker) => {
                        self.pos += 1;
                        return Ok(Some((offset, Token::Marker(marker))));
                    }
                    None => {
                        return Err(self.fail(TokenError::ReservedByte {
                            offset,
                            byte: first,
                        }))
                    }
                }
            };

            let available = self.remaining();
            let needed = header.total_len();
            if needed > available {
                return Err(self.fail(TokenError::Truncated {
                    offset,
                    needed,
                    available,
                }));
            }
            let payload = &self.data[offset + header.header_len..offset + needed];
            self.pos += needed;

            if header.kind == AtomKind::Tiny {
                return Ok(Some((offset, Token::Uint(u64::from(first & 0x3F)))));
            }
            if header.bytes {
                return Ok(Some((offset, Token::Bytes(payload))));
            }
            if payload.len() > 8 {
                return Err(self.fail(TokenError::IntegerTooWide {
                    offset,
                    len: payload.len(),
                }));
            }
            let value = payload
                .iter()
                .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
            return Ok(Some((offset, Token::Uint(value))));
        }
    }
}

impl<'a> Iterator for TokenReader<'a> {
    type Item = TokenResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

impl std::iter::FusedIterator for TokenReader<'_> {}
