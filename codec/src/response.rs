//! Decoding of method responses.

use token::{Marker, Token, TokenReader, Value};
use uid::{Method, Object, Uid};
use wire::SessionIds;

use crate::error::{CodecError, CodecResult};
use crate::limits::CodecLimits;
use crate::status::MethodStatus;

/// A decoded response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Method(MethodResponse),
    /// A bare `EndOfSession` token: the peer closed the session.
    EndOfSession,
}

/// Results and status of one method invocation.
///
/// Session-manager replies (SyncSession, CloseSession, Properties) arrive as
/// a call from the TPer and carry the invoking and method UIDs in `call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    pub call: Option<(Uid, Uid)>,
    pub results: Vec<Value>,
    pub status: MethodStatus,
}

/// Decodes a response payload with the default limits.
pub fn decode_response(payload: &[u8]) -> CodecResult<Reply> {
    decode_response_with(payload, &CodecLimits::default())
}

/// Decodes a response payload.
///
/// Anything after the status list is ignored.
pub fn decode_response_with(payload: &[u8], limits: &CodecLimits) -> CodecResult<Reply> {
    let mut reader = TokenReader::new(payload).with_max_depth(limits.max_token_depth);

    if reader.eat_marker(Marker::EndOfSession)? {
        return Ok(Reply::EndOfSession);
    }

    let call = if reader.eat_marker(Marker::Call)? {
        let invoking = read_uid(&mut reader)?;
        let method = read_uid(&mut reader)?;
        Some((invoking, method))
    } else {
        None
    };

    reader.expect_marker(Marker::StartList)?;
    let mut results = Vec::new();
    while !reader.eat_marker(Marker::EndList)? {
        if results.len() >= limits.max_results {
            return Err(CodecError::unexpected("too many results"));
        }
        results.push(reader.read_value()?);
    }

    reader.expect_marker(Marker::EndOfData)?;
    let status = read_status_list(&mut reader)?;

    Ok(Reply::Method(MethodResponse {
        call,
        results,
        status,
    }))
}

fn read_uid(reader: &mut TokenReader<'_>) -> CodecResult<Uid> {
    let bytes = reader.read_bytes()?;
    Uid::from_slice(bytes).ok_or(CodecError::unexpected("UID atom is not 8 bytes"))
}

fn read_status_list(reader: &mut TokenReader<'_>) -> CodecResult<MethodStatus> {
    reader.expect_marker(Marker::StartList)?;
    let raw = reader.read_uint()?;
    let status = u8::try_from(raw).map_err(|_| CodecError::unexpected("status code out of range"))?;
    // Two reserved fields follow; tolerate any count.
    while let Some(token) = reader.next_token()? {
        match token {
            Token::Marker(Marker::EndList) => return Ok(MethodStatus::new(status)),
            Token::Uint(_) => {}
            _ => return Err(CodecError::unexpected("malformed status list")),
        }
    }
    Err(CodecError::unexpected("unterminated status list"))
}

impl Reply {
    /// Returns the method response, or `ClosedByTper` for a bare EndOfSession.
    pub fn into_method(self) -> CodecResult<MethodResponse> {
        match self {
            Self::Method(response) => Ok(response),
            Self::EndOfSession => Err(CodecError::ClosedByTper),
        }
    }
}

impl MethodResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns `self` on success, otherwise a status error naming `method`.
    pub fn check(self, method: Method) -> CodecResult<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(CodecError::MethodStatus {
                method,
                status: self.status,
            })
        }
    }

    /// Returns `true` if this is the session manager invoking `method`.
    #[must_use]
    pub fn is_session_manager_call(&self, method: Method) -> bool {
        self.call == Some((Object::SessionManager.uid(), method.uid()))
    }

    /// Extracts the host and TPer session numbers from a SyncSession reply.
    #[must_use]
    pub fn sync_session_ids(&self) -> Option<SessionIds> {
        if !self.is_session_manager_call(Method::SyncSession) {
            return None;
        }
        let hsn = u32::try_from(self.results.first()?.as_uint()?).ok()?;
        let tsn = u32::try_from(self.results.get(1)?.as_uint()?).ok()?;
        Some(SessionIds::new(hsn, tsn))
    }

    /// Iterates the `(column, value)` pairs of a Get result.
    ///
    /// A Get answers with one list of named cells; pairs whose name is not an
    /// integer are skipped.
    pub fn columns(&self) -> impl Iterator<Item = (u64, &Value)> {
        self.results
            .first()
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|cell| {
                let (name, value) = cell.as_named()?;
                Some((name.as_uint()?, value))
            })
    }

    /// Returns the value of one column from a Get result.
    #[must_use]
    pub fn column(&self, column: u64) -> Option<&Value> {
        self.columns().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    /// Returns the first result as a byte string.
    #[must_use]
    pub fn bytes_result(&self) -> Option<&[u8]> {
        match self.results.first()? {
            Value::List(items) => items.first()?.as_bytes(),
            value => value.as_bytes(),
        }
    }

    /// Returns the first result as a list of UIDs, as answered by Next and GetACL.
    #[must_use]
    pub fn uid_list(&self) -> Vec<Uid> {
        self.results
            .first()
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_bytes().and_then(Uid::from_slice))
            .collect()
    }
}

/// Properties returned by the TPer in reply to Properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TperProperties {
    /// The TPer's own properties.
    pub tper: Vec<(String, u64)>,
    /// The host properties the TPer accepted.
    pub host: Vec<(String, u64)>,
}

impl TperProperties {
    /// Reads the two property lists out of a Properties reply.
    pub fn from_response(response: &MethodResponse) -> CodecResult<Self> {
        if !response.is_session_manager_call(Method::Properties) {
            return Err(CodecError::unexpected("not a Properties reply"));
        }
        let mut props = Self::default();
        for result in &response.results {
            match result {
                Value::List(items) => props.tper = property_pairs(items),
                Value::Named { value, .. } => {
                    if let Some(items) = value.as_list() {
                        props.host = property_pairs(items);
                    }
                }
                _ => {}
            }
        }
        Ok(props)
    }

    /// Looks up one of the TPer's properties by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.tper.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

fn property_pairs(items: &[Value]) -> Vec<(String, u64)> {
    items
        .iter()
        .filter_map(|item| {
            let (name, value) = item.as_named()?;
            let name = String::from_utf8_lossy(name.as_bytes()?).into_owned();
            Some((name, value.as_uint()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use token::TokenWriter;
    use uid::column;

    fn status_tail(writer: &mut TokenWriter, status: u64) {
        writer.write_marker(Marker::EndOfData);
        writer.start_list();
        writer.write_uint(status);
        writer.write_uint(0);
        writer.write_uint(0);
        writer.end_list();
    }

    fn get_pin_reply(pin: &[u8]) -> Vec<u8> {
        let mut w = TokenWriter::new();
        w.start_list();
        w.start_list();
        w.start_name();
        w.write_uint(column::PIN);
        w.write_bytes(pin).unwrap();
        w.end_name();
        w.end_list();
        w.end_list();
        status_tail(&mut w, 0);
        w.finish()
    }

    #[test]
    fn decode_get_reply() {
        let reply = decode_response(&get_pin_reply(b"MSID0001")).unwrap();
        let Reply::Method(response) = reply else {
            panic!("expected method reply");
        };
        assert!(response.is_success());
        assert_eq!(response.call, None);
        assert_eq!(
            response.column(column::PIN).and_then(Value::as_bytes),
            Some(&b"MSID0001"[..])
        );
        assert_eq!(response.columns().count(), 1);
    }

    #[test]
    fn decode_sync_session() {
        let mut w = TokenWriter::new();
        w.write_marker(Marker::Call);
        w.write_bytes(Object::SessionManager.uid().as_bytes()).unwrap();
        w.write_bytes(Method::SyncSession.uid().as_bytes()).unwrap();
        w.start_list();
        w.write_uint(0x65);
        w.write_uint(0x1001);
        w.end_list();
        status_tail(&mut w, 0);

        let response = decode_response(&w.finish()).unwrap().into_method().unwrap();
        assert_eq!(response.sync_session_ids(), Some(SessionIds::new(0x65, 0x1001)));
    }

    #[test]
    fn decode_failure_status() {
        let mut w = TokenWriter::new();
        w.start_list();
        w.end_list();
        status_tail(&mut w, 0x01);

        let response = decode_response(&w.finish()).unwrap().into_method().unwrap();
        assert_eq!(response.status, MethodStatus::NOT_AUTHORIZED);
        let err = response.check(Method::Set).unwrap_err();
        assert_eq!(err.status(), Some(MethodStatus::NOT_AUTHORIZED));
    }

    #[test]
    fn decode_bare_end_of_session() {
        assert_eq!(decode_response(&[0xFA]).unwrap(), Reply::EndOfSession);
        assert!(matches!(
            Reply::EndOfSession.into_method(),
            Err(CodecError::ClosedByTper)
        ));
    }

    #[test]
    fn missing_status_list_is_an_error() {
        let payload = [0xF0, 0xF1, 0xF9];
        assert!(matches!(
            decode_response(&payload),
            Err(CodecError::MalformedToken(_))
        ));
    }

    #[test]
    fn status_out_of_range_is_rejected() {
        let payload = [0xF0, 0xF1, 0xF9, 0xF0, 0x82, 0x01, 0x00, 0x00, 0x00, 0xF1];
        assert!(matches!(
            decode_response(&payload),
            Err(CodecError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn result_count_is_limited() {
        let mut w = TokenWriter::new();
        w.start_list();
        for i in 0..65 {
            w.write_uint(i);
        }
        w.end_list();
        status_tail(&mut w, 0);
        let err = decode_response_with(&w.finish(), &CodecLimits::for_testing()).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedResponse { .. }));
    }

    #[test]
    fn random_bytes_result() {
        let mut w = TokenWriter::new();
        w.start_list();
        w.write_bytes(&[7; 16]).unwrap();
        w.end_list();
        status_tail(&mut w, 0);
        let response = decode_response(&w.finish()).unwrap().into_method().unwrap();
        assert_eq!(response.bytes_result(), Some(&[7u8; 16][..]));
    }

    #[test]
    fn properties_reply() {
        let mut w = TokenWriter::new();
        w.write_marker(Marker::Call);
        w.write_bytes(Object::SessionManager.uid().as_bytes()).unwrap();
        w.write_bytes(Method::Properties.uid().as_bytes()).unwrap();
        w.start_list();
        w.start_list();
        w.start_name();
        w.write_bytes(b"MaxComPacketSize").unwrap();
        w.write_uint(65536);
        w.end_name();
        w.end_list();
        w.start_name();
        w.write_uint(0);
        w.start_list();
        w.start_name();
        w.write_bytes(b"MaxPacketSize").unwrap();
        w.write_uint(4076);
        w.end_name();
        w.end_list();
        w.end_name();
        w.end_list();
        status_tail(&mut w, 0);

        let response = decode_response(&w.finish()).unwrap().into_method().unwrap();
        let props = TperProperties::from_response(&response).unwrap();
        assert_eq!(props.get("MaxComPacketSize"), Some(65536));
        assert_eq!(props.host, vec![("MaxPacketSize".to_string(), 4076)]);
    }
}
