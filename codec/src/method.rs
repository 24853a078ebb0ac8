//! Method invocations and their token encoding.
//!
//! A method call is `Call, invoking UID, method UID, [params], EndOfData,
//! [0, 0, 0]`. The builders here fill in the parameters for the methods the
//! host side of Opal uses.

use token::{Marker, TokenWriter, Value};
use uid::{cell, param, Method, Object, Uid};

use crate::error::CodecResult;
use crate::limits::HostProperties;

/// One method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub invoking: Uid,
    pub method: Method,
    pub params: Vec<Value>,
}

impl MethodCall {
    /// Creates a call with no parameters.
    #[must_use]
    pub fn new(invoking: impl Into<Uid>, method: Method) -> Self {
        Self {
            invoking: invoking.into(),
            method,
            params: Vec::new(),
        }
    }

    /// Appends a positional parameter.
    #[must_use]
    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Appends a named parameter.
    #[must_use]
    pub fn named(mut self, name: u64, value: impl Into<Value>) -> Self {
        self.params.push(Value::named(name, value));
        self
    }

    /// Encodes the call as a standalone token payload.
    ///
    /// Encoding is pure: the same call always produces the same bytes.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut writer = TokenWriter::with_capacity(64);
        self.encode_into(&mut writer)?;
        Ok(writer.finish())
    }

    /// Appends the call to `writer`.
    pub fn encode_into(&self, writer: &mut TokenWriter) -> CodecResult<()> {
        writer.write_marker(Marker::Call);
        writer.write_bytes(self.invoking.as_bytes())?;
        writer.write_bytes(self.method.uid().as_bytes())?;
        writer.start_list();
        for param in &self.params {
            writer.write_value(param)?;
        }
        writer.end_list();
        writer.write_marker(Marker::EndOfData);
        // Status list expected from the host: all zeros.
        writer.start_list();
        writer.write_uint(0);
        writer.write_uint(0);
        writer.write_uint(0);
        writer.end_list();
        Ok(())
    }

    /// `SMUID.Properties` announcing the host's communication properties.
    #[must_use]
    pub fn properties(host: &HostProperties) -> Self {
        Self::new(Object::SessionManager, Method::Properties)
            .named(param::HOST_PROPERTIES, host.to_value())
    }

    /// `SMUID.StartSession`.
    #[must_use]
    pub fn start_session(request: &StartSession) -> Self {
        let mut call = Self::new(Object::SessionManager, Method::StartSession)
            .param(request.host_session_id)
            .param(request.sp)
            .param(request.write);
        if let Some(challenge) = &request.host_challenge {
            call = call.named(param::HOST_CHALLENGE, challenge.clone());
        }
        if let Some(authority) = request.signing_authority {
            call = call.named(param::HOST_SIGNING_AUTHORITY, authority);
        }
        call
    }

    /// `object.Get` for the cells selected by `cells`.
    #[must_use]
    pub fn get(object: impl Into<Uid>, cells: CellBlock) -> Self {
        Self::new(object, Method::Get).param(cells.to_value())
    }

    /// `object.Set` of `(column, value)` pairs.
    #[must_use]
    pub fn set(object: impl Into<Uid>, values: &[(u64, Value)]) -> Self {
        let row = values
            .iter()
            .map(|(column, value)| Value::named(*column, value.clone()));
        Self::new(object, Method::Set).named(param::VALUES, Value::list(row))
    }

    /// `ThisSP.Authenticate` as `authority` with `proof`.
    #[must_use]
    pub fn authenticate(authority: impl Into<Uid>, proof: &[u8]) -> Self {
        Self::new(Object::ThisSp, Method::Authenticate)
            .param(authority.into())
            .named(param::PROOF, proof)
    }

    /// `sp.Activate`.
    #[must_use]
    pub fn activate(sp: impl Into<Uid>) -> Self {
        Self::new(sp, Method::Activate)
    }

    /// `sp.Revert`, returning the SP to its factory state.
    #[must_use]
    pub fn revert(sp: impl Into<Uid>) -> Self {
        Self::new(sp, Method::Revert)
    }

    /// `ThisSP.RevertSP`.
    #[must_use]
    pub fn revert_sp(keep_global_range_key: bool) -> Self {
        Self::new(Object::ThisSp, Method::RevertSp)
            .named(param::KEEP_GLOBAL_RANGE_KEY, keep_global_range_key)
    }

    /// `object.GenKey`, regenerating a media encryption key.
    #[must_use]
    pub fn gen_key(object: impl Into<Uid>) -> Self {
        Self::new(object, Method::GenKey)
    }

    /// `AccessControl.GetACL` for `method` invoked on `invoking`.
    #[must_use]
    pub fn get_acl(invoking: impl Into<Uid>, method: Method) -> Self {
        Self::new(Object::AccessControlTable, Method::GetAcl)
            .param(invoking.into())
            .param(method.uid())
    }

    /// `ThisSP.Random` for `count` bytes.
    #[must_use]
    pub fn random(count: u32) -> Self {
        Self::new(Object::ThisSp, Method::Random).param(count)
    }

    /// `table.Next`, listing row UIDs after `from`.
    #[must_use]
    pub fn next(table: impl Into<Uid>, from: Option<Uid>, count: Option<u32>) -> Self {
        let mut call = Self::new(table, Method::Next);
        if let Some(from) = from {
            call = call.named(0, from);
        }
        if let Some(count) = count {
            call = call.named(1, count);
        }
        call
    }
}

/// Parameters of a StartSession call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSession {
    pub host_session_id: u32,
    pub sp: Uid,
    pub write: bool,
    pub host_challenge: Option<Vec<u8>>,
    pub signing_authority: Option<Uid>,
}

impl StartSession {
    /// A read-write session as Anybody.
    #[must_use]
    pub fn new(host_session_id: u32, sp: impl Into<Uid>) -> Self {
        Self {
            host_session_id,
            sp: sp.into(),
            write: true,
            host_challenge: None,
            signing_authority: None,
        }
    }

    /// Authenticates as `authority` with `challenge` while opening.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<Uid>, challenge: &[u8]) -> Self {
        self.signing_authority = Some(authority.into());
        self.host_challenge = Some(challenge.to_vec());
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.write = false;
        self
    }
}

/// Cell selection for Get.
///
/// Unset bounds are omitted, which selects the whole row or column range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellBlock {
    pub start_row: Option<u64>,
    pub end_row: Option<u64>,
    pub start_column: Option<u64>,
    pub end_column: Option<u64>,
}

impl CellBlock {
    /// Every column of the row.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start_row: None,
            end_row: None,
            start_column: None,
            end_column: None,
        }
    }

    /// One column.
    #[must_use]
    pub const fn column(column: u64) -> Self {
        Self::columns(column, column)
    }

    /// Columns `start..=end`.
    #[must_use]
    pub const fn columns(start: u64, end: u64) -> Self {
        Self {
            start_row: None,
            end_row: None,
            start_column: Some(start),
            end_column: Some(end),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let bounds = [
            (cell::START_ROW, self.start_row),
            (cell::END_ROW, self.end_row),
            (cell::START_COLUMN, self.start_column),
            (cell::END_COLUMN, self.end_column),
        ];
        Value::List(
            bounds
                .into_iter()
                .filter_map(|(name, bound)| bound.map(|b| Value::named(name, b)))
                .collect(),
        )
    }
}

/// A request sent inside an established session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Method(MethodCall),
    /// Ends the session; encodes as the single `EndOfSession` token.
    EndSession,
}

impl Request {
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        match self {
            Self::Method(call) => call.encode(),
            Self::EndSession => {
                let mut writer = TokenWriter::new();
                writer.write_marker(Marker::EndOfSession);
                Ok(writer.finish())
            }
        }
    }
}

impl From<MethodCall> for Request {
    fn from(call: MethodCall) -> Self {
        Self::Method(call)
    }
}
