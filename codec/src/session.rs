//! Session state machine.
//!
//! A [`Session`] turns method calls into framed buffers and framed buffers
//! back into responses. It performs no I/O: every request it produces must be
//! sent by the caller and the matching response handed back before the next
//! request is issued.
//!
//! ```text
//! Unauthenticated --start--> SessionPending --accept_start--> Active(ids)
//!                                  |                           |  ^
//!                                  | failure                   |  | call/accept
//!                                  v                           v  |
//!                                Closed <--------end---------- +--+
//! ```

use tracing::{debug, error, info, trace, warn, Level};
use uid::Method;
use wire::{frame, unframe, ComId, Limits, SessionIds};

use crate::error::{CodecError, CodecResult};
use crate::limits::CodecLimits;
use crate::method::{MethodCall, Request, StartSession};
use crate::response::{decode_response_with, MethodResponse, Reply};
use crate::status::MethodStatus;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No StartSession has been issued.
    Unauthenticated,
    /// StartSession was issued; the SyncSession reply is owed.
    SessionPending,
    /// The TPer assigned session numbers; method calls are allowed.
    Active(SessionIds),
    /// Ended by either side. Terminal.
    Closed,
}

impl SessionState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::SessionPending => "pending",
            Self::Active(_) => "active",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outstanding {
    Start { hsn: u32 },
    Call { method: Method },
    End,
}

/// One session with one SP of a TPer.
#[derive(Debug, Clone)]
pub struct Session {
    comid: ComId,
    limits: Limits,
    codec_limits: CodecLimits,
    state: SessionState,
    outstanding: Option<Outstanding>,
}

impl Session {
    #[must_use]
    pub fn new(comid: ComId, limits: Limits) -> Self {
        Self {
            comid,
            limits,
            codec_limits: CodecLimits::default(),
            state: SessionState::Unauthenticated,
            outstanding: None,
        }
    }

    #[must_use]
    pub fn with_codec_limits(mut self, codec_limits: CodecLimits) -> Self {
        self.codec_limits = codec_limits;
        self
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn comid(&self) -> ComId {
        self.comid
    }

    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Session numbers, while active.
    #[must_use]
    pub const fn ids(&self) -> Option<SessionIds> {
        match self.state {
            SessionState::Active(ids) => Some(ids),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Returns `true` while a response to the last request is owed.
    #[must_use]
    pub const fn awaiting_response(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Builds the StartSession request.
    pub fn start(&mut self, request: &StartSession) -> CodecResult<Vec<u8>> {
        self.ensure_idle()?;
        if self.state != SessionState::Unauthenticated {
            return Err(self.invalid("start a session"));
        }
        let payload = MethodCall::start_session(request).encode()?;
        let buf = frame(self.comid, SessionIds::NONE, &payload, &self.limits)?;
        self.outstanding = Some(Outstanding::Start {
            hsn: request.host_session_id,
        });
        self.transition(SessionState::SessionPending);
        Ok(buf)
    }

    /// Consumes the SyncSession reply to StartSession.
    ///
    /// On success the session becomes active. A failure status, a malformed
    /// reply, or a reply for another host session closes it. A reply the TPer
    /// has not finished yet leaves the session pending.
    pub fn accept_start(&mut self, response: &[u8]) -> CodecResult<SessionIds> {
        let Some(Outstanding::Start { hsn }) = self.outstanding else {
            return Err(CodecError::NoExchangeOutstanding);
        };
        match self.read_sync_session(response, hsn) {
            Ok(ids) => {
                self.outstanding = None;
                self.transition(SessionState::Active(ids));
                Ok(ids)
            }
            Err(err) if err.is_not_ready() => Err(err),
            Err(err) => {
                self.outstanding = None;
                self.transition(SessionState::Closed);
                Err(err)
            }
        }
    }

    /// Builds a method call request inside the active session.
    pub fn call(&mut self, call: &MethodCall) -> CodecResult<Vec<u8>> {
        let ids = self.ids().ok_or(CodecError::SessionNotEstablished)?;
        self.ensure_idle()?;
        let payload = call.encode()?;
        let buf = frame(self.comid, ids, &payload, &self.limits)?;
        trace!(method = %call.method, invoking = %call.invoking, "method call");
        self.outstanding = Some(Outstanding::Call {
            method: call.method,
        });
        Ok(buf)
    }

    /// Consumes the response to the last method call.
    ///
    /// Non-success statuses are returned as [`CodecError::MethodStatus`] and
    /// leave the session active. An `EndOfSession` or `CloseSession` from the
    /// TPer closes the session and returns [`CodecError::ClosedByTper`].
    pub fn accept(&mut self, response: &[u8]) -> CodecResult<MethodResponse> {
        let Some(Outstanding::Call { method }) = self.outstanding else {
            return Err(CodecError::NoExchangeOutstanding);
        };
        let ids = self.ids().ok_or(CodecError::SessionNotEstablished)?;
        let result = self.read_method_response(response, ids, method);
        match &result {
            Err(err) if err.is_not_ready() => {}
            Err(CodecError::ClosedByTper) => {
                self.outstanding = None;
                self.transition(SessionState::Closed);
            }
            _ => self.outstanding = None,
        }
        result
    }

    /// Builds the EndSession request. The session is closed from here on,
    /// but the TPer's `EndOfSession` reply is still owed to
    /// [`accept_end`](Self::accept_end).
    pub fn end(&mut self) -> CodecResult<Vec<u8>> {
        let ids = self.ids().ok_or(CodecError::SessionNotEstablished)?;
        self.ensure_idle()?;
        let payload = Request::EndSession.encode()?;
        let buf = frame(self.comid, ids, &payload, &self.limits)?;
        self.outstanding = Some(Outstanding::End);
        self.transition(SessionState::Closed);
        Ok(buf)
    }

    /// Drains the TPer's reply to EndSession.
    pub fn accept_end(&mut self, response: &[u8]) -> CodecResult<()> {
        if self.outstanding != Some(Outstanding::End) {
            return Err(CodecError::NoExchangeOutstanding);
        }
        let result = unframe(response)
            .map_err(CodecError::from)
            .and_then(|frame| decode_response_with(frame.payload, &self.codec_limits))
            .and_then(|reply| match reply {
                Reply::EndOfSession => Ok(()),
                Reply::Method(_) => Err(CodecError::unexpected("expected EndOfSession")),
            });
        if !matches!(&result, Err(err) if err.is_not_ready()) {
            self.outstanding = None;
        }
        result
    }

    /// Closes the session without an EndSession exchange, for when the TPer
    /// has already torn it down (for example after reverting the SP).
    pub fn close_local(&mut self) {
        self.outstanding = None;
        self.transition(SessionState::Closed);
    }

    fn read_sync_session(&self, response: &[u8], hsn: u32) -> CodecResult<SessionIds> {
        let frame = unframe(response)?;
        let reply = decode_response_with(frame.payload, &self.codec_limits)?.into_method()?;
        log_status(Method::StartSession, reply.status);
        let reply = reply.check(Method::StartSession)?;
        let ids = reply
            .sync_session_ids()
            .ok_or(CodecError::unexpected("StartSession reply is not SyncSession"))?;
        if ids.hsn != hsn {
            return Err(CodecError::SessionMismatch {
                expected: SessionIds::new(hsn, ids.tsn),
                found: ids,
            });
        }
        Ok(ids)
    }

    fn read_method_response(
        &self,
        response: &[u8],
        ids: SessionIds,
        method: Method,
    ) -> CodecResult<MethodResponse> {
        let frame = unframe(response)?;
        if frame.ids() != ids {
            return Err(CodecError::SessionMismatch {
                expected: ids,
                found: frame.ids(),
            });
        }
        let reply = decode_response_with(frame.payload, &self.codec_limits)?.into_method()?;
        if reply.is_session_manager_call(Method::CloseSession) {
            return Err(CodecError::ClosedByTper);
        }
        log_status(method, reply.status);
        reply.check(method)
    }

    fn ensure_idle(&self) -> CodecResult<()> {
        if self.outstanding.is_some() {
            return Err(CodecError::ExchangeOutstanding);
        }
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> CodecError {
        CodecError::InvalidTransition {
            state: self.state.name(),
            operation,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            comid = %self.comid,
            from = self.state.name(),
            to = next.name(),
            "session transition"
        );
        self.state = next;
    }
}

fn log_status(method: Method, status: MethodStatus) {
    let level = status.tracing_level();
    if level == Level::ERROR {
        error!(%method, %status, "method failed");
    } else if level == Level::WARN {
        warn!(%method, %status, "method failed");
    } else if level == Level::INFO {
        info!(%method, %status, "method failed");
    } else if level == Level::DEBUG {
        debug!(%method, %status, "method failed");
    } else {
        trace!(%method, %status, "method completed");
    }
}

/// Frames a session-manager call that is sent outside any session, such as
/// Properties.
pub fn frame_session_manager_call(
    comid: ComId,
    call: &MethodCall,
    limits: &Limits,
) -> CodecResult<Vec<u8>> {
    let payload = call.encode()?;
    Ok(frame(comid, SessionIds::NONE, &payload, limits)?)
}
