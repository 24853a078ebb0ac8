//! Driver tying a [`SecurityTransport`] to sessions.
//!
//! [`Tper`] owns the transport, the discovered ComID and the host session
//! number counter. [`OpenSession`] borrows it for the lifetime of one
//! session and sends each request as soon as it is built, so at most one
//! exchange is ever in flight.

use token::Value;
use tracing::{debug, info, warn};
use uid::{column, LifeCycleState, Method, Object, Uid};
use wire::{parse_level0, unframe, ComId, Limits, LockingFeature, SessionIds, SscFeature};

use crate::error::{CodecError, CodecResult};
use crate::limits::{CodecLimits, HostProperties};
use crate::method::{CellBlock, MethodCall, StartSession};
use crate::response::{decode_response_with, MethodResponse, TperProperties};
use crate::session::{frame_session_manager_call, Session};
use crate::transport::SecurityTransport;

/// First host session number handed out.
pub const FIRST_HOST_SESSION_ID: u32 = 0x65;

/// A TPer reached through a transport.
#[derive(Debug)]
pub struct Tper<T> {
    transport: T,
    comid: ComId,
    limits: Limits,
    codec_limits: CodecLimits,
    ssc: Option<SscFeature>,
    locking: Option<LockingFeature>,
    next_hsn: u32,
}

impl<T: SecurityTransport> Tper<T> {
    /// Runs Level-0 discovery and selects the ComID of the preferred SSC.
    pub fn discover(mut transport: T, limits: Limits) -> CodecResult<Self> {
        let data = transport.receive(ComId::DISCOVERY, limits.discovery_size)?;
        let discovery = parse_level0(&data)?;
        let comid = discovery.require_comid()?;
        let ssc = discovery.ssc();
        let locking = discovery.locking();
        info!(
            %comid,
            ssc = ?ssc.map(|s| s.code),
            locking_enabled = locking.is_some_and(|l| l.enabled),
            "level 0 discovery"
        );
        Ok(Self {
            transport,
            comid,
            limits,
            codec_limits: CodecLimits::default(),
            ssc,
            locking,
            next_hsn: FIRST_HOST_SESSION_ID,
        })
    }

    /// Uses a known ComID without running discovery.
    pub fn with_comid(transport: T, comid: ComId, limits: Limits) -> Self {
        Self {
            transport,
            comid,
            limits,
            codec_limits: CodecLimits::default(),
            ssc: None,
            locking: None,
            next_hsn: FIRST_HOST_SESSION_ID,
        }
    }

    #[must_use]
    pub fn with_codec_limits(mut self, codec_limits: CodecLimits) -> Self {
        self.codec_limits = codec_limits;
        self
    }

    pub const fn comid(&self) -> ComId {
        self.comid
    }

    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// SSC feature found by discovery.
    pub const fn ssc(&self) -> Option<SscFeature> {
        self.ssc
    }

    /// Locking feature found by discovery.
    pub const fn locking(&self) -> Option<LockingFeature> {
        self.locking
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Exchanges communication properties with the session manager.
    pub fn properties(&mut self, host: &HostProperties) -> CodecResult<TperProperties> {
        let call = MethodCall::properties(host);
        let request = frame_session_manager_call(self.comid, &call, &self.limits)?;
        let response = self.exchange(&request)?;
        let frame = unframe(&response)?;
        let reply = decode_response_with(frame.payload, &self.codec_limits)?
            .into_method()?
            .check(Method::Properties)?;
        TperProperties::from_response(&reply)
    }

    /// Opens a read-write session to `sp`, as Anybody when `authority` is `None`.
    pub fn start_session(
        &mut self,
        sp: impl Into<Uid>,
        authority: Option<(Uid, &[u8])>,
    ) -> CodecResult<OpenSession<'_, T>> {
        let mut request = StartSession::new(self.allocate_hsn(), sp);
        if let Some((authority, challenge)) = authority {
            request = request.with_authority(authority, challenge);
        }
        self.start_session_with(&request)
    }

    /// Opens a session with explicit StartSession parameters.
    pub fn start_session_with(&mut self, request: &StartSession) -> CodecResult<OpenSession<'_, T>> {
        let mut session = Session::new(self.comid, self.limits.clone())
            .with_codec_limits(self.codec_limits.clone());
        let buf = session.start(request)?;
        self.transport.send(self.comid, &buf)?;
        let ids = self.receive_reply(|response| session.accept_start(response))?;
        debug!(sp = %request.sp, %ids, "session started");
        Ok(OpenSession {
            tper: self,
            session,
            sp: request.sp,
        })
    }

    /// Reads the MSID PIN through an unauthenticated AdminSP session.
    pub fn read_msid(&mut self) -> CodecResult<Vec<u8>> {
        self.with_session(Object::AdminSp, None, |s| {
            s.get_column(Object::CPinMsid, column::PIN)?
                .as_bytes()
                .map(<[u8]>::to_vec)
                .ok_or(CodecError::unexpected("MSID PIN is not a byte string"))
        })
    }

    /// Sets the SID PIN, authenticating with the MSID.
    pub fn take_ownership(&mut self, new_sid_pin: &[u8]) -> CodecResult<()> {
        let msid = self.read_msid()?;
        self.with_session(Object::AdminSp, Some((Object::Sid.uid(), msid.as_slice())), |s| {
            s.set(Object::CPinSid, &[(column::PIN, Value::from(new_sid_pin))])
        })
    }

    /// Reads the Locking SP life cycle as SID.
    pub fn locking_sp_lifecycle(&mut self, sid_pin: &[u8]) -> CodecResult<LifeCycleState> {
        self.with_session(Object::AdminSp, Some((Object::Sid.uid(), sid_pin)), |s| {
            s.lifecycle(Object::LockingSp)
        })
    }

    /// Activates the Locking SP as SID.
    ///
    /// Returns `false` without invoking Activate if it is already active.
    pub fn activate_locking_sp(&mut self, sid_pin: &[u8]) -> CodecResult<bool> {
        self.with_session(Object::AdminSp, Some((Object::Sid.uid(), sid_pin)), |s| {
            match s.lifecycle(Object::LockingSp)? {
                LifeCycleState::ManufacturedInactive => {
                    s.activate(Object::LockingSp)?;
                    Ok(true)
                }
                LifeCycleState::Manufactured => Ok(false),
                _ => Err(CodecError::unexpected("Locking SP life cycle does not allow Activate")),
            }
        })
    }

    /// Enables `User<n>` in the Locking SP as Admin1.
    pub fn enable_user(&mut self, admin_pin: &[u8], user: u16) -> CodecResult<()> {
        self.with_session(Object::LockingSp, Some((Uid::admin(1), admin_pin)), |s| {
            s.set(Uid::user(user), &[(column::ENABLED, Value::from(true))])
        })
    }

    /// Sets the PIN of `User<n>` in the Locking SP.
    pub fn set_user_password(
        &mut self,
        authority: Uid,
        pin: &[u8],
        user: u16,
        new_pin: &[u8],
    ) -> CodecResult<()> {
        self.with_session(Object::LockingSp, Some((authority, pin)), |s| {
            s.set(Uid::c_pin_user(user), &[(column::PIN, Value::from(new_pin))])
        })
    }

    /// Sets the read and write lock state of a locking range (0 is global).
    pub fn set_range_lock(
        &mut self,
        authority: Uid,
        pin: &[u8],
        range: u16,
        read_locked: bool,
        write_locked: bool,
    ) -> CodecResult<()> {
        self.with_session(Object::LockingSp, Some((authority, pin)), |s| {
            s.set(
                Uid::locking_range(range),
                &[
                    (column::READ_LOCKED, Value::from(read_locked)),
                    (column::WRITE_LOCKED, Value::from(write_locked)),
                ],
            )
        })
    }

    /// Reverts the whole TPer to factory state as SID.
    pub fn revert_tper(&mut self, sid_pin: &[u8]) -> CodecResult<()> {
        self.with_session(Object::AdminSp, Some((Object::Sid.uid(), sid_pin)), |s| {
            s.revert(Object::AdminSp)
        })
    }

    /// Runs `f` inside a session and always ends it afterwards.
    ///
    /// An error from `f` takes precedence over an error from ending.
    pub fn with_session<R>(
        &mut self,
        sp: impl Into<Uid>,
        authority: Option<(Uid, &[u8])>,
        f: impl FnOnce(&mut OpenSession<'_, T>) -> CodecResult<R>,
    ) -> CodecResult<R> {
        let mut session = self.start_session(sp, authority)?;
        let result = f(&mut session);
        let ended = session.end();
        let value = result?;
        ended?;
        Ok(value)
    }

    fn allocate_hsn(&mut self) -> u32 {
        let hsn = self.next_hsn;
        self.next_hsn = self.next_hsn.checked_add(1).unwrap_or(FIRST_HOST_SESSION_ID);
        hsn
    }

    fn exchange(&mut self, request: &[u8]) -> CodecResult<Vec<u8>> {
        self.transport.send(self.comid, request)?;
        Ok(self.transport.receive(self.comid, self.limits.transfer_size)?)
    }

    /// Receives until `accept` gets a reply the TPer has finished, giving up
    /// after `max_receive_polls` extra receives.
    fn receive_reply<R>(
        &mut self,
        mut accept: impl FnMut(&[u8]) -> CodecResult<R>,
    ) -> CodecResult<R> {
        let mut polls = 0;
        loop {
            let response = self.transport.receive(self.comid, self.limits.transfer_size)?;
            match accept(&response) {
                Err(err) if err.is_not_ready() && polls < self.codec_limits.max_receive_polls => {
                    polls += 1;
                    debug!(comid = %self.comid, polls, "TPer not ready, receiving again");
                }
                result => return result,
            }
        }
    }
}

/// An active session borrowed from a [`Tper`].
///
/// Dropping it without [`end`](Self::end) leaves the session open on the
/// TPer until it times out.
pub struct OpenSession<'t, T: SecurityTransport> {
    tper: &'t mut Tper<T>,
    session: Session,
    sp: Uid,
}

impl<T: SecurityTransport> OpenSession<'_, T> {
    /// The SP this session is open to.
    pub const fn sp(&self) -> Uid {
        self.sp
    }

    pub const fn ids(&self) -> Option<SessionIds> {
        self.session.ids()
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Sends one call and waits for its response.
    ///
    /// Long-running methods are bracketed by the transport's extended timeout.
    pub fn invoke(&mut self, call: &MethodCall) -> CodecResult<MethodResponse> {
        let request = self.session.call(call)?;
        let long_running = call.method.is_long_running();
        if long_running {
            self.tper.transport.set_extended_timeout(true);
        }
        let result = self
            .tper
            .transport
            .send(self.tper.comid, &request)
            .map_err(CodecError::from)
            .and_then(|()| {
                let session = &mut self.session;
                self.tper.receive_reply(|response| session.accept(response))
            });
        if long_running {
            self.tper.transport.set_extended_timeout(false);
        }
        result
    }

    /// Receives the reply still owed for the last call, after `invoke`
    /// gave up on a TPer that was not ready.
    pub fn receive_pending(&mut self) -> CodecResult<MethodResponse> {
        if !self.session.awaiting_response() {
            return Err(CodecError::NoExchangeOutstanding);
        }
        let session = &mut self.session;
        self.tper.receive_reply(|response| session.accept(response))
    }

    pub fn get(&mut self, object: impl Into<Uid>, cells: CellBlock) -> CodecResult<MethodResponse> {
        self.invoke(&MethodCall::get(object, cells))
    }

    /// Gets a single column of `object`.
    pub fn get_column(&mut self, object: impl Into<Uid>, column: u64) -> CodecResult<Value> {
        let response = self.get(object, CellBlock::column(column))?;
        response
            .column(column)
            .cloned()
            .ok_or(CodecError::unexpected("column missing from Get result"))
    }

    pub fn set(&mut self, object: impl Into<Uid>, values: &[(u64, Value)]) -> CodecResult<()> {
        self.invoke(&MethodCall::set(object, values)).map(drop)
    }

    /// Authenticates an additional authority. Returns the TPer's verdict.
    pub fn authenticate(&mut self, authority: impl Into<Uid>, proof: &[u8]) -> CodecResult<bool> {
        let response = self.invoke(&MethodCall::authenticate(authority, proof))?;
        response
            .results
            .first()
            .and_then(Value::as_bool)
            .ok_or(CodecError::unexpected("Authenticate result is not a boolean"))
    }

    pub fn activate(&mut self, sp: impl Into<Uid>) -> CodecResult<()> {
        self.invoke(&MethodCall::activate(sp)).map(drop)
    }

    /// Reverts `sp`. Reverting the SP this session is open to ends the
    /// session on the TPer side.
    pub fn revert(&mut self, sp: impl Into<Uid>) -> CodecResult<()> {
        let sp = sp.into();
        self.invoke(&MethodCall::revert(sp))?;
        if sp == self.sp {
            self.session.close_local();
        }
        Ok(())
    }

    /// Reverts the SP this session is open to, which ends the session.
    pub fn revert_sp(&mut self, keep_global_range_key: bool) -> CodecResult<()> {
        self.invoke(&MethodCall::revert_sp(keep_global_range_key))?;
        self.session.close_local();
        Ok(())
    }

    pub fn gen_key(&mut self, object: impl Into<Uid>) -> CodecResult<()> {
        self.invoke(&MethodCall::gen_key(object)).map(drop)
    }

    /// Returns the ACEs controlling `method` on `invoking`.
    pub fn get_acl(&mut self, invoking: impl Into<Uid>, method: Method) -> CodecResult<Vec<Uid>> {
        Ok(self.invoke(&MethodCall::get_acl(invoking, method))?.uid_list())
    }

    pub fn random(&mut self, count: u32) -> CodecResult<Vec<u8>> {
        let response = self.invoke(&MethodCall::random(count))?;
        response
            .bytes_result()
            .map(<[u8]>::to_vec)
            .ok_or(CodecError::unexpected("Random result is not a byte string"))
    }

    /// Lists row UIDs of `table` after `from`.
    pub fn next(
        &mut self,
        table: impl Into<Uid>,
        from: Option<Uid>,
        count: Option<u32>,
    ) -> CodecResult<Vec<Uid>> {
        Ok(self.invoke(&MethodCall::next(table, from, count))?.uid_list())
    }

    /// Reads the `LifeCycle` column of an SP.
    pub fn lifecycle(&mut self, sp: impl Into<Uid>) -> CodecResult<LifeCycleState> {
        self.get_column(sp, column::LIFECYCLE)?
            .as_uint()
            .and_then(LifeCycleState::from_u64)
            .ok_or(CodecError::unexpected("unknown SP life cycle"))
    }

    /// Ends the session and drains the TPer's reply.
    ///
    /// A session the TPer already closed ends without an exchange.
    /// A reply still owed for an earlier call is drained first.
    pub fn end(mut self) -> CodecResult<()> {
        if self.session.awaiting_response() {
            match self.receive_pending() {
                Err(err) if self.session.awaiting_response() => return Err(err),
                _ => {}
            }
        }
        if !self.session.is_active() {
            return Ok(());
        }
        let request = self.session.end()?;
        self.tper.transport.send(self.tper.comid, &request)?;
        let session = &mut self.session;
        self.tper.receive_reply(|response| session.accept_end(response))
    }
}

impl<T: SecurityTransport> Drop for OpenSession<'_, T> {
    fn drop(&mut self) {
        if let Some(ids) = self.session.ids() {
            warn!(sp = %self.sp, %ids, "session dropped without EndSession");
        }
    }
}
