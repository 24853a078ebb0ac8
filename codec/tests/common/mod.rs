#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use codec::{decode_response, MethodResponse, Reply, SecurityTransport, TransportError};
use token::{Marker, TokenWriter, Value};
use uid::{column, LifeCycleState, Method, Object, Uid};
use wire::{frame, unframe, ComId, Limits, SessionIds};

pub const COMID: ComId = ComId::new(0x07FE);
pub const MSID: &[u8] = b"MSIDMSIDMSIDMSID";

/// Builds a method result payload: `[results] EndOfData [status 0 0]`.
pub fn result_payload(status: u8, results: &[Value]) -> Vec<u8> {
    let mut w = TokenWriter::new();
    w.start_list();
    for value in results {
        w.write_value(value).unwrap();
    }
    w.end_list();
    status_tail(&mut w, status);
    w.finish()
}

/// Builds a session-manager call payload, as the TPer sends for SyncSession.
pub fn session_manager_payload(method: Method, status: u8, results: &[Value]) -> Vec<u8> {
    let mut w = TokenWriter::new();
    w.write_marker(Marker::Call);
    w.write_bytes(Object::SessionManager.uid().as_bytes()).unwrap();
    w.write_bytes(method.uid().as_bytes()).unwrap();
    w.start_list();
    for value in results {
        w.write_value(value).unwrap();
    }
    w.end_list();
    status_tail(&mut w, status);
    w.finish()
}

fn status_tail(w: &mut TokenWriter, status: u8) {
    w.write_marker(Marker::EndOfData);
    w.start_list();
    w.write_uint(u64::from(status));
    w.write_uint(0);
    w.write_uint(0);
    w.end_list();
}

pub fn framed(ids: SessionIds, payload: &[u8]) -> Vec<u8> {
    frame(COMID, ids, payload, &Limits::default()).unwrap()
}

/// Level-0 response with a TPer, a Locking and an Opal 2 descriptor.
pub fn level0(comid: u16, locking_bits: u8) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0x00, 0x01, 0x10, 0x0C, 0x11]);
    body.resize(body.len() + 11, 0);
    body.extend_from_slice(&[0x00, 0x02, 0x10, 0x0C, locking_bits]);
    body.resize(body.len() + 11, 0);
    body.extend_from_slice(&[0x02, 0x03, 0x20, 0x10]);
    body.extend_from_slice(&comid.to_be_bytes());
    body.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x04, 0x00, 0x08, 0x00, 0x00]);
    body.resize(body.len() + 5, 0);

    let mut buf = vec![0u8; 48];
    let length = u32::try_from(48 + body.len() - 4).unwrap();
    buf[0..4].copy_from_slice(&length.to_be_bytes());
    buf[6..8].copy_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&body);
    buf
}

#[derive(Debug, Clone)]
struct OpenTperSession {
    ids: SessionIds,
    sp: Uid,
    authority: Uid,
}

/// An in-memory TPer with an Admin SP and a Locking SP.
///
/// It decodes every request with the crate's own response decoder (a call
/// and a reply share one token grammar) and answers the subset of methods
/// the provisioning flows use.
#[derive(Debug)]
pub struct FakeTper {
    pub sid_pin: Vec<u8>,
    pub admin1_pin: Vec<u8>,
    pub user_pins: HashMap<u16, Vec<u8>>,
    pub users_enabled: HashMap<u16, bool>,
    pub ranges: HashMap<Uid, (bool, bool)>,
    pub locking_lifecycle: LifeCycleState,
    pub methods: Vec<Method>,
    pub timeouts: Vec<bool>,
    pub end_sessions: usize,
    /// Host session numbers of every StartSession seen.
    pub host_session_ids: Vec<u32>,
    session: Option<OpenTperSession>,
    next_tsn: u32,
    pending: VecDeque<Vec<u8>>,
}

impl Default for FakeTper {
    fn default() -> Self {
        Self {
            sid_pin: MSID.to_vec(),
            admin1_pin: Vec::new(),
            user_pins: HashMap::new(),
            users_enabled: HashMap::new(),
            ranges: HashMap::new(),
            locking_lifecycle: LifeCycleState::ManufacturedInactive,
            methods: Vec::new(),
            timeouts: Vec::new(),
            end_sessions: 0,
            host_session_ids: Vec::new(),
            session: None,
            next_tsn: 0x1001,
            pending: VecDeque::new(),
        }
    }
}

impl FakeTper {
    pub fn has_open_session(&self) -> bool {
        self.session.is_some()
    }

    fn pin_matches(&self, authority: Uid, proof: &[u8]) -> bool {
        if authority == Object::Sid.uid() {
            return self.sid_pin == proof;
        }
        if authority == Uid::admin(1) {
            return self.locking_lifecycle == LifeCycleState::Manufactured
                && self.admin1_pin == proof;
        }
        (1..=8).any(|n| {
            authority == Uid::user(n)
                && self.users_enabled.get(&n).copied().unwrap_or(false)
                && self.user_pins.get(&n).map(Vec::as_slice) == Some(proof)
        })
    }

    fn handle(&mut self, data: &[u8]) {
        let request = unframe(data).expect("host sent a malformed ComPacket");
        let ids = request.ids();
        let reply = decode_response(request.payload).expect("host sent malformed tokens");
        match reply {
            Reply::EndOfSession => {
                self.end_sessions += 1;
                self.session = None;
                self.pending.push_back(framed(ids, &[0xFA]));
            }
            Reply::Method(call) => {
                let (_, method_uid) = call.call.expect("request without a Call token");
                let method = Method::from_uid(method_uid).expect("unknown method");
                self.methods.push(method);
                let response = if method.is_session_manager() {
                    self.session_manager(method, &call)
                } else {
                    assert_eq!(
                        self.session.as_ref().map(|s| s.ids),
                        Some(ids),
                        "call outside the open session"
                    );
                    let payload = self.in_session(method, &call);
                    framed(ids, &payload)
                };
                self.pending.push_back(response);
            }
        }
    }

    fn session_manager(&mut self, method: Method, call: &MethodResponse) -> Vec<u8> {
        match method {
            Method::StartSession => {
                let hsn = call.results[0].as_uint().unwrap() as u32;
                let sp = Uid::from_slice(call.results[1].as_bytes().unwrap()).unwrap();
                self.host_session_ids.push(hsn);
                let mut challenge = None;
                let mut authority = Object::Anybody.uid();
                for param in &call.results[3..] {
                    let (name, value) = param.as_named().unwrap();
                    match name.as_uint() {
                        Some(0) => challenge = value.as_bytes().map(<[u8]>::to_vec),
                        Some(3) => authority = Uid::from_slice(value.as_bytes().unwrap()).unwrap(),
                        _ => {}
                    }
                }
                let authorized = authority == Object::Anybody.uid()
                    || challenge.is_some_and(|c| self.pin_matches(authority, &c));
                if !authorized || self.session.is_some() {
                    let status = if authorized { 0x07 } else { 0x01 };
                    let payload = session_manager_payload(
                        Method::SyncSession,
                        status,
                        &[Value::from(hsn), Value::from(0u8)],
                    );
                    return framed(SessionIds::NONE, &payload);
                }
                let tsn = self.next_tsn;
                self.next_tsn += 1;
                self.session = Some(OpenTperSession {
                    ids: SessionIds::new(hsn, tsn),
                    sp,
                    authority,
                });
                let payload = session_manager_payload(
                    Method::SyncSession,
                    0,
                    &[Value::from(hsn), Value::from(tsn)],
                );
                framed(SessionIds::NONE, &payload)
            }
            Method::Properties => {
                let host = call.results[0].as_named().unwrap().1.clone();
                let tper = Value::List(vec![
                    Value::named(&b"MaxComPacketSize"[..], 2048u32),
                    Value::named(&b"MaxResponseComPacketSize"[..], 2048u32),
                    Value::named(&b"MaxPacketSize"[..], 2028u32),
                ]);
                let payload = session_manager_payload(
                    Method::Properties,
                    0,
                    &[tper, Value::named(0u8, host)],
                );
                framed(SessionIds::NONE, &payload)
            }
            _ => framed(SessionIds::NONE, &result_payload(0x0C, &[])),
        }
    }

    fn in_session(&mut self, method: Method, call: &MethodResponse) -> Vec<u8> {
        let session = self.session.clone().expect("no open session");
        let (invoking, _) = call.call.unwrap();
        let is_sid = session.authority == Object::Sid.uid();
        let is_admin = session.authority == Uid::admin(1);

        match method {
            Method::Get => {
                let cell = call.results[0].as_list().unwrap();
                let column = cell
                    .iter()
                    .find_map(|c| {
                        let (name, value) = c.as_named()?;
                        (name.as_uint()? == 3).then(|| value.as_uint()).flatten()
                    })
                    .unwrap();
                let value = if invoking == Object::CPinMsid.uid() && column == column::PIN {
                    Value::from(MSID)
                } else if invoking == Object::LockingSp.uid() && column == column::LIFECYCLE {
                    Value::from(self.locking_lifecycle.as_u64())
                } else {
                    return result_payload(0x01, &[]);
                };
                result_payload(0, &[Value::List(vec![Value::named(column, value)])])
            }
            Method::Set => {
                let values = call.results[0].as_named().unwrap().1.as_list().unwrap();
                let cells: Vec<(u64, Value)> = values
                    .iter()
                    .map(|v| {
                        let (name, value) = v.as_named().unwrap();
                        (name.as_uint().unwrap(), value.clone())
                    })
                    .collect();
                if invoking == Object::CPinSid.uid() && is_sid {
                    self.sid_pin = cells[0].1.as_bytes().unwrap().to_vec();
                } else if session.sp == Object::LockingSp.uid() && is_admin {
                    if let Some(n) = (1..=8).find(|n| invoking == Uid::user(*n)) {
                        self.users_enabled.insert(n, cells[0].1.as_bool().unwrap());
                    } else if let Some(n) = (1..=8).find(|n| invoking == Uid::c_pin_user(*n)) {
                        self.user_pins.insert(n, cells[0].1.as_bytes().unwrap().to_vec());
                    } else {
                        let read = cells.iter().find(|c| c.0 == column::READ_LOCKED);
                        let write = cells.iter().find(|c| c.0 == column::WRITE_LOCKED);
                        self.ranges.insert(
                            invoking,
                            (
                                read.and_then(|c| c.1.as_bool()).unwrap_or(false),
                                write.and_then(|c| c.1.as_bool()).unwrap_or(false),
                            ),
                        );
                    }
                } else if let Some(n) = (1..=8).find(|n| {
                    invoking == Uid::c_pin_user(*n) && session.authority == Uid::user(*n)
                }) {
                    self.user_pins.insert(n, cells[0].1.as_bytes().unwrap().to_vec());
                } else {
                    return result_payload(0x01, &[]);
                }
                result_payload(0, &[])
            }
            Method::Activate => {
                if !is_sid || invoking != Object::LockingSp.uid() {
                    return result_payload(0x01, &[]);
                }
                self.locking_lifecycle = LifeCycleState::Manufactured;
                self.admin1_pin = self.sid_pin.clone();
                result_payload(0, &[])
            }
            Method::Revert => {
                if !is_sid || invoking != Object::AdminSp.uid() {
                    return result_payload(0x01, &[]);
                }
                self.sid_pin = MSID.to_vec();
                self.locking_lifecycle = LifeCycleState::ManufacturedInactive;
                self.user_pins.clear();
                self.users_enabled.clear();
                self.session = None;
                result_payload(0, &[])
            }
            Method::Random => {
                let count = call.results[0].as_uint().unwrap() as usize;
                result_payload(0, &[Value::from(vec![0x5Au8; count])])
            }
            _ => result_payload(0x0C, &[]),
        }
    }
}

impl SecurityTransport for FakeTper {
    fn security_send(&mut self, comid: ComId, data: &[u8]) -> Result<(), TransportError> {
        if comid != COMID {
            return Err(TransportError::new("unknown ComID"));
        }
        self.handle(data);
        Ok(())
    }

    fn security_receive(&mut self, comid: ComId, len: usize) -> Result<Vec<u8>, TransportError> {
        if comid == ComId::DISCOVERY {
            let mut data = level0(COMID.raw(), 0x01);
            data.resize(len, 0);
            return Ok(data);
        }
        let mut data = self
            .pending
            .pop_front()
            .ok_or_else(|| TransportError::new("nothing to receive"))?;
        data.resize(len.max(data.len()), 0);
        Ok(data)
    }

    fn set_extended_timeout(&mut self, enabled: bool) {
        self.timeouts.push(enabled);
    }
}

/// Returns canned buffers in order and records what was sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub responses: VecDeque<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Vec<u8>>) -> Self {
        Self {
            responses: responses.into(),
            sent: Vec::new(),
        }
    }
}

impl SecurityTransport for ScriptedTransport {
    fn security_send(&mut self, _comid: ComId, data: &[u8]) -> Result<(), TransportError> {
        self.sent.push(data.to_vec());
        Ok(())
    }

    fn security_receive(&mut self, _comid: ComId, _len: usize) -> Result<Vec<u8>, TransportError> {
        self.responses
            .pop_front()
            .ok_or_else(|| TransportError::new("script exhausted"))
    }
}
