mod common;

use codec::{MethodCall, Session, SessionState, StartSession};
use common::COMID;
use uid::{column, Object};
use wire::{unframe, Limits, SessionIds};

fn expected_anybody_admin_sp_start() -> Vec<u8> {
    let mut buf = vec![0u8; 2048];
    buf[4..6].copy_from_slice(&0x07FEu16.to_be_bytes());
    buf[16..20].copy_from_slice(&0x4Cu32.to_be_bytes());
    buf[40..44].copy_from_slice(&0x34u32.to_be_bytes());
    buf[52..56].copy_from_slice(&0x27u32.to_be_bytes());
    let payload: [u8; 0x27] = [
        0xF8, 0xA8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xA8, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0xFF, 0x02, 0xF0, 0x81, 0x69, 0xA8, 0x00, 0x00, 0x02, 0x05, 0x00, 0x00, 0x00,
        0x01, 0x01, 0xF1, 0xF9, 0xF0, 0x00, 0x00, 0x00, 0xF1,
    ];
    buf[56..56 + payload.len()].copy_from_slice(&payload);
    buf
}

#[test]
fn anybody_admin_sp_start_session_is_byte_exact() {
    let mut session = Session::new(COMID, Limits::default());
    let buf = session
        .start(&StartSession::new(0x69, Object::AdminSp))
        .unwrap();
    assert_eq!(buf, expected_anybody_admin_sp_start());
    assert_eq!(session.state(), SessionState::SessionPending);
}

#[test]
fn identical_sessions_produce_identical_requests() {
    let request = StartSession::new(0x69, Object::AdminSp);
    let a = Session::new(COMID, Limits::default()).start(&request).unwrap();
    let b = Session::new(COMID, Limits::default()).start(&request).unwrap();
    assert_eq!(a, b);
}

#[test]
fn get_msid_request_layout() {
    let mut session = Session::new(COMID, Limits::default());
    session
        .start(&StartSession::new(0x69, Object::AdminSp))
        .unwrap();
    let sync = common::session_manager_payload(
        uid::Method::SyncSession,
        0,
        &[token::Value::from(0x69u32), token::Value::from(0x101Du32)],
    );
    session
        .accept_start(&common::framed(SessionIds::NONE, &sync))
        .unwrap();

    let call = MethodCall::get(Object::CPinMsid, codec::CellBlock::column(column::PIN));
    let buf = session.call(&call).unwrap();

    assert_eq!(&buf[16..20], &0x4Cu32.to_be_bytes());
    assert_eq!(&buf[20..24], &0x101Du32.to_be_bytes());
    assert_eq!(&buf[24..28], &0x69u32.to_be_bytes());
    assert_eq!(&buf[40..44], &0x34u32.to_be_bytes());
    assert_eq!(&buf[52..56], &0x25u32.to_be_bytes());

    let framed = unframe(&buf).unwrap();
    assert_eq!(framed.ids(), SessionIds::new(0x69, 0x101D));
    assert_eq!(
        &framed.payload[19..31],
        &[0xF0, 0xF0, 0xF2, 0x03, 0x03, 0xF3, 0xF2, 0x04, 0x03, 0xF3, 0xF1, 0xF1]
    );
}

#[test]
fn end_session_is_single_token_in_session() {
    let mut session = Session::new(COMID, Limits::default());
    session
        .start(&StartSession::new(0x65, Object::AdminSp))
        .unwrap();
    let sync = common::session_manager_payload(
        uid::Method::SyncSession,
        0,
        &[token::Value::from(0x65u32), token::Value::from(0x1001u32)],
    );
    session
        .accept_start(&common::framed(SessionIds::NONE, &sync))
        .unwrap();

    let buf = session.end().unwrap();
    let framed = unframe(&buf).unwrap();
    assert_eq!(framed.payload, &[0xFA]);
    assert_eq!(framed.sub_packet.length, 1);
    assert_eq!(framed.packet.length, 16);
    assert_eq!(framed.com_packet.length, 40);
}
