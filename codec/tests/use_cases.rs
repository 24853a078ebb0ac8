mod common;

use codec::{CodecError, HostProperties, MethodStatus, Tper};
use common::{FakeTper, COMID, MSID};
use uid::{LifeCycleState, Method, Object, Uid};
use wire::{FeatureCode, Limits};

fn tper() -> Tper<FakeTper> {
    Tper::discover(FakeTper::default(), Limits::default()).unwrap()
}

#[test]
fn discovery_selects_opal_comid() {
    let tper = tper();
    assert_eq!(tper.comid(), COMID);
    assert_eq!(tper.ssc().map(|s| s.code), Some(FeatureCode::OpalV2));
    assert!(tper.locking().is_some_and(|l| l.supported));
}

#[test]
fn properties_exchange() {
    let mut tper = tper();
    let props = tper.properties(&HostProperties::default()).unwrap();
    assert_eq!(props.get("MaxComPacketSize"), Some(2048));
    assert!(props
        .host
        .contains(&("MaxIndTokenSize".to_string(), 4040)));
    assert!(!tper.transport().has_open_session());
}

#[test]
fn read_msid_uses_anybody_session() {
    let mut tper = tper();
    assert_eq!(tper.read_msid().unwrap(), MSID);
    let fake = tper.transport();
    assert_eq!(
        fake.methods,
        vec![Method::StartSession, Method::Get]
    );
    assert_eq!(fake.end_sessions, 1);
    assert!(!fake.has_open_session());
}

#[test]
fn take_ownership_then_activate() {
    let mut tper = tper();
    tper.take_ownership(b"123456").unwrap();
    assert_eq!(tper.transport().sid_pin, b"123456");

    assert_eq!(
        tper.locking_sp_lifecycle(b"123456").unwrap(),
        LifeCycleState::ManufacturedInactive
    );
    assert!(tper.activate_locking_sp(b"123456").unwrap());
    assert!(!tper.activate_locking_sp(b"123456").unwrap());
    assert_eq!(
        tper.transport().locking_lifecycle,
        LifeCycleState::Manufactured
    );
}

#[test]
fn host_session_ids_follow_each_other() {
    let mut tper = tper();
    tper.take_ownership(b"pw").unwrap();
    assert_eq!(tper.transport().host_session_ids, vec![0x65, 0x66]);
}

#[test]
fn wrong_sid_pin_is_not_authorized() {
    let mut tper = tper();
    tper.take_ownership(b"123456").unwrap();
    let err = tper.activate_locking_sp(b"wrong").unwrap_err();
    assert!(matches!(
        err,
        CodecError::MethodStatus {
            method: Method::StartSession,
            status: MethodStatus::NOT_AUTHORIZED,
        }
    ));
    assert!(!tper.transport().has_open_session());
}

#[test]
fn configure_user_and_lock_range() {
    let mut tper = tper();
    tper.take_ownership(b"123456").unwrap();
    tper.activate_locking_sp(b"123456").unwrap();

    tper.enable_user(b"123456", 1).unwrap();
    tper.set_user_password(Uid::admin(1), b"123456", 1, b"111111")
        .unwrap();
    assert_eq!(tper.transport().users_enabled.get(&1), Some(&true));

    // The user can now authenticate and change its own PIN.
    tper.set_user_password(Uid::user(1), b"111111", 1, b"222222")
        .unwrap();
    assert_eq!(
        tper.transport().user_pins.get(&1).map(Vec::as_slice),
        Some(&b"222222"[..])
    );

    tper.set_range_lock(Uid::admin(1), b"123456", 0, true, false)
        .unwrap();
    assert_eq!(
        tper.transport()
            .ranges
            .get(&Object::LockingRangeGlobal.uid()),
        Some(&(true, false))
    );
}

#[test]
fn revert_tper_uses_extended_timeout_and_skips_end_session() {
    let mut tper = tper();
    tper.take_ownership(b"123456").unwrap();
    let ends_before = tper.transport().end_sessions;

    tper.revert_tper(b"123456").unwrap();

    let fake = tper.transport();
    assert_eq!(fake.timeouts, vec![true, false]);
    assert_eq!(fake.sid_pin, MSID);
    assert_eq!(fake.end_sessions, ends_before);
    assert!(!fake.has_open_session());
}

#[test]
fn random_inside_session() {
    let mut tper = tper();
    let mut session = tper.start_session(Object::AdminSp, None).unwrap();
    assert_eq!(session.random(16).unwrap(), vec![0x5A; 16]);
    session.end().unwrap();
    assert!(!tper.transport().has_open_session());
}

#[test]
fn failed_call_keeps_session_usable() {
    let mut tper = tper();
    let mut session = tper.start_session(Object::AdminSp, None).unwrap();
    let err = session.activate(Object::LockingSp).unwrap_err();
    assert_eq!(err.status(), Some(MethodStatus::NOT_AUTHORIZED));
    assert!(session.session().is_active());
    assert_eq!(session.random(4).unwrap().len(), 4);
    session.end().unwrap();
}

#[test]
fn unsupported_method_reports_invalid_parameter() {
    let mut tper = tper();
    let mut session = tper.start_session(Object::AdminSp, None).unwrap();
    let err = session.gen_key(Object::KAes256GlobalRange).unwrap_err();
    assert_eq!(err.status(), Some(MethodStatus::INVALID_PARAMETER));
    session.end().unwrap();
    // GenKey is long running even when it fails.
    assert_eq!(tper.transport().timeouts, vec![true, false]);
}
