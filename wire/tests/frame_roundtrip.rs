use proptest::prelude::*;
use wire::{frame, unframe, ComId, DecodeError, Limits, SessionIds, PAYLOAD_OFFSET};

#[test]
fn roundtrip_boundary_payloads() {
    let limits = Limits::default();
    let comid = ComId::new(0x07FE);
    let ids = SessionIds::new(0x65, 0x0000_1001);
    for len in [0usize, 1, 3, 4, 5, limits.max_payload() - 1, limits.max_payload()] {
        let payload: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
        let buf = frame(comid, ids, &payload, &limits).unwrap();
        assert_eq!(buf.len(), limits.transfer_size);

        let decoded = unframe(&buf).unwrap();
        assert_eq!(decoded.comid(), comid, "len {len}");
        assert_eq!(decoded.ids(), ids, "len {len}");
        assert_eq!(decoded.payload, &payload[..], "len {len}");
    }
}

#[test]
fn anybody_start_session_lengths() {
    let payload = [0u8; 0x27];
    let buf = frame(
        ComId::new(0x07FE),
        SessionIds::NONE,
        &payload,
        &Limits::default(),
    )
    .unwrap();
    let decoded = unframe(&buf).unwrap();
    assert_eq!(decoded.com_packet.length, 0x4C);
    assert_eq!(decoded.packet.length, 0x34);
    assert_eq!(decoded.sub_packet.length, 0x27);
}

#[test]
fn response_not_ready() {
    let mut buf = vec![0u8; 2048];
    buf[4..6].copy_from_slice(&0x07FEu16.to_be_bytes());
    buf[8..12].copy_from_slice(&0x40u32.to_be_bytes());
    assert_eq!(
        unframe(&buf),
        Err(DecodeError::NoPayload {
            outstanding_data: 0x40
        })
    );
}

proptest! {
    #[test]
    fn prop_frame_roundtrip(
        comid in any::<u16>(),
        hsn in any::<u32>(),
        tsn in any::<u32>(),
        payload in prop::collection::vec(any::<u8>(), 0..1992),
    ) {
        let limits = Limits::default();
        let ids = SessionIds::new(hsn, tsn);
        let buf = frame(ComId::new(comid), ids, &payload, &limits).unwrap();
        let decoded = unframe(&buf).unwrap();
        prop_assert_eq!(decoded.comid(), ComId::new(comid));
        prop_assert_eq!(decoded.ids(), ids);
        prop_assert_eq!(decoded.payload, &payload[..]);
        prop_assert!(buf[PAYLOAD_OFFSET + payload.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn prop_unframe_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = unframe(&data);
    }
}
