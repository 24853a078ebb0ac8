#![no_main]

use codec::{CodecLimits, MethodCall, Session, StartSession};
use libfuzzer_sys::fuzz_target;
use uid::Object;
use wire::{ComId, Limits};

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = wire::unframe(data) {
        let _ = codec::decode_response_with(frame.payload, &CodecLimits::for_testing());
    }

    // Drive a session with the input as both the start reply and a call reply.
    let mut session =
        Session::new(ComId::new(0x07FE), Limits::default()).with_codec_limits(CodecLimits::for_testing());
    if session.start(&StartSession::new(0x65, Object::AdminSp)).is_err() {
        return;
    }
    if session.accept_start(data).is_ok() && session.call(&MethodCall::random(8)).is_ok() {
        let _ = session.accept(data);
    }
});
