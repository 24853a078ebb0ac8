//! Method encoding, response decoding and session handling for the TCG Opal SSC.
//!
//! This is the main crate that ties together the token codec, the UID
//! catalog and the ComPacket framer to talk to a self-encrypting drive.
//!
//! # Features
//!
//! - Method builders for Properties, StartSession, Get, Set, Authenticate,
//!   Activate, Revert, RevertSP, GenKey, GetACL, Random and Next
//! - Response decoding with mandatory status inspection
//! - A sans-I/O session state machine
//! - A [`Tper`] driver over any [`SecurityTransport`], with the common
//!   provisioning flows (take ownership, activate, user setup, revert)
//!
//! # Design Principles
//!
//! - **One exchange in flight** - A session never issues a request while a
//!   response is owed.
//! - **Status is never ignored** - Every response's status list is checked
//!   before its results are returned.
//! - **Deterministic** - The same call encodes to the same bytes.
//!
//! # Example
//!
//! ```
//! use codec::{MethodCall, StartSession};
//! use uid::Object;
//!
//! let call = MethodCall::start_session(&StartSession::new(0x69, Object::AdminSp));
//! let payload = call.encode().unwrap();
//! assert_eq!(payload.len(), 0x27);
//! ```

mod error;
mod limits;
mod method;
mod response;
mod session;
mod status;
mod tper;
mod transport;

pub use error::{CodecError, CodecResult};
pub use limits::{CodecLimits, HostProperties};
pub use method::{CellBlock, MethodCall, Request, StartSession};
pub use response::{decode_response, decode_response_with, MethodResponse, Reply, TperProperties};
pub use session::{frame_session_manager_call, Session, SessionState};
pub use status::MethodStatus;
pub use tper::{OpenSession, Tper, FIRST_HOST_SESSION_ID};
pub use transport::{SecurityTransport, TransportError, SECURITY_PROTOCOL};
pub use wire::Limits as WireLimits;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = WireLimits::default();
        let _ = CodecLimits::default();
        let _ = HostProperties::default();
        let _ = MethodStatus::SUCCESS;
        let _ = CellBlock::all();
        let _ = SessionState::Unauthenticated;

        let _: CodecResult<()> = Ok(());
    }

    #[test]
    fn session_starts_unauthenticated() {
        let session = Session::new(wire::ComId::new(0x07FE), WireLimits::default());
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(!session.awaiting_response());
    }
}
