//! Error types for method and session operations.

use thiserror::Error;
use token::TokenError;
use uid::Method;
use wire::{DecodeError, EncodeError, SessionIds};

use crate::status::MethodStatus;
use crate::transport::TransportError;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding calls, decoding responses, or
/// driving a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The token stream inside a payload is malformed.
    #[error("malformed token stream: {0}")]
    MalformedToken(#[from] TokenError),

    /// The ComPacket envelope or discovery data is malformed.
    #[error(transparent)]
    Wire(#[from] DecodeError),

    /// A request could not be framed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The transport failed; surfaced unchanged.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The TPer answered with a non-success status.
    #[error("{method} failed: {status}")]
    MethodStatus {
        method: Method,
        status: MethodStatus,
    },

    /// A method call was issued outside an active session.
    #[error("no active session")]
    SessionNotEstablished,

    /// A request was issued while the previous response is still owed.
    #[error("a response is still outstanding")]
    ExchangeOutstanding,

    /// A response was supplied without a matching request.
    #[error("no request is awaiting a response")]
    NoExchangeOutstanding,

    /// The operation is not valid in the session's current state.
    #[error("cannot {operation} while the session is {state}")]
    InvalidTransition {
        state: &'static str,
        operation: &'static str,
    },

    /// The TPer ended the session on its own.
    #[error("session closed by the TPer")]
    ClosedByTper,

    /// The response echoed different session numbers than the request used.
    #[error("session mismatch: expected {expected}, found {found}")]
    SessionMismatch {
        expected: SessionIds,
        found: SessionIds,
    },

    /// The response is well-formed tokens but not the expected shape.
    #[error("unexpected response: {reason}")]
    UnexpectedResponse { reason: &'static str },
}

impl CodecError {
    /// Returns the method status if the TPer rejected the call.
    #[must_use]
    pub const fn status(&self) -> Option<MethodStatus> {
        match self {
            Self::MethodStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the TPer had not finished producing the response.
    #[must_use]
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::Wire(DecodeError::NoPayload { .. }))
    }

    pub(crate) const fn unexpected(reason: &'static str) -> Self {
        Self::UnexpectedResponse { reason }
    }
}
