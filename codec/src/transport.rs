//! The security send/receive seam.
//!
//! Implementations move opaque buffers to and from the drive (NVMe Security
//! Send/Receive, SCSI SECURITY PROTOCOL IN/OUT, ATA TRUSTED SEND/RECEIVE).
//! They know nothing about ComPackets or tokens.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};
use wire::ComId;

/// Security protocol 0x01, used for every Opal exchange including discovery.
pub const SECURITY_PROTOCOL: u8 = 0x01;

/// Error reported by a transport implementation.
///
/// Carries a message and, optionally, the underlying device error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Moves buffers to and from the drive's security protocol interface.
pub trait SecurityTransport: fmt::Debug {
    /// Sends `data` to `comid` (security protocol 0x01).
    fn security_send(&mut self, comid: ComId, data: &[u8]) -> Result<(), TransportError>;

    /// Receives up to `len` bytes from `comid` (security protocol 0x01).
    fn security_receive(&mut self, comid: ComId, len: usize) -> Result<Vec<u8>, TransportError>;

    /// Switches to the long command timeout needed by Revert, RevertSP and
    /// GenKey. The default ignores the request.
    fn set_extended_timeout(&mut self, _enabled: bool) {}

    /// Sends `data`, logging the exchange.
    fn send(&mut self, comid: ComId, data: &[u8]) -> Result<(), TransportError> {
        trace!(%comid, len = data.len(), data = ?hex::encode(trim_tail(data)), "security send");
        let result = self.security_send(comid, data);
        if let Err(e) = &result {
            debug!(%comid, error = %e, "security send failed");
        }
        result
    }

    /// Receives up to `len` bytes, logging the exchange.
    fn receive(&mut self, comid: ComId, len: usize) -> Result<Vec<u8>, TransportError> {
        let result = self.security_receive(comid, len);
        match &result {
            Ok(data) => {
                trace!(%comid, len = data.len(), data = ?hex::encode(trim_tail(data)), "security receive");
            }
            Err(e) => {
                debug!(%comid, error = %e, "security receive failed");
            }
        }
        result
    }
}

impl<T: SecurityTransport + ?Sized> SecurityTransport for &mut T {
    fn security_send(&mut self, comid: ComId, data: &[u8]) -> Result<(), TransportError> {
        (**self).security_send(comid, data)
    }

    fn security_receive(&mut self, comid: ComId, len: usize) -> Result<Vec<u8>, TransportError> {
        (**self).security_receive(comid, len)
    }

    fn set_extended_timeout(&mut self, enabled: bool) {
        (**self).set_extended_timeout(enabled);
    }
}

/// Drops the zero padding that fills the transfer buffer.
fn trim_tail(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &data[..end]
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    /// Responses returned in order.
    pub responses: std::collections::VecDeque<Vec<u8>>,
    /// Buffers that were sent, with their ComID.
    pub sent: Vec<(ComId, Vec<u8>)>,
    /// Every extended-timeout toggle, in order.
    pub timeouts: Vec<bool>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new(responses: Vec<Vec<u8>>) -> Self {
        Self {
            responses: responses.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl SecurityTransport for MockTransport {
    fn security_send(&mut self, comid: ComId, data: &[u8]) -> Result<(), TransportError> {
        self.sent.push((comid, data.to_vec()));
        Ok(())
    }

    fn security_receive(&mut self, _comid: ComId, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut data = self
            .responses
            .pop_front()
            .ok_or_else(|| TransportError::new("no response queued"))?;
        data.resize(len.max(data.len()), 0);
        Ok(data)
    }

    fn set_extended_timeout(&mut self, enabled: bool) {
        self.timeouts.push(enabled);
    }
}
