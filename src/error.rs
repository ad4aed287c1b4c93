//! Error kinds for the DS3 bridge, per the propagation policy: local and
//! recoverable where possible, surfaced only for bind failures and panics.
use std::io;

use thiserror::Error;

/// Errors that can occur anywhere in the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Listener bind, gadget bind, or configured-state timeout. Fatal.
    #[error("failed to bind: {0}")]
    BindFailure(String),

    /// Unrecognized flash sub-command, F4 sub-command, or unknown
    /// feature GET/SET (type, id). Logged; never fatal.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// An unsupported (type, id) combination was requested on GET or SET.
    #[error("unsupported report: type={report_type:#x} id={report_id:#x}")]
    UnsupportedReport { report_type: u8, report_id: u8 },

    /// Output report update with a length other than 48 bytes.
    #[error("invalid output report length: expected 48, got {0}")]
    InvalidLength(usize),

    /// Socket read/write failure on a session.
    #[error("session error ({remote}): {source}")]
    SessionError {
        remote: String,
        #[source]
        source: io::Error,
    },

    /// A second inbound connection arrived while a session was already open.
    #[error("extra connection from {0} rejected")]
    ExtraConnection(String),

    /// Transient epIn/epOut failure. The affected sample is dropped.
    #[error("endpoint error: {0}")]
    EndpointError(String),

    /// Fatal epIn/epOut closure (a zero-byte read signaling the endpoint
    /// file has been closed, not a momentary I/O failure). Releases the
    /// function.
    #[error("endpoint closed: {0}")]
    EndpointClosed(String),
}

impl From<io::Error> for BridgeError {
    fn from(err: io::Error) -> Self {
        BridgeError::BindFailure(err.to_string())
    }
}
