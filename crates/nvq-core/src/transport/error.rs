//! Transport-level error type.

use std::fmt;

/// Error text recorded for a device that ran out of run time.
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// Broad category of a transport failure; drives retry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Host name could not be resolved.
    Dns,
    /// TCP connect failed (refused, unreachable).
    Connect,
    /// TLS handshake or certificate verification failed.
    Tls,
    /// Connect or read timed out.
    Timeout,
    /// Connection reset, send/receive failure, empty reply.
    Io,
    /// The run deadline elapsed before or during the attempt.
    DeadlineExceeded,
    /// The request could not be built (malformed URL, bad option).
    Setup,
    /// Any other transfer failure.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Io => "io",
            TransportErrorKind::DeadlineExceeded => "deadline",
            TransportErrorKind::Setup => "setup",
            TransportErrorKind::Other => "transport",
        };
        f.write_str(s)
    }
}

/// Failure to obtain any HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn deadline_exceeded() -> Self {
        Self::new(TransportErrorKind::DeadlineExceeded, DEADLINE_EXCEEDED)
    }
}
