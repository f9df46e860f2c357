//! Tagged outcome of a single request attempt.

use crate::transport::{RawResponse, TransportError, TransportErrorKind, DEADLINE_EXCEEDED};

/// Number of body characters carried into an HTTP error message.
const ERROR_BODY_CHARS: usize = 200;

/// What one attempt produced. Classification is a pure function over this value
/// (see [`super::classify`]), so the worker never branches on transport internals.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// 2xx response.
    Success { status: u32, body: Vec<u8> },
    /// Response with a non-2xx status.
    HttpError { status: u32, body: Vec<u8> },
    /// No usable response (DNS, connect, TLS, timeout, reset, deadline).
    TransportError(TransportError),
}

impl AttemptOutcome {
    pub fn from_response(res: Result<RawResponse, TransportError>) -> Self {
        match res {
            Ok(r) if (200..300).contains(&r.status) => AttemptOutcome::Success {
                status: r.status,
                body: r.body,
            },
            Ok(r) => AttemptOutcome::HttpError {
                status: r.status,
                body: r.body,
            },
            Err(e) => AttemptOutcome::TransportError(e),
        }
    }

    /// HTTP status if the device answered at all.
    pub fn status(&self) -> Option<u32> {
        match self {
            AttemptOutcome::Success { status, .. } | AttemptOutcome::HttpError { status, .. } => {
                Some(*status)
            }
            AttemptOutcome::TransportError(_) => None,
        }
    }

    /// Error text recorded when this is the last attempt of a failed device.
    pub fn error_message(&self) -> Option<String> {
        match self {
            AttemptOutcome::Success { .. } => None,
            AttemptOutcome::HttpError { status, body } => {
                let text = String::from_utf8_lossy(body);
                let snippet: String = text.trim().chars().take(ERROR_BODY_CHARS).collect();
                if snippet.is_empty() {
                    Some(format!("HTTP {}", status))
                } else {
                    Some(format!("HTTP {}: {}", status, snippet))
                }
            }
            AttemptOutcome::TransportError(e) if e.kind == TransportErrorKind::DeadlineExceeded => {
                Some(DEADLINE_EXCEEDED.to_string())
            }
            AttemptOutcome::TransportError(e) => Some(e.to_string()),
        }
    }
}
