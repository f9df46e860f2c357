//! Classify attempt outcomes (HTTP status or transport error) into verdicts.

use super::outcome::AttemptOutcome;
use super::policy::Verdict;
use crate::transport::{TransportError, TransportErrorKind};

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> Verdict {
    match code {
        200..=299 => Verdict::Success,
        429 | 500..=599 => Verdict::Retryable,
        _ => Verdict::Terminal,
    }
}

/// Classify a transport error. Everything network-shaped is retried; a local
/// setup error or an elapsed run deadline is not.
pub fn classify_transport(e: &TransportError) -> Verdict {
    match e.kind {
        TransportErrorKind::Setup | TransportErrorKind::DeadlineExceeded => Verdict::Terminal,
        TransportErrorKind::Dns
        | TransportErrorKind::Connect
        | TransportErrorKind::Tls
        | TransportErrorKind::Timeout
        | TransportErrorKind::Io
        | TransportErrorKind::Other => Verdict::Retryable,
    }
}

/// Classify one attempt outcome.
pub fn classify(outcome: &AttemptOutcome) -> Verdict {
    match outcome {
        AttemptOutcome::Success { .. } => Verdict::Success,
        AttemptOutcome::HttpError { status, .. } => classify_http_status(*status),
        AttemptOutcome::TransportError(e) => classify_transport(e),
    }
}
