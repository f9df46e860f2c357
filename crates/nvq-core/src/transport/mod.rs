//! Request transport shared by every fetch worker.
//!
//! [`Transport`] is the seam between the orchestrator and the network: the
//! production implementation is [`CurlPool`], tests plug in scripted
//! transports. Calls are blocking; the worker runs them on tokio's blocking pool.

mod error;
mod pool;

pub use error::{TransportError, TransportErrorKind, DEADLINE_EXCEEDED};
pub use pool::{classify_curl_error, CurlPool, PoolOptions};

use std::time::Instant;

/// One GET to issue.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    /// Run deadline; a transport must not run an attempt past it.
    pub deadline: Option<Instant>,
}

/// Status and raw body of a completed HTTP exchange (any status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

/// Issues single requests. Shared across workers, so it must be usable
/// concurrently through `&self`.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, request: &Request) -> Result<RawResponse, TransportError>;
}
