//! Retry and backoff policy.
//!
//! This module turns the outcome of one request attempt into a verdict
//! (success, retryable, terminal) and computes exponential backoff with jitter,
//! so the fetch worker only has to follow the decision it is handed.

mod classify;
mod outcome;
mod policy;

pub use classify::{classify, classify_http_status, classify_transport};
pub use outcome::AttemptOutcome;
pub use policy::{RetryDecision, RetryPolicy, Verdict};
