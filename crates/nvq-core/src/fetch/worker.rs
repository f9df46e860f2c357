//! Fetch worker: drives one device from its first attempt to a terminal result.
//!
//! Attempting → (Success | Retrying → Attempting | Failed). The worker owns its
//! device key and records exactly one result into the aggregator before exiting.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::results::{Attempt, DeviceResult, ResultAggregator};
use crate::retry::{AttemptOutcome, RetryDecision, RetryPolicy};
use crate::target::QueryTarget;
use crate::transport::{Request, Transport, TransportError, TransportErrorKind};

/// Everything a worker shares with its siblings for one run.
pub(super) struct WorkerContext {
    pub transport: Arc<dyn Transport>,
    pub policy: RetryPolicy,
    pub deadline: Instant,
    pub aggregator: Arc<ResultAggregator>,
}

/// Decode a 2xx body as JSON, or keep the text as `{"_raw": text}`.
pub fn decode_payload(body: &[u8]) -> Value {
    match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => json!({ "_raw": String::from_utf8_lossy(body) }),
    }
}

/// Run one device to completion and record its result.
pub(super) async fn fetch_device(ctx: Arc<WorkerContext>, device: String, url: String) {
    let result = run_attempts(&ctx, &device, url).await;
    if result.ok() {
        tracing::debug!(device = %device, attempts = result.attempt_count(), "device ok");
    } else {
        tracing::info!(
            device = %device,
            attempts = result.attempt_count(),
            error = result.error().unwrap_or_default(),
            "device failed"
        );
    }
    ctx.aggregator.record(&device, result);
}

async fn run_attempts(ctx: &WorkerContext, device: &str, url: String) -> DeviceResult {
    let mut attempts = Vec::new();
    let mut index = 0u32;
    loop {
        let started_at = SystemTime::now();
        let outcome = match QueryTarget::check_url(&url, device) {
            Ok(()) => attempt_once(ctx, &url).await,
            Err(e) => AttemptOutcome::TransportError(TransportError::new(
                TransportErrorKind::Setup,
                format!("{:#}", e),
            )),
        };
        attempts.push(Attempt {
            index,
            started_at,
            status: outcome.status(),
            error: outcome.error_message(),
        });

        match (ctx.policy.decide(index, &outcome), outcome) {
            (RetryDecision::Succeeded, AttemptOutcome::Success { status, body }) => {
                return DeviceResult::succeeded(url, status, decode_payload(&body), attempts);
            }
            (RetryDecision::RetryAfter(delay), outcome) => {
                tracing::warn!(
                    device,
                    attempt = index,
                    delay_ms = delay.as_millis() as u64,
                    error = %outcome.error_message().unwrap_or_default(),
                    "retrying"
                );
                tokio::time::sleep(delay).await;
                index += 1;
            }
            (_, outcome) => {
                let error = outcome
                    .error_message()
                    .unwrap_or_else(|| "unknown error".to_string());
                return DeviceResult::failed(url, outcome.status(), error, attempts);
            }
        }
    }
}

/// One blocking GET on the blocking pool.
async fn attempt_once(ctx: &WorkerContext, url: &str) -> AttemptOutcome {
    let transport = Arc::clone(&ctx.transport);
    let request = Request {
        url: url.to_string(),
        deadline: Some(ctx.deadline),
    };
    tracing::debug!(url = %request.url, "GET");
    let res = tokio::task::spawn_blocking(move || transport.get(&request))
        .await
        .unwrap_or_else(|e| {
            Err(TransportError::new(
                TransportErrorKind::Other,
                format!("transport task failed: {}", e),
            ))
        });
    AttemptOutcome::from_response(res)
}
