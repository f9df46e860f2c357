//! Fleet fetch orchestration.
//!
//! device list → bounded scheduler → fetch worker (transport + retry policy)
//! → result aggregator. The orchestrator is built once from an explicit
//! configuration value and always returns a complete result map: per-device
//! failures are data, never errors.

mod progress;
mod scheduler;
mod worker;

pub use progress::FetchProgress;
pub use worker::decode_payload;

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::config::FetchConfig;
use crate::device::{dedup_devices, Device};
use crate::results::{ResultAggregator, RunResults};
use crate::retry::RetryPolicy;
use crate::target::QueryTarget;
use crate::transport::{CurlPool, PoolOptions, Transport};

/// Run-wide limits.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Maximum devices in flight.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Wall-clock budget for the whole run.
    pub run_deadline: Duration,
}

impl RunOptions {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            concurrency: cfg.concurrency.max(1),
            retry: cfg.retry.policy(),
            run_deadline: cfg.run_deadline(),
        }
    }
}

/// Queries one target across a device fleet with bounded concurrency.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    target: QueryTarget,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>, target: QueryTarget, options: RunOptions) -> Self {
        Self {
            transport,
            target,
            options,
        }
    }

    /// Validate `cfg` and build the production curl transport from it.
    pub fn from_config(cfg: &FetchConfig) -> Result<Self> {
        cfg.validate()?;
        let target = QueryTarget::from_config(cfg)?;
        let pool = CurlPool::new(PoolOptions::from_config(cfg)?);
        Ok(Self::new(Arc::new(pool), target, RunOptions::from_config(cfg)))
    }

    pub fn target(&self) -> &QueryTarget {
        &self.target
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub async fn run(&self, devices: Vec<Device>) -> RunResults {
        self.run_with_progress(devices, None).await
    }

    /// Like [`run`](Self::run), sending a [`FetchProgress`] after each finished device.
    ///
    /// Intermediate snapshots are dropped when the channel is full. The final
    /// snapshot is awaited, so the receiver must be drained while the run is going.
    pub async fn run_with_progress(
        &self,
        devices: Vec<Device>,
        progress_tx: Option<mpsc::Sender<FetchProgress>>,
    ) -> RunResults {
        let devices = dedup_devices(devices);
        let now = Instant::now();
        let deadline = now
            .checked_add(self.options.run_deadline)
            .unwrap_or_else(|| now + Duration::from_secs(365 * 24 * 3600));

        tracing::info!(
            devices = devices.len(),
            concurrency = self.options.concurrency,
            retries = self.options.retry.retries,
            target = %self.target,
            "fleet run starting"
        );

        let aggregator = Arc::new(ResultAggregator::new());
        let ctx = Arc::new(worker::WorkerContext {
            transport: Arc::clone(&self.transport),
            policy: self.options.retry,
            deadline,
            aggregator: Arc::clone(&aggregator),
        });

        scheduler::run_bounded(
            ctx,
            &self.target,
            &devices,
            self.options.concurrency,
            progress_tx.as_ref(),
        )
        .await;

        // Workers are joined or aborted; a clone may still be held by an aborted task being dropped.
        let results = match Arc::try_unwrap(aggregator) {
            Ok(a) => a.into_results(),
            Err(arc) => arc.snapshot(),
        };
        tracing::info!(
            total = results.len(),
            ok = results.ok_count(),
            failed = results.failed_count(),
            elapsed_ms = now.elapsed().as_millis() as u64,
            "fleet run finished"
        );
        results
    }
}
