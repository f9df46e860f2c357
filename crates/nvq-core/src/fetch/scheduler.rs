//! Bounded scheduler: at most `concurrency` device workers in flight.
//!
//! Keeps up to `concurrency` workers in a `JoinSet`; when one finishes, the
//! next device in input order is admitted. A single run deadline bounds the
//! whole loop; on expiry every in-flight worker is aborted and all devices
//! still without a result are recorded as failed.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::device::Device;
use crate::results::DeviceResult;
use crate::target::QueryTarget;
use crate::transport::DEADLINE_EXCEEDED;

use super::progress::FetchProgress;
use super::worker::{fetch_device, WorkerContext};

pub(super) const LOST_WORKER_ERROR: &str = "worker terminated without a result";

/// Runs every device to a terminal result (or the deadline). On return the
/// aggregator in `ctx` holds exactly one result per device.
pub(super) async fn run_bounded(
    ctx: Arc<WorkerContext>,
    target: &QueryTarget,
    devices: &[Device],
    concurrency: usize,
    progress_tx: Option<&mpsc::Sender<FetchProgress>>,
) {
    let concurrency = concurrency.max(1);
    let total = devices.len();
    let started = Instant::now();
    let deadline = tokio::time::Instant::from_std(ctx.deadline);
    let mut queue: VecDeque<&Device> = devices.iter().collect();
    let mut join_set = JoinSet::new();
    let mut expired = false;

    let snapshot = |ctx: &WorkerContext| {
        let (ok, failed) = ctx.aggregator.counts();
        FetchProgress {
            completed: ok + failed,
            total,
            ok,
            failed,
            elapsed: started.elapsed(),
        }
    };
    // Intermediate snapshots are best-effort; a full channel drops them.
    let report = |ctx: &WorkerContext| {
        if let Some(tx) = progress_tx {
            let _ = tx.try_send(snapshot(ctx));
        }
    };

    loop {
        // Nothing new is admitted once the deadline has passed.
        if !queue.is_empty() && tokio::time::Instant::now() >= deadline {
            expired = true;
            break;
        }
        while join_set.len() < concurrency {
            let Some(device) = queue.pop_front() else {
                break;
            };
            let url = target.url_for(device);
            join_set.spawn(fetch_device(Arc::clone(&ctx), device.clone(), url));
        }

        if join_set.is_empty() {
            break;
        }

        match tokio::time::timeout_at(deadline, join_set.join_next()).await {
            Ok(Some(res)) => {
                if let Err(e) = res {
                    tracing::error!("device worker join: {}", e);
                }
                report(&ctx);
            }
            Ok(None) => break,
            Err(_) => {
                expired = true;
                break;
            }
        }
    }

    if expired {
        tracing::warn!(
            in_flight = join_set.len(),
            queued = queue.len(),
            "run deadline exceeded; aborting remaining devices"
        );
        join_set.shutdown().await;
    }

    let reason = if expired {
        DEADLINE_EXCEEDED
    } else {
        LOST_WORKER_ERROR
    };
    let mut filled = 0usize;
    for device in devices {
        if !ctx.aggregator.contains(device) {
            let result = DeviceResult::failed(target.url_for(device), None, reason, Vec::new());
            if ctx.aggregator.record(device, result) {
                filled += 1;
            }
        }
    }
    if filled > 0 {
        tracing::warn!(filled, reason, "devices marked failed without a worker result");
    }

    // The final snapshot is always delivered so consumers see the run complete.
    if let Some(tx) = progress_tx {
        let _ = tx.send(snapshot(&ctx)).await;
    }
}
