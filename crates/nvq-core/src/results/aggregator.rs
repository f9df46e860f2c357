//! Order-independent map of device → terminal result.
//!
//! Each device is owned by exactly one worker, so the only coordination needed
//! is an atomic insert-if-absent; a short mutex section provides it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{DeviceResult, RunSummary};
use crate::device::Device;

/// Collects exactly one result per device for the duration of a run.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<BTreeMap<Device, DeviceResult>>,
    ok: AtomicUsize,
    failed: AtomicUsize,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the terminal result for `device`. Returns false (and keeps the
    /// first result) if the device was already recorded.
    pub fn record(&self, device: &str, result: DeviceResult) -> bool {
        let ok = result.ok();
        {
            let mut map = self.results.lock().unwrap_or_else(|e| e.into_inner());
            if map.contains_key(device) {
                drop(map);
                tracing::warn!(device, "second result for device rejected");
                return false;
            }
            map.insert(device.to_string(), result);
        }
        if ok {
            self.ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        true
    }

    pub fn contains(&self, device: &str) -> bool {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(device)
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (ok, failed) recorded so far.
    pub fn counts(&self) -> (usize, usize) {
        (
            self.ok.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }

    /// Immutable copy of the current map.
    pub fn snapshot(&self) -> RunResults {
        RunResults {
            results: self
                .results
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }

    pub fn into_results(self) -> RunResults {
        RunResults {
            results: self.results.into_inner().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

/// Final, immutable device → result map of a run, iterated in device order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResults {
    results: BTreeMap<Device, DeviceResult>,
}

impl RunResults {
    pub fn get(&self, device: &str) -> Option<&DeviceResult> {
        self.results.get(device)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Device, &DeviceResult)> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn ok_count(&self) -> usize {
        self.results.values().filter(|r| r.ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.ok_count()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(self)
    }
}

impl<'a> IntoIterator for &'a RunResults {
    type Item = (&'a Device, &'a DeviceResult);
    type IntoIter = std::collections::btree_map::Iter<'a, Device, DeviceResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
