//! Progress reporting for a fleet run.
//!
//! The scheduler sends a snapshot after every finished device; consumers
//! (the CLI) decide how often to print.

use std::time::Duration;

/// Snapshot of run progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProgress {
    /// Devices with a terminal result.
    pub completed: usize,
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl FetchProgress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    /// Devices finished per second (0 if no time elapsed).
    pub fn devices_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / secs
    }
}
