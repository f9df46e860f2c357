//! Run summary: counts plus a bounded sample of failures.

use std::fmt;

use super::{DeviceRecord, RunResults};

/// Failures listed in a summary before collapsing into an overflow count.
pub const FAILURE_SAMPLE_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSample {
    pub device: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    /// First [`FAILURE_SAMPLE_LIMIT`] failures in device order.
    pub failures: Vec<FailureSample>,
}

impl RunSummary {
    fn collect<'a>(rows: impl Iterator<Item = (&'a str, bool, Option<&'a str>)>) -> Self {
        let mut summary = RunSummary::default();
        for (device, ok, error) in rows {
            summary.total += 1;
            if ok {
                summary.ok += 1;
                continue;
            }
            summary.failed += 1;
            if summary.failures.len() < FAILURE_SAMPLE_LIMIT {
                summary.failures.push(FailureSample {
                    device: device.to_string(),
                    error: error.unwrap_or("unknown error").to_string(),
                });
            }
        }
        summary
    }

    /// Summarize an in-memory result map without mutating it.
    pub fn from_results(results: &RunResults) -> Self {
        Self::collect(
            results
                .iter()
                .map(|(d, r)| (d.as_str(), r.ok(), r.error())),
        )
    }

    /// Summarize records read back from a JSONL file.
    pub fn from_records(records: &[DeviceRecord]) -> Self {
        let mut sorted: Vec<&DeviceRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.device.cmp(&b.device));
        Self::collect(
            sorted
                .into_iter()
                .map(|r| (r.device.as_str(), r.ok, r.error.as_deref())),
        )
    }

    /// Failures not listed in `failures`.
    pub fn overflow(&self) -> usize {
        self.failed.saturating_sub(self.failures.len())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | OK: {} | Failed: {}",
            self.total, self.ok, self.failed
        )?;
        if self.failures.is_empty() {
            return Ok(());
        }
        write!(f, "\n\nFailures:")?;
        for s in &self.failures {
            write!(f, "\n - {}: {}", s.device, s.error)?;
        }
        if self.overflow() > 0 {
            write!(f, "\n ... and {} more", self.overflow())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{DeviceResult, ResultAggregator};
    use serde_json::json;

    fn results(ok: usize, failed: usize) -> RunResults {
        let agg = ResultAggregator::new();
        for i in 0..ok {
            let d = format!("ok{:03}", i);
            agg.record(&d, DeviceResult::succeeded(d.clone(), 200, json!({}), vec![]));
        }
        for i in 0..failed {
            let d = format!("bad{:03}", i);
            agg.record(
                &d,
                DeviceResult::failed(d.clone(), None, format!("connect: refused {}", i), vec![]),
            );
        }
        agg.into_results()
    }

    #[test]
    fn counts_and_display_without_failures() {
        let s = results(3, 0).summary();
        assert_eq!((s.total, s.ok, s.failed), (3, 3, 0));
        assert_eq!(s.to_string(), "Total: 3 | OK: 3 | Failed: 0");
    }

    #[test]
    fn failure_sample_is_capped_with_overflow() {
        let s = results(1, 25).summary();
        assert_eq!(s.failed, 25);
        assert_eq!(s.failures.len(), FAILURE_SAMPLE_LIMIT);
        assert_eq!(s.overflow(), 5);
        assert_eq!(s.failures[0].device, "bad000");
        let text = s.to_string();
        assert!(text.starts_with("Total: 26 | OK: 1 | Failed: 25"));
        assert!(text.contains(" - bad000: connect: refused 0"));
        assert!(text.ends_with(" ... and 5 more"));
        assert_eq!(text.lines().filter(|l| l.starts_with(" - ")).count(), 20);
    }

    #[test]
    fn from_records_matches_from_results() {
        let r = results(2, 3);
        let mut records: Vec<DeviceRecord> = r
            .iter()
            .map(|(d, res)| DeviceRecord::from_result(d, res))
            .collect();
        records.reverse();
        assert_eq!(RunSummary::from_records(&records), r.summary());
    }
}
