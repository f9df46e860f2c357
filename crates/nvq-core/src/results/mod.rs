//! Per-device results, their aggregation, and the durable sink.

mod aggregator;
mod sink;
mod summary;

pub use aggregator::{ResultAggregator, RunResults};
pub use sink::{read_jsonl, write_jsonl, DeviceRecord};
pub use summary::{FailureSample, RunSummary, FAILURE_SAMPLE_LIMIT};

use serde_json::Value;
use std::time::SystemTime;

/// One request/response cycle for a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// 0-based, strictly increasing per device.
    pub index: u32,
    pub started_at: SystemTime,
    pub status: Option<u32>,
    pub error: Option<String>,
}

/// Decoded payload of a successful device, or the error of a failed one.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    Data(Value),
    Error(String),
}

/// Terminal outcome for one device. Created once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceResult {
    pub url: String,
    /// HTTP status of the last attempt, if the device answered.
    pub status: Option<u32>,
    pub body: ResultBody,
    pub attempts: Vec<Attempt>,
}

impl DeviceResult {
    pub fn succeeded(url: String, status: u32, data: Value, attempts: Vec<Attempt>) -> Self {
        Self {
            url,
            status: Some(status),
            body: ResultBody::Data(data),
            attempts,
        }
    }

    pub fn failed(
        url: String,
        status: Option<u32>,
        error: impl Into<String>,
        attempts: Vec<Attempt>,
    ) -> Self {
        Self {
            url,
            status,
            body: ResultBody::Error(error.into()),
            attempts,
        }
    }

    pub fn ok(&self) -> bool {
        matches!(self.body, ResultBody::Data(_))
    }

    pub fn data(&self) -> Option<&Value> {
        match &self.body {
            ResultBody::Data(v) => Some(v),
            ResultBody::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.body {
            ResultBody::Data(_) => None,
            ResultBody::Error(e) => Some(e),
        }
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}
