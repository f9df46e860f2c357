//! JSON-lines sink: one self-describing record per device.
//!
//! The file is written to a temp file next to the destination and renamed
//! into place, so readers never observe a half-written result set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::{DeviceResult, ResultBody, RunResults, RunSummary};

/// Durable per-device record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u32>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceRecord {
    pub fn from_result(device: &str, result: &DeviceResult) -> Self {
        let (data, error) = match &result.body {
            ResultBody::Data(v) => (Some(v.clone()), None),
            ResultBody::Error(e) => (None, Some(e.clone())),
        };
        Self {
            device: device.to_string(),
            ok: result.ok(),
            status: result.status,
            url: result.url.clone(),
            data,
            error,
        }
    }
}

/// Write one line per device (device order) to `path` and return the run summary.
pub fn write_jsonl(path: &Path, results: &RunResults) -> Result<RunSummary> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        for (device, result) in results {
            serde_json::to_writer(&mut w, &DeviceRecord::from_result(device, result))
                .with_context(|| format!("failed to encode record for {}", device))?;
            w.write_all(b"\n")?;
        }
        w.flush().context("failed to flush results")?;
    }
    tmp.as_file().sync_all().context("results sync failed")?;
    tmp.persist(path)
        .with_context(|| format!("failed to write results to {}", path.display()))?;
    tracing::info!(path = %path.display(), devices = results.len(), "results written");
    Ok(results.summary())
}

/// Read records back from a JSONL file written by [`write_jsonl`]. Blank lines are skipped.
pub fn read_jsonl(path: &Path) -> Result<Vec<DeviceRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DeviceRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), n + 1))?;
        records.push(record);
    }
    Ok(records)
}
