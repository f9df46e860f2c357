//! Device list loading.
//!
//! One hostname or address per line; blank lines and `#` comments are skipped.
//! An unreadable list is a startup error: nothing is queried.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Device identifier (hostname or address).
pub type Device = String;

/// Parse device identifiers from list text.
pub fn parse_devices(text: &str) -> Vec<Device> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a device list file.
pub fn load_devices_from_file(path: &Path) -> Result<Vec<Device>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read device list: {}", path.display()))?;
    Ok(parse_devices(&text))
}

/// Drop repeated identifiers, keeping the first occurrence and input order.
pub fn dedup_devices(devices: Vec<Device>) -> Vec<Device> {
    let mut seen = HashSet::with_capacity(devices.len());
    let mut out = Vec::with_capacity(devices.len());
    for d in devices {
        if seen.insert(d.clone()) {
            out.push(d);
        } else {
            tracing::warn!(device = %d, "duplicate device in input ignored");
        }
    }
    out
}
