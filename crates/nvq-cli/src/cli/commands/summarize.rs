//! `nvq summarize` – recompute the run summary from a results file.

use anyhow::Result;
use nvq_core::results::{read_jsonl, RunSummary};
use std::path::Path;

pub(crate) fn load_summary(path: &Path) -> Result<RunSummary> {
    let records = read_jsonl(path)?;
    Ok(RunSummary::from_records(&records))
}

pub fn run_summarize(path: &Path) -> Result<()> {
    println!("{}", load_summary(path)?);
    Ok(())
}
