//! CLI command handlers, one file per command.

mod completions;
mod fetch;
mod summarize;

pub use completions::run_completions;
pub use fetch::run_fetch;
pub use summarize::run_summarize;

#[cfg(test)]
pub(crate) use fetch::{apply_overrides, collect_devices, resolve_api_path};
#[cfg(test)]
pub(crate) use summarize::load_summary;
