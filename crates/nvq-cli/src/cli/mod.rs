//! CLI for nvq fleet queries.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{run_completions, run_fetch, run_summarize};

/// Top-level CLI for nvq.
#[derive(Debug, Parser)]
#[command(name = "nvq")]
#[command(about = "nvq: query the NVUE REST API on every switch of a fabric", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Query every device and write one JSON line per device.
    Fetch(FetchArgs),

    /// Recompute the run summary from a results file.
    Summarize {
        /// JSON-lines file written by `nvq fetch`.
        path: PathBuf,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Canned queries selectable with `--preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// EVPN MAC table of one VNI.
    Mac,
    /// BGP l2vpn-evpn loc-RIB of one VRF.
    BgpRib,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Device hostnames or addresses.
    pub devices: Vec<String>,

    /// Read devices from a file (one per line, `#` comments allowed).
    #[arg(long, value_name = "FILE")]
    pub devices_file: Option<PathBuf>,

    /// Output file for per-device JSON lines.
    #[arg(long, value_name = "FILE", default_value = "results.jsonl")]
    pub jsonl: PathBuf,

    /// Config file to use instead of ~/.config/nvq/config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// VNI for the `mac` preset.
    #[arg(long, default_value_t = 100)]
    pub vni: u32,

    /// VRF for the `bgp-rib` preset.
    #[arg(long, default_value = "default")]
    pub vrf: String,

    /// Explicit API path (e.g. /nvue_v1/interface); overrides the config file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub api_path: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Maximum devices queried at once.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Retries per device after the first attempt.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Wall-clock budget for the whole run, in seconds.
    #[arg(long, value_name = "SECS")]
    pub deadline_secs: Option<f64>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Bearer token (used instead of username/password).
    #[arg(long)]
    pub token: Option<String>,

    /// Accept any device certificate, even if the config says `tls = "verify"`.
    #[arg(long)]
    pub insecure: bool,

    /// Print per-device MACs (mac preset) or type-2 routes (bgp-rib preset).
    #[arg(long)]
    pub detail: bool,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch(args) => run_fetch(args).await?,
            CliCommand::Summarize { path } => run_summarize(&path)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
