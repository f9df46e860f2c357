//! `nvq fetch` – query every device and write the results file.

use anyhow::{bail, Context, Result};
use nvq_core::config::{self, FetchConfig, TlsMode};
use nvq_core::device::{load_devices_from_file, Device};
use nvq_core::fetch::{FetchProgress, Orchestrator};
use nvq_core::report::{evpn_type2_routes, mac_line, PayloadKind};
use nvq_core::results::{write_jsonl, RunResults};
use nvq_core::target::Preset;
use std::time::Instant;

use crate::cli::{FetchArgs, PresetArg};

const PROGRESS_INTERVAL_MS: u64 = 500;

/// API path selected by the flags, if any. `--api-path` and `--preset` are exclusive.
pub(crate) fn resolve_api_path(args: &FetchArgs) -> Option<String> {
    if let Some(path) = &args.api_path {
        return Some(path.clone());
    }
    let preset = match args.preset? {
        PresetArg::Mac => Preset::EvpnMac { vni: args.vni },
        PresetArg::BgpRib => Preset::BgpEvpnLocRib {
            vrf: args.vrf.clone(),
        },
    };
    Some(preset.api_path())
}

/// Layer command-line flags over the loaded configuration.
pub(crate) fn apply_overrides(cfg: &mut FetchConfig, args: &FetchArgs) {
    if let Some(path) = resolve_api_path(args) {
        cfg.api_path = path;
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    if let Some(n) = args.concurrency {
        cfg.concurrency = n;
    }
    if let Some(n) = args.retries {
        cfg.retry.retries = n;
    }
    if let Some(secs) = args.deadline_secs {
        cfg.run_deadline_secs = secs;
    }
    if args.username.is_some() {
        cfg.auth.username = args.username.clone();
    }
    if args.password.is_some() {
        cfg.auth.password = args.password.clone();
    }
    if args.token.is_some() {
        cfg.auth.token = args.token.clone();
    }
    if args.insecure {
        cfg.tls = TlsMode::AcceptAny;
    }
}

/// Positional devices followed by the devices file. An empty list is an error.
pub(crate) fn collect_devices(args: &FetchArgs) -> Result<Vec<Device>> {
    let mut devices = args.devices.clone();
    if let Some(path) = &args.devices_file {
        devices.extend(load_devices_from_file(path)?);
    }
    if devices.is_empty() {
        bail!("no devices given: pass DEVICE arguments or --devices-file");
    }
    Ok(devices)
}

pub async fn run_fetch(args: FetchArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    apply_overrides(&mut cfg, &args);
    tracing::debug!(
        api_path = %cfg.api_path,
        port = cfg.port,
        concurrency = cfg.concurrency,
        retries = cfg.retry.retries,
        tls = ?cfg.tls,
        "effective config"
    );

    let devices = collect_devices(&args)?;
    let orchestrator = Orchestrator::from_config(&cfg)?;
    println!(
        "Querying {} device(s): {}",
        devices.len(),
        orchestrator.target()
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<FetchProgress>(64);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        let mut printed = false;
        while let Some(p) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || p.is_done()
            {
                eprint!(
                    "\r  {}/{} devices ({:.1}%)  ok {}  failed {}  {:.1} dev/s  ",
                    p.completed,
                    p.total,
                    p.fraction() * 100.0,
                    p.ok,
                    p.failed,
                    p.devices_per_sec()
                );
                last_print = now;
                printed = true;
            }
        }
        if printed {
            eprintln!();
        }
    });

    let results = orchestrator
        .run_with_progress(devices, Some(progress_tx))
        .await;
    let _ = progress_handle.await;

    let summary = write_jsonl(&args.jsonl, &results)
        .with_context(|| format!("failed to save results to {}", args.jsonl.display()))?;

    if args.detail {
        print_detail(&results, PayloadKind::for_api_path(&cfg.api_path));
    }
    println!("{}", summary);
    println!("Results written to {}", args.jsonl.display());
    Ok(())
}

fn print_detail(results: &RunResults, kind: PayloadKind) {
    for (device, result) in results {
        let Some(data) = result.data() else {
            continue;
        };
        if kind == PayloadKind::MacTable {
            println!("{}", mac_line(device, data));
            continue;
        }
        let blocks = evpn_type2_routes(data);
        if blocks.is_empty() {
            println!("{} has no type-2 routes", device);
        }
        for block in blocks {
            println!("{} {}: {}", device, block.rd, block.routes);
        }
    }
}
