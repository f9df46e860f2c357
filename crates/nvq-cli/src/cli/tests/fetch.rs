//! Tests for `nvq fetch` flags and how they layer over the config.

use super::parse_fetch;
use crate::cli::commands::{apply_overrides, collect_devices, resolve_api_path};
use crate::cli::{Cli, PresetArg};
use clap::Parser;
use nvq_core::config::{Credentials, FetchConfig, TlsMode};
use nvq_core::report::PayloadKind;
use std::io::Write;
use std::path::Path;

#[test]
fn cli_parse_fetch_defaults() {
    let args = parse_fetch(&["nvq", "fetch", "leaf1", "leaf2"]);
    assert_eq!(args.devices, vec!["leaf1", "leaf2"]);
    assert!(args.devices_file.is_none());
    assert_eq!(args.jsonl, Path::new("results.jsonl"));
    assert!(args.preset.is_none());
    assert_eq!(args.vni, 100);
    assert_eq!(args.vrf, "default");
    assert!(args.concurrency.is_none());
    assert!(!args.insecure);
    assert!(!args.detail);
}

#[test]
fn cli_parse_fetch_all_flags() {
    let args = parse_fetch(&[
        "nvq",
        "fetch",
        "--devices-file",
        "fabric.txt",
        "--jsonl",
        "out.jsonl",
        "--preset",
        "bgp-rib",
        "--vrf",
        "tenant1",
        "--port",
        "8443",
        "--concurrency",
        "50",
        "--retries",
        "1",
        "--deadline-secs",
        "30",
        "--username",
        "cumulus",
        "--password",
        "pw",
        "--insecure",
        "--detail",
    ]);
    assert!(args.devices.is_empty());
    assert_eq!(args.devices_file.as_deref(), Some(Path::new("fabric.txt")));
    assert_eq!(args.jsonl, Path::new("out.jsonl"));
    assert_eq!(args.preset, Some(PresetArg::BgpRib));
    assert_eq!(args.port, Some(8443));
    assert_eq!(args.concurrency, Some(50));
    assert_eq!(args.retries, Some(1));
    assert_eq!(args.deadline_secs, Some(30.0));
    assert!(args.insecure);
    assert!(args.detail);
}

#[test]
fn cli_parse_fetch_api_path_conflicts_with_preset() {
    let res = Cli::try_parse_from([
        "nvq",
        "fetch",
        "leaf1",
        "--preset",
        "mac",
        "--api-path",
        "/nvue_v1/interface",
    ]);
    assert!(res.is_err());
}

#[test]
fn preset_paths_resolve() {
    let mac = parse_fetch(&["nvq", "fetch", "leaf1", "--preset", "mac", "--vni", "200"]);
    assert_eq!(
        resolve_api_path(&mac).as_deref(),
        Some("/nvue_v1/evpn/vni/200/mac")
    );

    let rib = parse_fetch(&["nvq", "fetch", "leaf1", "--preset", "bgp-rib"]);
    assert_eq!(
        resolve_api_path(&rib).as_deref(),
        Some("/nvue_v1/vrf/default/router/bgp/address-family/l2vpn-evpn/loc-rib")
    );

    let explicit = parse_fetch(&["nvq", "fetch", "leaf1", "--api-path", "/nvue_v1/system"]);
    assert_eq!(resolve_api_path(&explicit).as_deref(), Some("/nvue_v1/system"));

    let none = parse_fetch(&["nvq", "fetch", "leaf1"]);
    assert!(resolve_api_path(&none).is_none());
}

#[test]
fn overrides_layer_over_config() {
    let mut cfg = FetchConfig {
        tls: TlsMode::Verify,
        ..FetchConfig::default()
    };
    let args = parse_fetch(&[
        "nvq",
        "fetch",
        "leaf1",
        "--preset",
        "mac",
        "--vni",
        "300",
        "--concurrency",
        "10",
        "--retries",
        "0",
        "--token",
        "tok",
        "--insecure",
    ]);
    apply_overrides(&mut cfg, &args);
    assert_eq!(cfg.api_path, "/nvue_v1/evpn/vni/300/mac");
    assert_eq!(cfg.concurrency, 10);
    assert_eq!(cfg.retry.retries, 0);
    assert_eq!(cfg.port, 8765);
    assert_eq!(cfg.tls, TlsMode::AcceptAny);
    assert_eq!(cfg.auth.credentials().unwrap(), Credentials::Bearer("tok".into()));
}

#[test]
fn overrides_keep_config_values_when_flags_absent() {
    let mut cfg = FetchConfig {
        api_path: "/nvue_v1/interface".into(),
        concurrency: 42,
        ..FetchConfig::default()
    };
    let args = parse_fetch(&["nvq", "fetch", "leaf1"]);
    apply_overrides(&mut cfg, &args);
    assert_eq!(cfg.api_path, "/nvue_v1/interface");
    assert_eq!(cfg.concurrency, 42);
    assert!(cfg.auth.username.is_none());
}

#[test]
fn devices_from_args_and_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# spines\nspine1\n\n  spine2  ").unwrap();
    let path = file.path().to_str().unwrap().to_string();
    let args = parse_fetch(&["nvq", "fetch", "leaf1", "--devices-file", path.as_str()]);
    assert_eq!(
        collect_devices(&args).unwrap(),
        vec!["leaf1", "spine1", "spine2"]
    );
}

#[test]
fn empty_or_unreadable_device_list_is_an_error() {
    let args = parse_fetch(&["nvq", "fetch"]);
    assert!(collect_devices(&args).is_err());

    let args = parse_fetch(&["nvq", "fetch", "--devices-file", "/nonexistent/nvq/devices.txt"]);
    let err = collect_devices(&args).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read device list"));
}

#[test]
fn detail_output_follows_resolved_api_path() {
    let rib = "/nvue_v1/vrf/default/router/bgp/address-family/l2vpn-evpn/loc-rib";

    let mut cfg = FetchConfig::default();
    let args = parse_fetch(&["nvq", "fetch", "leaf1", "--api-path", rib]);
    apply_overrides(&mut cfg, &args);
    assert_eq!(PayloadKind::for_api_path(&cfg.api_path), PayloadKind::EvpnLocRib);

    let mut cfg = FetchConfig {
        api_path: rib.into(),
        ..FetchConfig::default()
    };
    let args = parse_fetch(&["nvq", "fetch", "leaf1", "--detail"]);
    apply_overrides(&mut cfg, &args);
    assert_eq!(PayloadKind::for_api_path(&cfg.api_path), PayloadKind::EvpnLocRib);

    let args = parse_fetch(&["nvq", "fetch", "leaf1", "--preset", "mac"]);
    apply_overrides(&mut cfg, &args);
    assert_eq!(PayloadKind::for_api_path(&cfg.api_path), PayloadKind::MacTable);
}
