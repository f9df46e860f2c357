//! Query target: the URL template instantiated once per device.

use anyhow::{bail, Context, Result};
use std::fmt;

use crate::config::FetchConfig;

/// Canned NVUE queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preset {
    /// EVPN MAC table for one VNI.
    EvpnMac { vni: u32 },
    /// BGP l2vpn-evpn loc-RIB of one VRF.
    BgpEvpnLocRib { vrf: String },
}

impl Preset {
    pub fn api_path(&self) -> String {
        match self {
            Preset::EvpnMac { vni } => format!("/nvue_v1/evpn/vni/{}/mac", vni),
            Preset::BgpEvpnLocRib { vrf } => format!(
                "/nvue_v1/vrf/{}/router/bgp/address-family/l2vpn-evpn/loc-rib",
                vrf
            ),
        }
    }
}

/// `{scheme}://{device}:{port}{api_path}`, constant for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    scheme: String,
    port: u16,
    api_path: String,
}

impl QueryTarget {
    pub fn new(scheme: &str, port: u16, api_path: &str) -> Result<Self> {
        if !api_path.starts_with('/') {
            bail!("api path must start with '/': {}", api_path);
        }
        let target = Self {
            scheme: scheme.to_string(),
            port,
            api_path: api_path.to_string(),
        };
        let probe = target.url_for("device.invalid");
        let parsed = url::Url::parse(&probe).with_context(|| format!("invalid query target: {}", probe))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            bail!("unsupported scheme: {}", parsed.scheme());
        }
        Ok(target)
    }

    pub fn from_config(cfg: &FetchConfig) -> Result<Self> {
        Self::new(&cfg.scheme, cfg.port, &cfg.api_path)
    }

    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// Request URL for one device. IPv6 literals are bracketed.
    pub fn url_for(&self, device: &str) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme,
            bracket_ipv6(device),
            self.port,
            self.api_path
        )
    }

    /// Check that `url` is well formed and that its host is `device` itself.
    ///
    /// A device identifier carrying URL syntax (`/`, `?`, `#`, `@`, ...) would
    /// otherwise move the request, credentials included, to another host.
    pub fn check_url(url: &str, device: &str) -> Result<()> {
        let host = device_host(device)?;
        let parsed = url::Url::parse(url).with_context(|| format!("invalid URL: {}", url))?;
        let expected = host.to_string();
        if parsed.host_str() != Some(expected.as_str()) {
            bail!(
                "URL host {:?} does not match device {}",
                parsed.host_str().unwrap_or(""),
                device
            );
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            bail!("URL for device {} carries user info", device);
        }
        Ok(())
    }
}

/// Parse a device identifier as a URL host (domain, IPv4 or IPv6 literal).
pub fn device_host(device: &str) -> Result<url::Host> {
    if device.is_empty() {
        bail!("empty device identifier");
    }
    url::Host::parse(&bracket_ipv6(device))
        .with_context(|| format!("invalid device identifier: {:?}", device))
}

fn bracket_ipv6(device: &str) -> String {
    if device.contains(':') && !device.starts_with('[') {
        format!("[{}]", device)
    } else {
        device.to_string()
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{{device}}:{}{}", self.scheme, self.port, self.api_path)
    }
}
