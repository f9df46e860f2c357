use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Largest accepted value for any seconds setting (one week).
pub const MAX_SECS: f64 = 7.0 * 24.0 * 3600.0;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (a device gets at most `retries + 1` attempts).
    pub retries: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub backoff_base_secs: f64,
    /// Upper bound (exclusive) of the uniform jitter added to each backoff, in seconds.
    pub jitter_max_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_base_secs: 0.5,
            jitter_max_secs: 0.25,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            base_delay: secs(self.backoff_base_secs),
            jitter_max: secs(self.jitter_max_secs),
        }
    }
}

/// Credentials section. Never defaulted: either `username` + `password` or `token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Bearer token used instead of basic auth when set.
    pub token: Option<String>,
}

/// Credentials resolved from [`AuthConfig`].
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

impl AuthConfig {
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::Bearer(token.to_string()));
        }
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() => Ok(Credentials::Basic {
                username: u.to_string(),
                password: p.to_string(),
            }),
            (Some(_), None) => bail!("auth.password is required when auth.username is set"),
            _ => bail!("no credentials configured: set auth.username/auth.password or auth.token"),
        }
    }
}

/// TLS trust policy for device certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TlsMode {
    /// Verify the peer certificate chain and hostname.
    Verify,
    /// Accept any certificate (lab fabrics with self-signed certs).
    #[default]
    AcceptAny,
}

/// Global configuration loaded from `~/.config/nvq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// URL scheme for the management API.
    pub scheme: String,
    /// Management API port on every device.
    pub port: u16,
    /// API path requested on every device (must start with `/`).
    pub api_path: String,
    /// Maximum devices queried at once.
    pub concurrency: usize,
    /// Per-attempt TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: f64,
    /// Per-attempt read timeout in seconds (no bytes received for this long aborts the attempt).
    pub read_timeout_secs: f64,
    /// Wall-clock deadline for the whole run in seconds.
    pub run_deadline_secs: f64,
    /// Lifetime of cached DNS entries in seconds.
    pub dns_cache_secs: u64,
    pub tls: TlsMode,
    /// Optional CA bundle used when `tls = "verify"`.
    pub ca_bundle: Option<PathBuf>,
    pub retry: RetryConfig,
    pub auth: AuthConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            port: 8765,
            api_path: "/nvue_v1/evpn/vni/100/mac".to_string(),
            concurrency: 300,
            connect_timeout_secs: 5.0,
            read_timeout_secs: 10.0,
            run_deadline_secs: 120.0,
            dns_cache_secs: 300,
            tls: TlsMode::default(),
            ca_bundle: None,
            retry: RetryConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        secs(self.read_timeout_secs)
    }

    pub fn run_deadline(&self) -> Duration {
        secs(self.run_deadline_secs)
    }

    pub fn dns_cache(&self) -> Duration {
        Duration::from_secs(self.dns_cache_secs)
    }

    /// Reject values the orchestrator cannot run with. Credentials are checked
    /// separately by [`AuthConfig::credentials`].
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.port == 0 {
            bail!("port must be non-zero");
        }
        if !self.api_path.starts_with('/') {
            bail!("api_path must start with '/': {}", self.api_path);
        }
        if self.scheme != "https" && self.scheme != "http" {
            bail!("unsupported scheme: {}", self.scheme);
        }
        for (name, v) in [
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("read_timeout_secs", self.read_timeout_secs),
            ("run_deadline_secs", self.run_deadline_secs),
        ] {
            if !(v.is_finite() && v > 0.0 && v <= MAX_SECS) {
                bail!("{} must be between 0 and {} seconds, got {}", name, MAX_SECS, v);
            }
        }
        for (name, v) in [
            ("retry.backoff_base_secs", self.retry.backoff_base_secs),
            ("retry.jitter_max_secs", self.retry.jitter_max_secs),
        ] {
            if !(v.is_finite() && v >= 0.0 && v <= MAX_SECS) {
                bail!("{} must be between 0 and {} seconds, got {}", name, MAX_SECS, v);
            }
        }
        Ok(())
    }
}

/// Seconds as f64 to Duration; negative or NaN values become zero, values too
/// large for a Duration saturate.
fn secs(v: f64) -> Duration {
    if v.is_nan() || v <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(v).unwrap_or(Duration::MAX)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("nvq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<FetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: FetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
