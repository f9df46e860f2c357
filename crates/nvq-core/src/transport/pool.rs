//! Pool of reusable libcurl easy handles.
//!
//! A curl easy handle keeps its connection cache and DNS cache between
//! transfers, so checking handles out and back in gives connection reuse per
//! device without exposing any locking to callers.

use anyhow::Result;
use curl::easy::{Auth, Easy, List};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::{Credentials, FetchConfig, TlsMode};

use super::{RawResponse, Request, Transport, TransportError, TransportErrorKind};

/// Below this, libcurl would read a zero timeout as "no timeout".
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(1);

/// Transport settings fixed for a run.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub connect_timeout: Duration,
    /// Abort an attempt when no bytes arrive for this long.
    pub read_timeout: Duration,
    pub dns_cache: Duration,
    pub tls: TlsMode,
    pub ca_bundle: Option<PathBuf>,
    pub credentials: Credentials,
    /// Idle handles kept for reuse (normally the concurrency ceiling).
    pub max_idle: usize,
}

impl PoolOptions {
    pub fn from_config(cfg: &FetchConfig) -> Result<Self> {
        Ok(Self {
            connect_timeout: cfg.connect_timeout(),
            read_timeout: cfg.read_timeout(),
            dns_cache: cfg.dns_cache(),
            tls: cfg.tls,
            ca_bundle: cfg.ca_bundle.clone(),
            credentials: cfg.auth.credentials()?,
            max_idle: cfg.concurrency.max(1),
        })
    }

    /// Hard cap for one attempt: connect plus read budget.
    fn attempt_cap(&self) -> Duration {
        self.connect_timeout.saturating_add(self.read_timeout)
    }
}

/// Shared, concurrently usable curl transport.
pub struct CurlPool {
    opts: PoolOptions,
    idle: Mutex<Vec<Easy>>,
}

impl CurlPool {
    pub fn new(opts: PoolOptions) -> Self {
        curl::init();
        Self {
            opts,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Number of idle handles currently pooled.
    pub fn idle_handles(&self) -> usize {
        self.idle.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn checkout(&self) -> Result<Easy, TransportError> {
        let pooled = self.idle.lock().unwrap_or_else(|e| e.into_inner()).pop();
        match pooled {
            Some(easy) => Ok(easy),
            None => self.new_handle().map_err(|e| {
                TransportError::new(TransportErrorKind::Setup, format!("curl handle setup: {}", e))
            }),
        }
    }

    fn checkin(&self, easy: Easy) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        if idle.len() < self.opts.max_idle {
            idle.push(easy);
        }
    }

    /// Build a handle with every per-run option applied. Only the URL and the
    /// total timeout change between requests.
    fn new_handle(&self) -> Result<Easy, curl::Error> {
        let opts = &self.opts;
        let mut easy = Easy::new();
        easy.connect_timeout(opts.connect_timeout)?;
        easy.low_speed_limit(1)?;
        easy.low_speed_time(opts.read_timeout)?;
        easy.dns_cache_timeout(opts.dns_cache)?;
        easy.tcp_keepalive(true)?;
        easy.follow_location(false)?;

        let verify = opts.tls == TlsMode::Verify;
        easy.ssl_verify_peer(verify)?;
        easy.ssl_verify_host(verify)?;
        if let Some(ca) = &opts.ca_bundle {
            easy.cainfo(ca)?;
        }

        let mut list = List::new();
        list.append("Accept: application/json")?;
        match &opts.credentials {
            Credentials::Basic { username, password } => {
                easy.username(username)?;
                easy.password(password)?;
                let mut auth = Auth::new();
                auth.basic(true);
                easy.http_auth(&auth)?;
            }
            Credentials::Bearer(token) => {
                list.append(&format!("Authorization: Bearer {}", token))?;
            }
        }
        easy.http_headers(list)?;
        Ok(easy)
    }

    fn perform(&self, easy: &mut Easy, request: &Request) -> Result<RawResponse, TransportError> {
        let setup = |e: curl::Error| TransportError::new(TransportErrorKind::Setup, e.to_string());

        let mut timeout = self.opts.attempt_cap();
        if let Some(deadline) = request.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining < MIN_ATTEMPT_TIMEOUT {
                return Err(TransportError::deadline_exceeded());
            }
            timeout = timeout.min(remaining);
        }
        easy.timeout(timeout).map_err(setup)?;
        easy.url(&request.url).map_err(setup)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(setup)?;
            if let Err(e) = transfer.perform() {
                let past_deadline = request.deadline.is_some_and(|d| Instant::now() >= d);
                if e.is_operation_timedout() && past_deadline {
                    return Err(TransportError::deadline_exceeded());
                }
                return Err(TransportError::new(classify_curl_error(&e), e.to_string()));
            }
        }

        let status = easy
            .response_code()
            .map_err(|e| TransportError::new(TransportErrorKind::Other, e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}

impl Transport for CurlPool {
    fn get(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let mut easy = self.checkout()?;
        let res = self.perform(&mut easy, request);
        self.checkin(easy);
        res
    }
}

/// Map a curl error to a transport error kind.
pub fn classify_curl_error(e: &curl::Error) -> TransportErrorKind {
    if e.is_operation_timedout() {
        return TransportErrorKind::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return TransportErrorKind::Dns;
    }
    if e.is_couldnt_connect() {
        return TransportErrorKind::Connect;
    }
    if e.is_ssl_connect_error() || e.is_peer_failed_verification() {
        return TransportErrorKind::Tls;
    }
    if e.is_read_error() || e.is_recv_error() || e.is_send_error() || e.is_got_nothing() {
        return TransportErrorKind::Io;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return TransportErrorKind::Setup;
    }
    TransportErrorKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> PoolOptions {
        PoolOptions {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            dns_cache: Duration::from_secs(300),
            tls: TlsMode::AcceptAny,
            ca_bundle: None,
            credentials: Credentials::Basic {
                username: "cumulus".into(),
                password: "pw".into(),
            },
            max_idle: 2,
        }
    }

    #[test]
    fn attempt_cap_is_connect_plus_read() {
        assert_eq!(opts().attempt_cap(), Duration::from_secs(15));
    }

    #[test]
    fn options_from_config_require_credentials() {
        let cfg = FetchConfig::default();
        assert!(PoolOptions::from_config(&cfg).is_err());

        let mut cfg = FetchConfig::default();
        cfg.auth.token = Some("t".into());
        cfg.concurrency = 7;
        let o = PoolOptions::from_config(&cfg).unwrap();
        assert_eq!(o.max_idle, 7);
        assert_eq!(o.connect_timeout, Duration::from_secs(5));
        assert_eq!(o.credentials, Credentials::Bearer("t".into()));
    }

    #[test]
    fn expired_deadline_fails_without_network() {
        let pool = CurlPool::new(opts());
        let req = Request {
            url: "https://leaf1:8765/nvue_v1/".into(),
            deadline: Some(Instant::now()),
        };
        let err = pool.get(&req).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::DeadlineExceeded);
        // The handle went back to the pool.
        assert_eq!(pool.idle_handles(), 1);
    }

    #[test]
    fn idle_pool_is_capped() {
        let pool = CurlPool::new(opts());
        for _ in 0..4 {
            let easy = pool.checkout().unwrap();
            pool.checkin(easy);
        }
        assert_eq!(pool.idle_handles(), 1);
        let a = pool.checkout().unwrap();
        let b = pool.checkout().unwrap();
        let c = pool.checkout().unwrap();
        pool.checkin(a);
        pool.checkin(b);
        pool.checkin(c);
        assert_eq!(pool.idle_handles(), 2);
    }
}
