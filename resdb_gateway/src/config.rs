//! Gateway configuration from environment (or CLI) with startup validation

use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_RESDB_URL: &str = "http://localhost:18000";
pub const DEFAULT_API_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Validation result for configuration checks
#[derive(Debug)]
pub struct ConfigValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    fn new() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn add_warning(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    fn add_error(&mut self, msg: String) {
        self.errors.push(msg);
        self.valid = false;
    }

    pub fn print_summary(&self) {
        if !self.warnings.is_empty() {
            warn!("⚠️  Configuration Warnings:");
            for w in &self.warnings {
                warn!("   - {}", w);
            }
        }

        if !self.errors.is_empty() {
            error!("❌ Configuration Errors:");
            for e in &self.errors {
                error!("   - {}", e);
            }
        }

        if self.valid && self.warnings.is_empty() {
            info!("✅ Configuration validation passed");
        }
    }
}

/// Which ledger implementation backs the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    Http,
    Memory,
}

impl LedgerMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "http" | "resdb" | "remote" => Some(LedgerMode::Http),
            "memory" | "mem" | "inmemory" => Some(LedgerMode::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub resdb_url: String,
    pub api_addr: SocketAddr,
    pub ledger_mode: LedgerMode,
    pub http_timeout: Duration,
}

impl GatewayConfig {
    /// Load from process environment
    pub fn from_env() -> (Self, ConfigValidation) {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup. Invalid values fall back to defaults and
    /// are reported as errors in the returned validation.
    pub fn from_lookup<F>(lookup: F) -> (Self, ConfigValidation)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut validation = ConfigValidation::new();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let resdb_url = get("RESDB_URL").unwrap_or_else(|| DEFAULT_RESDB_URL.into());
        validate_resdb_url(&resdb_url, &mut validation);

        let api_addr = parse_api_addr(get("API_ADDR"), &mut validation);
        let ledger_mode = parse_ledger_mode(get("LEDGER_MODE"), &mut validation);
        let http_timeout = parse_timeout(get("HTTP_TIMEOUT_SECS"), &mut validation);

        let config = GatewayConfig {
            resdb_url,
            api_addr,
            ledger_mode,
            http_timeout,
        };
        (config, validation)
    }
}

fn validate_resdb_url(url: &str, validation: &mut ConfigValidation) {
    if url.starts_with("https://") {
        info!("✓ RESDB_URL configured ({})", url);
    } else if url.starts_with("http://") {
        info!("✓ RESDB_URL configured ({})", url);
        if !url.contains("localhost") && !url.contains("127.0.0.1") {
            validation.add_warning(format!(
                "RESDB_URL {} is a remote ledger over plain HTTP - signed payloads travel unencrypted",
                url
            ));
        }
    } else if url.contains("://") {
        validation.add_error(format!(
            "RESDB_URL has unsupported scheme: '{}' (expected http:// or https://)",
            url
        ));
    } else {
        validation.add_warning(format!(
            "RESDB_URL '{}' has no scheme - assuming http://",
            url
        ));
    }
}

fn parse_api_addr(raw: Option<String>, validation: &mut ConfigValidation) -> SocketAddr {
    let default: SocketAddr = DEFAULT_API_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8000)));
    match raw {
        None => default,
        Some(addr) => match addr.trim().parse::<SocketAddr>() {
            Ok(parsed) => parsed,
            Err(_) => {
                validation.add_error(format!(
                    "API_ADDR has invalid format: '{}' (expected IP:PORT)",
                    addr
                ));
                default
            }
        },
    }
}

fn parse_ledger_mode(raw: Option<String>, validation: &mut ConfigValidation) -> LedgerMode {
    let mode = match raw {
        None => LedgerMode::Http,
        Some(m) => match LedgerMode::parse(&m) {
            Some(mode) => mode,
            None => {
                validation.add_error(format!(
                    "LEDGER_MODE '{}' is not one of: http, memory",
                    m
                ));
                LedgerMode::Http
            }
        },
    };
    if mode == LedgerMode::Memory {
        validation.add_warning(
            "LEDGER_MODE=memory - transactions live in process memory and vanish on restart".into(),
        );
    }
    mode
}

fn parse_timeout(raw: Option<String>, validation: &mut ConfigValidation) -> Duration {
    let default = Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS);
    match raw.map(|v| v.trim().parse::<u64>()) {
        None => default,
        Some(Ok(0)) | Some(Err(_)) => {
            validation.add_error("HTTP_TIMEOUT_SECS must be a positive number of seconds".into());
            default
        }
        Some(Ok(secs)) => {
            if secs > 300 {
                validation.add_warning(format!(
                    "HTTP_TIMEOUT_SECS is very high ({}) - slow ledgers will hold requests open",
                    secs
                ));
            }
            Duration::from_secs(secs)
        }
    }
}
