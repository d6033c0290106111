//! Runtime configuration.
//!
//! Resolution order: defaults, then the optional TOML file, then environment
//! variables, then validation.
//!
//! # Environment Variables
//!
//! - `CLAIMS_HTTP_ADDR`: gateway bind address (default: 0.0.0.0:8080)
//! - `CLAIMS_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `CLAIMS_DATA_PATH`: snapshot file of the document store (default: memory only)
//! - `CLAIMS_CLAIM_TTL_SECS`: token validity (default: 86400)
//! - `CLAIMS_DELIVERY_TIMEOUT_MS`: email dispatch bound (default: 5000)
//! - `CLAIMS_SWEEP_INTERVAL_SECS`: expired-claim sweep period (default: 3600)
//! - `CLAIMS_REDEEM_BASE_URL`: public base URL of redeem links
//! - `CLAIMS_LOG_LEVEL`: log filter when `RUST_LOG` is unset (default: info)
//! - `CLAIMS_JSON_LOGS`: JSON log output (default: false)
//! - `BREVO_API_KEY`, `BREVO_SENDER_EMAIL`, `BREVO_SENDER_NAME`: Brevo mailer

use claim_verification::{ClaimVerificationConfig, MailerConfig, StoreConfig};
use claims_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// JSON output for containers
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Workflow tunables
    pub claims: ClaimVerificationConfig,
    /// Document store
    pub store: StoreConfig,
    /// HTTP gateway
    pub gateway: GatewayConfig,
    /// Email delivery
    pub mailer: MailerConfig,
    /// Logging
    pub log: LogConfig,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Config file
        path: PathBuf,
        /// OS error
        source: std::io::Error,
    },

    /// File is not valid TOML for this shape
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Decoder error
        source: toml::de::Error,
    },

    /// Environment variable with an unusable value
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// Workflow settings rejected
    #[error(transparent)]
    Claims(#[from] claim_verification::ConfigError),

    /// Gateway settings rejected
    #[error(transparent)]
    Gateway(#[from] claims_gateway::ConfigError),
}

impl RuntimeConfig {
    /// Load from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, RuntimeConfigError> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing sections fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, RuntimeConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuntimeConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| RuntimeConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), RuntimeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = parsed(&lookup, "CLAIMS_HTTP_ADDR")? {
            self.gateway.http_addr = addr;
        }
        if let Some(secs) = parsed(&lookup, "CLAIMS_REQUEST_TIMEOUT_SECS")? {
            self.gateway.request_timeout_secs = secs;
        }
        if let Some(path) = non_empty(&lookup, "CLAIMS_DATA_PATH") {
            self.store.data_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = parsed(&lookup, "CLAIMS_CLAIM_TTL_SECS")? {
            self.claims.claim_ttl_secs = secs;
        }
        if let Some(ms) = parsed(&lookup, "CLAIMS_DELIVERY_TIMEOUT_MS")? {
            self.claims.delivery_timeout_ms = ms;
        }
        if let Some(secs) = parsed(&lookup, "CLAIMS_SWEEP_INTERVAL_SECS")? {
            self.claims.sweep_interval_secs = secs;
        }
        if let Some(url) = non_empty(&lookup, "CLAIMS_REDEEM_BASE_URL") {
            self.mailer.redeem_base_url = url;
        }
        if let Some(level) = non_empty(&lookup, "CLAIMS_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(raw) = non_empty(&lookup, "CLAIMS_JSON_LOGS") {
            self.log.json = parse_flag("CLAIMS_JSON_LOGS", raw)?;
        }
        if let Some(key) = non_empty(&lookup, "BREVO_API_KEY") {
            self.mailer.brevo_api_key = key;
        }
        if let Some(sender) = non_empty(&lookup, "BREVO_SENDER_EMAIL") {
            self.mailer.sender_email = sender;
        }
        if let Some(name) = non_empty(&lookup, "BREVO_SENDER_NAME") {
            self.mailer.sender_name = Some(name);
        }
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        self.claims.validate()?;
        self.gateway.validate()?;
        Ok(())
    }

    /// Config for tests: memory-only store, loopback gateway, short timeouts.
    pub fn for_testing() -> Self {
        Self {
            claims: ClaimVerificationConfig::for_testing(),
            store: StoreConfig::in_memory(),
            gateway: GatewayConfig::for_testing(),
            mailer: MailerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, RuntimeConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, var) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| RuntimeConfigError::InvalidEnv { var, value }),
        None => Ok(None),
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, RuntimeConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(RuntimeConfigError::InvalidEnv { var, value }),
    }
}
