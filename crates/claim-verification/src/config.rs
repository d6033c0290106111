//! # Claim Verification Configuration
//!
//! Tunables of the verification workflow.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{DEFAULT_CLAIM_TTL_SECS, DEFAULT_DELIVERY_TIMEOUT_MS, DEFAULT_SWEEP_INTERVAL_SECS};

/// Longest accepted claim TTL (one year).
pub const MAX_CLAIM_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Claim TTL must be positive.
    #[error("claim_ttl_secs must be greater than zero")]
    ZeroTtl,

    /// Delivery timeout must be positive.
    #[error("delivery_timeout_ms must be greater than zero")]
    ZeroDeliveryTimeout,

    /// Claim TTL above one year.
    #[error("claim_ttl_secs must not exceed one year")]
    TtlTooLong,

    /// Sweep interval must be positive.
    #[error("sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,
}

/// Verification workflow configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimVerificationConfig {
    /// Validity window of an emailed token, in seconds.
    pub claim_ttl_secs: u64,

    /// Upper bound on one email dispatch, in milliseconds.
    pub delivery_timeout_ms: u64,

    /// Interval of the optional expired-claim sweep, in seconds.
    pub sweep_interval_secs: u64,

    /// Subject line of the claim email.
    pub email_subject: String,
}

impl Default for ClaimVerificationConfig {
    fn default() -> Self {
        Self {
            claim_ttl_secs: DEFAULT_CLAIM_TTL_SECS,
            delivery_timeout_ms: DEFAULT_DELIVERY_TIMEOUT_MS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            email_subject: "Verify ownership of your listing".to_string(),
        }
    }
}

impl ClaimVerificationConfig {
    /// Create a config for testing (short timeouts).
    pub fn for_testing() -> Self {
        Self {
            claim_ttl_secs: 60,
            delivery_timeout_ms: 200,
            sweep_interval_secs: 1,
            ..Self::default()
        }
    }

    /// Token validity window.
    pub fn claim_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.claim_ttl_secs.min(MAX_CLAIM_TTL_SECS) as i64)
    }

    /// Email dispatch bound.
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    /// Sweep period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Reject values that would break the workflow.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.claim_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.claim_ttl_secs > MAX_CLAIM_TTL_SECS {
            return Err(ConfigError::TtlTooLong);
        }
        if self.delivery_timeout_ms == 0 {
            return Err(ConfigError::ZeroDeliveryTimeout);
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }
}
