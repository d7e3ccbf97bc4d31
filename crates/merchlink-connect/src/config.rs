//! # Connector Configuration
//!
//! Configuration for a connector context.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MERCHLINK_ENVIRONMENT=sandbox                                      │
//! │     MERCHLINK_REQUEST_TIMEOUT_SECS=15                                  │
//! │     MERCHLINK_CACHE_TTL_SECS=120                                       │
//! │                                                                         │
//! │  2. TOML Config File (path supplied by the embedding application)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     sandbox host, 10s timeouts, 5 min cache TTL, 3 retries             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # merchlink.toml
//! [host]
//! environment = "sandbox"      # production | sandbox | development
//! connect_timeout_secs = 10
//! request_timeout_secs = 10
//!
//! [cache]
//! ttl_secs = 300
//!
//! [retry]
//! base_ms = 1000
//! factor = 2.0
//! cap_ms = 10000
//! max_retries = 3
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use merchlink_core::{ConnectorError, ConnectorResult, Environment, ValidationError};

use crate::retry::RetryPolicy;

// =============================================================================
// Sections
// =============================================================================

/// Host binding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    /// Which host to bind.
    pub environment: Environment,

    /// Upper bound on one bind handshake.
    pub connect_timeout_secs: u64,

    /// Upper bound on one request/response exchange.
    pub request_timeout_secs: u64,
}

impl Default for HostSection {
    fn default() -> Self {
        HostSection {
            environment: Environment::Sandbox,
            connect_timeout_secs: 10,
            request_timeout_secs: 10,
        }
    }
}

/// Inventory cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Staleness bound for cached list queries.
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        CacheSection { ttl_secs: 300 }
    }
}

/// Retry policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub base_ms: u64,
    pub factor: f64,
    pub cap_ms: u64,
    pub max_retries: u32,
}

impl Default for RetrySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        RetrySection {
            base_ms: policy.base.as_millis() as u64,
            factor: policy.factor,
            cap_ms: policy.cap.as_millis() as u64,
            max_retries: policy.max_retries,
        }
    }
}

// =============================================================================
// Connector Config
// =============================================================================

/// Configuration for one connector context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub host: HostSection,
    pub cache: CacheSection,
    pub retry: RetrySection,
}

impl ConnectorConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(raw: &str) -> ConnectorResult<Self> {
        let config: ConnectorConfig =
            toml::from_str(raw).map_err(|e| {
                ConnectorError::Validation(ValidationError::InvalidFormat {
                    field: "config".to_string(),
                    reason: e.to_string(),
                })
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file, then applies environment
    /// variable overrides.
    pub fn load(path: &Path) -> ConnectorResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::Validation(ValidationError::InvalidFormat {
                field: "config".to_string(),
                reason: format!("failed to read {}: {}", path.display(), e),
            })
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.display(), environment = %config.host.environment, "config loaded");
        Ok(config)
    }

    /// Applies `MERCHLINK_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("MERCHLINK_ENVIRONMENT") {
            match value.parse() {
                Ok(environment) => self.host.environment = environment,
                Err(_) => warn!(%value, "ignoring invalid MERCHLINK_ENVIRONMENT"),
            }
        }
        if let Ok(value) = std::env::var("MERCHLINK_REQUEST_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) if secs > 0 => self.host.request_timeout_secs = secs,
                _ => warn!(%value, "ignoring invalid MERCHLINK_REQUEST_TIMEOUT_SECS"),
            }
        }
        if let Ok(value) = std::env::var("MERCHLINK_CACHE_TTL_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.cache.ttl_secs = secs,
                Err(_) => warn!(%value, "ignoring invalid MERCHLINK_CACHE_TTL_SECS"),
            }
        }
    }

    /// Rejects configurations the connector cannot run with.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.host.connect_timeout_secs == 0 {
            return Err(ValidationError::MustBePositive {
                field: "host.connect_timeout_secs".to_string(),
            }
            .into());
        }
        if self.host.request_timeout_secs == 0 {
            return Err(ValidationError::MustBePositive {
                field: "host.request_timeout_secs".to_string(),
            }
            .into());
        }
        if self.retry.base_ms == 0 {
            return Err(ValidationError::MustBePositive {
                field: "retry.base_ms".to_string(),
            }
            .into());
        }
        if self.retry.factor < 1.0 {
            return Err(ValidationError::OutOfRange {
                field: "retry.factor".to_string(),
                min: 1,
                max: i64::MAX,
            }
            .into());
        }
        if self.retry.cap_ms < self.retry.base_ms {
            return Err(ValidationError::OutOfRange {
                field: "retry.cap_ms".to_string(),
                min: self.retry.base_ms as i64,
                max: i64::MAX,
            }
            .into());
        }
        Ok(())
    }

    /// The bind handshake timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.host.connect_timeout_secs)
    }

    /// The per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.host.request_timeout_secs)
    }

    /// The inventory cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// The retry policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base: Duration::from_millis(self.retry.base_ms),
            factor: self.retry.factor,
            cap: Duration::from_millis(self.retry.cap_ms),
            max_retries: self.retry.max_retries,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
