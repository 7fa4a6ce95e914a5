//! Client configuration
//!
//! Loaded from environment variables (optionally via a `.env` file).
//! The private key is optional: without it the client is read-only and
//! the write pipeline is unavailable.

use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

/// Main client configuration.
#[derive(Clone)]
pub struct Config {
    /// EVM RPC endpoint
    pub rpc_url: String,
    /// Expected chain ID; writes against any other chain are refused
    pub chain_id: u64,
    /// Signing key (optional, required for write operations)
    pub private_key: Option<String>,
    /// Directory for the local discovery cache
    pub cache_dir: PathBuf,
    /// Per-operation rate limits
    pub rate_limits: RateLimits,
}

/// Custom Debug that redacts the private key to prevent accidental log
/// leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("cache_dir", &self.cache_dir)
            .field("rate_limits", &self.rate_limits)
            .finish()
    }
}

/// Sliding-window limits per logical operation.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub search: RateLimitConfig,
    pub deployment: RateLimitConfig,
    pub transaction: RateLimitConfig,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            search: RateLimitConfig::new(default_search_limit(), Duration::from_secs(60)),
            deployment: RateLimitConfig::new(default_deployment_limit(), Duration::from_secs(60)),
            transaction: RateLimitConfig::new(default_transaction_limit(), Duration::from_secs(60)),
        }
    }
}

/// Default functions
fn default_search_limit() -> usize {
    30
}

fn default_deployment_limit() -> usize {
    5
}

fn default_transaction_limit() -> usize {
    10
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".rosca-cache")
}

impl Config {
    /// Load configuration from environment variables, reading a `.env`
    /// file first if one is present.
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env").or_else(|_| Self::load_from_env())
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    fn load_from_env() -> Result<Self> {
        let rpc_url = env::var("ROSCA_RPC_URL")
            .map_err(|_| eyre!("ROSCA_RPC_URL environment variable is required"))?;

        let chain_id = env::var("ROSCA_CHAIN_ID")
            .map_err(|_| eyre!("ROSCA_CHAIN_ID environment variable is required"))?
            .parse()
            .wrap_err("ROSCA_CHAIN_ID must be a valid u64")?;

        let private_key = env::var("ROSCA_PRIVATE_KEY").ok();

        let cache_dir = env::var("ROSCA_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_cache_dir());

        let mut rate_limits = RateLimits::default();
        if let Some(limit) = env_limit("ROSCA_SEARCH_LIMIT") {
            rate_limits.search.max_requests = limit;
        }
        if let Some(limit) = env_limit("ROSCA_DEPLOYMENT_LIMIT") {
            rate_limits.deployment.max_requests = limit;
        }
        if let Some(limit) = env_limit("ROSCA_TRANSACTION_LIMIT") {
            rate_limits.transaction.max_requests = limit;
        }

        let config = Config {
            rpc_url,
            chain_id,
            private_key,
            cache_dir,
            rate_limits,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.rpc_url)
            .map_err(|e| eyre!("rpc_url is not a valid URL: {}", e))?;

        if self.chain_id == 0 {
            return Err(eyre!("chain_id cannot be zero"));
        }

        if let Some(ref key) = self.private_key {
            if key.len() != 66 || !key.starts_with("0x") {
                return Err(eyre!("private_key must be 66 chars (0x + 64 hex chars)"));
            }
        }

        if self.rate_limits.search.max_requests == 0
            || self.rate_limits.deployment.max_requests == 0
            || self.rate_limits.transaction.max_requests == 0
        {
            return Err(eyre!("rate limits must admit at least one request"));
        }

        Ok(())
    }
}

fn env_limit(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            private_key: Some(
                "0x0000000000000000000000000000000000000000000000000000000000000001".to_string(),
            ),
            cache_dir: default_cache_dir(),
            rate_limits: RateLimits::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_rpc_url() {
        let mut config = valid_config();
        config.rpc_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_chain_id_rejected() {
        let mut config = valid_config();
        config.chain_id = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let mut config = valid_config();
        config.private_key = Some("0x123".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_private_key_allowed() {
        let mut config = valid_config();
        config.private_key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let rendered = format!("{:?}", valid_config());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("0000000000000001"));
    }

    #[test]
    fn test_default_limits() {
        assert_eq!(default_search_limit(), 30);
        assert_eq!(default_deployment_limit(), 5);
        assert_eq!(default_transaction_limit(), 10);
    }
}
