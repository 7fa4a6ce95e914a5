//! Local discovery cache
//!
//! Time-boxed cache of "which contracts has this address touched", backed
//! by one JSON file per user in a local data directory. Entries are a
//! hint, never authoritative: expired, missing, or corrupt entries all
//! read as a miss and the caller re-derives from chain logs.

use alloy::primitives::Address;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::discovery::DiscoveredRosca;

/// Default entry lifetime: 5 minutes.
pub const DISCOVERY_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    contracts: Vec<DiscoveredRosca>,
    /// Write time, epoch milliseconds.
    timestamp: i64,
}

/// File-backed discovery cache keyed by user address.
pub struct DiscoveryCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiscoveryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: DISCOVERY_CACHE_TTL,
        }
    }

    /// Override the entry lifetime.
    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    fn entry_path(&self, user: Address) -> PathBuf {
        self.dir.join(format!("rosca_contracts_{user}.json"))
    }

    /// Store the discovered contracts for `user`, stamped with the current
    /// time.
    pub fn cache(&self, user: Address, contracts: &[DiscoveredRosca]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("Failed to create cache dir {}", self.dir.display()))?;

        let entry = CacheEntry {
            contracts: contracts.to_vec(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let path = self.entry_path(user);
        let json = serde_json::to_string(&entry).wrap_err("Failed to serialize cache entry")?;
        fs::write(&path, json)
            .wrap_err_with(|| format!("Failed to write cache entry {}", path.display()))?;

        debug!(user = %user, count = contracts.len(), "Cached discovered ROSCAs");
        Ok(())
    }

    /// Return the cached contracts for `user` while the entry is fresh.
    ///
    /// Expired, missing, and unparseable entries all return `None`.
    pub fn get_cached(&self, user: Address) -> Option<Vec<DiscoveredRosca>> {
        let entry = read_entry(&self.entry_path(user))?;

        let age_ms = chrono::Utc::now().timestamp_millis() - entry.timestamp;
        if age_ms < 0 || age_ms as u128 >= self.ttl.as_millis() {
            debug!(user = %user, age_ms, "Discovery cache entry expired");
            return None;
        }

        Some(entry.contracts)
    }
}

fn read_entry(path: &Path) -> Option<CacheEntry> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(entry) => Some(entry),
        Err(error) => {
            debug!(path = %path.display(), %error, "Ignoring corrupt cache entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn sample_contracts() -> Vec<DiscoveredRosca> {
        vec![
            DiscoveredRosca {
                contract_address: addr(0xAA),
                block_number: 12,
            },
            DiscoveredRosca {
                contract_address: addr(0xBB),
                block_number: 40,
            },
        ]
    }

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());
        let contracts = sample_contracts();

        cache.cache(addr(1), &contracts).unwrap();
        assert_eq!(cache.get_cached(addr(1)), Some(contracts));
    }

    #[test]
    fn test_miss_for_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());
        assert_eq!(cache.get_cached(addr(9)), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::with_ttl(dir.path(), Duration::ZERO);

        cache.cache(addr(1), &sample_contracts()).unwrap();
        assert_eq!(cache.get_cached(addr(1)), None);
    }

    #[test]
    fn test_stale_timestamp_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());

        // Entry written six minutes in the past
        let entry = CacheEntry {
            contracts: sample_contracts(),
            timestamp: chrono::Utc::now().timestamp_millis() - 6 * 60 * 1000,
        };
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(
            cache.entry_path(addr(1)),
            serde_json::to_string(&entry).unwrap(),
        )
        .unwrap();

        assert_eq!(cache.get_cached(addr(1)), None);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(cache.entry_path(addr(1)), "not json").unwrap();

        assert_eq!(cache.get_cached(addr(1)), None);
    }

    #[test]
    fn test_users_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());

        cache.cache(addr(1), &sample_contracts()).unwrap();
        assert_eq!(cache.get_cached(addr(2)), None);
    }
}
