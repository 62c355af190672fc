//! Runtime configuration for the watcher
use std::time::Duration;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use crate::contracts::addresses;
use crate::utils::{Result, TrackerError};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_SEARCH_WINDOW: u64 = 2000;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_LOG_RANGE: u64 = 2000;
pub const DEFAULT_BLOCK_FETCH_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Candidate endpoints, tried strictly in this order
    pub rpc_urls: Vec<String>,

    /// Factory emitting `PairCreated`
    pub factory: Address,

    /// Sleep between polls
    pub poll_interval: Duration,

    /// Sleep after a failed poll
    pub error_backoff: Duration,

    /// Blocks scanned backward from the pair's block
    pub search_window: u64,

    /// Back-to-back failed polls tolerated before giving up
    pub max_consecutive_failures: u32,

    pub probe_timeout: Duration,
    pub request_timeout: Duration,

    /// Largest block span sent in one `eth_getLogs` call
    pub max_log_range: u64,

    /// Extra attempts for a single block fetch before it is skipped
    pub block_fetch_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let poll_interval = Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS);

        Self {
            rpc_urls: addresses::default_rpc_urls(),
            factory: addresses::baseswap_factory(),
            poll_interval,
            error_backoff: poll_interval * 2,
            search_window: DEFAULT_SEARCH_WINDOW,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_log_range: DEFAULT_MAX_LOG_RANGE,
            block_fetch_retries: DEFAULT_BLOCK_FETCH_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl TrackerConfig {
    pub fn with_rpc_urls(mut self, urls: Vec<String>) -> Self {
        self.rpc_urls = urls;
        self
    }

    pub fn with_factory(mut self, factory: Address) -> Self {
        self.factory = factory;
        self
    }

    /// Also resets `error_backoff` to twice the interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self.error_backoff = interval * 2;
        self
    }

    pub fn with_search_window(mut self, blocks: u64) -> Self {
        self.search_window = blocks;
        self
    }

    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_urls.iter().all(|u| u.trim().is_empty()) {
            return Err(TrackerError::ConfigError("no RPC endpoints configured".into()));
        }
        if self.search_window == 0 {
            return Err(TrackerError::ConfigError("search window must be at least 1 block".into()));
        }
        if self.max_consecutive_failures == 0 {
            return Err(TrackerError::ConfigError(
                "max consecutive failures must be at least 1".into(),
            ));
        }
        if self.max_log_range == 0 {
            return Err(TrackerError::ConfigError("max log range must be at least 1 block".into()));
        }
        Ok(())
    }
}
