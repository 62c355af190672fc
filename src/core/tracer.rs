//! Backward scan for the first inbound transaction to a deployer
//!
//! Blocks are walked from `start_block - 1` down to the window floor. The
//! whole window is always scanned: a match in an older block replaces any
//! newer one, so the result is the earliest inbound transaction and not the
//! most recent one.
use std::ops::RangeInclusive;
use std::time::Duration;
use ethers::types::Address;
use crate::config::TrackerConfig;
use crate::core::ChainClient;
use crate::models::{FunderResult, FundingTransfer, TxSummary};

const PROGRESS_EVERY: u64 = 500;

#[derive(Debug, Clone)]
pub struct FunderTracer {
    search_window: u64,
    fetch_retries: u32,
    retry_backoff: Duration,
}

impl FunderTracer {
    pub fn new(search_window: u64) -> Self {
        Self {
            search_window,
            fetch_retries: crate::config::DEFAULT_BLOCK_FETCH_RETRIES,
            retry_backoff: Duration::from_millis(crate::config::DEFAULT_RETRY_BACKOFF_MS),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.search_window).with_retries(config.block_fetch_retries, config.retry_backoff)
    }

    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.fetch_retries = retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn search_window(&self) -> u64 {
        self.search_window
    }

    /// Blocks inspected for a trace from `start_block`: `[start - limit, start - 1]`,
    /// clamped at genesis. `None` when there is nothing below `start_block`.
    pub fn search_range(start_block: u64, search_limit: u64) -> Option<RangeInclusive<u64>> {
        if start_block == 0 || search_limit == 0 {
            return None;
        }
        let floor = start_block.saturating_sub(search_limit);
        Some(floor..=start_block - 1)
    }

    /// Trace with the configured window
    pub async fn trace<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        deployer: Address,
        start_block: u64,
    ) -> FunderResult {
        self.trace_window(client, deployer, start_block, self.search_window).await
    }

    /// Scan `search_limit` blocks below `start_block` for transfers to `deployer`.
    ///
    /// Never fails: blocks that keep erroring are counted as skipped and
    /// treated as containing no match.
    pub async fn trace_window<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        deployer: Address,
        start_block: u64,
        search_limit: u64,
    ) -> FunderResult {
        let Some(range) = Self::search_range(start_block, search_limit) else {
            return FunderResult::not_found(deployer, 0, 0);
        };

        let floor = *range.start();
        tracing::info!(
            "Tracing funder of {:?}: blocks {} down to {}",
            deployer,
            range.end(),
            floor
        );

        let mut earliest: Option<FundingTransfer> = None;
        let mut scanned = 0u64;
        let mut skipped = 0u64;

        for number in range.rev() {
            scanned += 1;

            match self.fetch_block(client, number).await {
                Some(txs) => {
                    if let Some(tx) = txs.iter().find(|tx| tx.is_sent_to(deployer)) {
                        tracing::debug!("Inbound tx {:?} to {:?} at block {}", tx.hash, deployer, number);
                        earliest = Some(FundingTransfer {
                            funder: tx.from,
                            block_number: number,
                            transaction_hash: tx.hash,
                        });
                    }
                }
                None => skipped += 1,
            }

            if scanned % PROGRESS_EVERY == 0 {
                tracing::debug!("Scanned {} blocks for {:?} (at block {})", scanned, deployer, number);
            }
        }

        match earliest {
            Some(funding) => {
                tracing::info!("🎯 Funder of {:?} is {:?} (block {})", deployer, funding.funder, funding.block_number);
                FunderResult {
                    deployer,
                    funding: Some(funding),
                    blocks_scanned: scanned,
                    blocks_skipped: skipped,
                }
            }
            None => {
                tracing::warn!(
                    "Could not find incoming transaction for {:?} in last {} blocks",
                    deployer,
                    scanned
                );
                FunderResult::not_found(deployer, scanned, skipped)
            }
        }
    }

    /// Fetch one block, retrying transient failures. `None` means skip it.
    async fn fetch_block<C: ChainClient + ?Sized>(&self, client: &C, number: u64) -> Option<Vec<TxSummary>> {
        let mut attempt = 0u32;
        loop {
            match client.block_transactions(number).await {
                Ok(txs) => return Some(txs),
                Err(e) if e.is_retryable() && attempt < self.fetch_retries => {
                    attempt += 1;
                    tracing::debug!("Retrying block {} ({}/{}): {}", number, attempt, self.fetch_retries, e);
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => {
                    tracing::warn!("Skipping block {} after {} attempts: {}", number, attempt + 1, e);
                    return None;
                }
            }
        }
    }
}
