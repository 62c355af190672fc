//! Incremental `PairCreated` polling over a rolling block window
use ethers::types::Address;
use crate::contracts::{decode_pair_created, PAIR_CREATED_TOPIC};
use crate::core::ChainClient;
use crate::models::PairCreatedEvent;
use crate::utils::Result;

/// Last block whose logs have been fully queried.
///
/// Only moves forward. Lives in memory; a restart resumes from the chain head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCursor {
    last_processed_block: u64,
}

impl BlockCursor {
    pub fn new(block: u64) -> Self {
        Self { last_processed_block: block }
    }

    pub fn last_processed_block(&self) -> u64 {
        self.last_processed_block
    }

    fn advance_to(&mut self, block: u64) {
        self.last_processed_block = self.last_processed_block.max(block);
    }
}

pub struct PairEventWatcher {
    factory: Address,
    max_log_range: u64,
    cursor: Option<BlockCursor>,
}

impl PairEventWatcher {
    pub fn new(factory: Address, max_log_range: u64) -> Self {
        Self {
            factory,
            max_log_range: max_log_range.max(1),
            cursor: None,
        }
    }

    /// Start watching after `block` instead of the chain head
    pub fn starting_at(mut self, block: u64) -> Self {
        self.cursor = Some(BlockCursor::new(block));
        self
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn last_processed_block(&self) -> Option<u64> {
        self.cursor.map(|c| c.last_processed_block())
    }

    /// Point the cursor at the current head so history is never replayed
    pub async fn initialize<C: ChainClient + ?Sized>(&mut self, client: &C) -> Result<u64> {
        let head = client.latest_block_number().await?;
        self.cursor = Some(BlockCursor::new(head));
        tracing::info!("Starting from block: {}", head);
        Ok(head)
    }

    /// Fetch `PairCreated` events in `(last_processed_block, latest]`.
    ///
    /// On a query error the cursor is left untouched so the same range is
    /// retried next time. Undecodable logs are skipped.
    pub async fn poll<C: ChainClient + ?Sized>(&mut self, client: &C) -> Result<Vec<PairCreatedEvent>> {
        let last = match self.cursor {
            Some(cursor) => cursor.last_processed_block(),
            None => {
                self.initialize(client).await?;
                return Ok(Vec::new());
            }
        };

        let latest = client.latest_block_number().await?;
        if latest <= last {
            return Ok(Vec::new());
        }

        tracing::debug!("Checking blocks {} to {}...", last + 1, latest);

        let mut logs = Vec::new();
        let mut from = last + 1;
        while from <= latest {
            let to = from.saturating_add(self.max_log_range - 1).min(latest);
            logs.extend(client.get_logs(self.factory, *PAIR_CREATED_TOPIC, from, to).await?);
            from = to + 1;
        }

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            match decode_pair_created(log) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(
                        "Skipping malformed PairCreated log (tx {:?}): {}",
                        log.transaction_hash,
                        e
                    );
                }
            }
        }
        events.sort_by_key(|e| (e.block_number, e.log_index));

        if let Some(cursor) = self.cursor.as_mut() {
            cursor.advance_to(latest);
        }

        Ok(events)
    }
}
