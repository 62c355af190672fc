#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{Address, Bytes, Log, H256, U256, U64};
use funder_tracker::contracts::PAIR_CREATED_TOPIC;
use funder_tracker::models::TxSummary;
use funder_tracker::{ChainClient, Result, TrackerError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// In-memory chain. Every call is recorded so tests can check what was read.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    head: u64,
    head_script: VecDeque<Option<u64>>,
    head_always_fails: bool,
    head_delay: Duration,
    head_calls: u32,
    blocks: HashMap<u64, Vec<TxSummary>>,
    block_failures: HashMap<u64, u32>,
    fetched_blocks: Vec<u64>,
    logs: Vec<Log>,
    log_failures: u32,
    log_queries: Vec<(u64, u64)>,
    senders: HashMap<H256, Address>,
    next_hash: u64,
}

impl MockChain {
    pub fn new(head: u64) -> Self {
        let chain = Self::default();
        chain.state.lock().unwrap().head = head;
        chain
    }

    /// Every head request fails
    pub fn unreachable() -> Self {
        let chain = Self::default();
        chain.state.lock().unwrap().head_always_fails = true;
        chain
    }

    pub fn set_head(&self, head: u64) {
        self.state.lock().unwrap().head = head;
    }

    /// Answers for upcoming head requests; `None` is a failure.
    /// Once exhausted the last successful head keeps being returned.
    pub fn script_heads(&self, heads: Vec<Option<u64>>) {
        self.state.lock().unwrap().head_script.extend(heads);
    }

    pub fn set_head_delay(&self, delay: Duration) {
        self.state.lock().unwrap().head_delay = delay;
    }

    fn fresh_hash(state: &mut MockState) -> H256 {
        state.next_hash += 1;
        H256::from_low_u64_be(state.next_hash)
    }

    /// Append a transaction to `block` and return its hash
    pub fn add_tx(&self, block: u64, from: Address, to: Option<Address>) -> H256 {
        let mut state = self.state.lock().unwrap();
        let hash = Self::fresh_hash(&mut state);
        state.blocks.entry(block).or_default().push(TxSummary::new(hash, from, to));
        state.senders.insert(hash, from);
        hash
    }

    /// Emit a well-formed `PairCreated` log from `factory`, created by `deployer`
    pub fn add_pair_created(
        &self,
        factory: Address,
        block: u64,
        pair: Address,
        token0: Address,
        token1: Address,
        deployer: Address,
    ) -> H256 {
        let tx_hash = self.add_tx(block, deployer, Some(factory));

        let mut data = vec![0u8; 12];
        data.extend_from_slice(pair.as_bytes());
        data.extend_from_slice(&[0u8; 32]);

        let mut state = self.state.lock().unwrap();
        let log_index = state.logs.iter().filter(|l| l.block_number == Some(U64::from(block))).count();
        state.logs.push(Log {
            address: factory,
            topics: vec![*PAIR_CREATED_TOPIC, H256::from(token0), H256::from(token1)],
            data: Bytes::from(data),
            block_number: Some(U64::from(block)),
            transaction_hash: Some(tx_hash),
            log_index: Some(U256::from(log_index)),
            ..Default::default()
        });
        tx_hash
    }

    /// Emit a `PairCreated` log with a truncated data field
    pub fn add_malformed_pair_log(&self, factory: Address, block: u64) {
        let mut state = self.state.lock().unwrap();
        let tx_hash = Self::fresh_hash(&mut state);
        state.logs.push(Log {
            address: factory,
            topics: vec![*PAIR_CREATED_TOPIC, H256::zero(), H256::zero()],
            data: Bytes::from(vec![0u8; 4]),
            block_number: Some(U64::from(block)),
            transaction_hash: Some(tx_hash),
            ..Default::default()
        });
    }

    /// Drop the sender of `hash` so deployer lookup comes back empty
    pub fn forget_sender(&self, hash: H256) {
        self.state.lock().unwrap().senders.remove(&hash);
    }

    pub fn fail_block(&self, block: u64, times: u32) {
        self.state.lock().unwrap().block_failures.insert(block, times);
    }

    /// Make every block in `blocks` fail `times` times
    pub fn fail_blocks(&self, blocks: std::ops::RangeInclusive<u64>, times: u32) {
        let mut state = self.state.lock().unwrap();
        for block in blocks {
            state.block_failures.insert(block, times);
        }
    }

    pub fn fail_next_log_queries(&self, times: u32) {
        self.state.lock().unwrap().log_failures = times;
    }

    pub fn fetched_blocks(&self) -> Vec<u64> {
        self.state.lock().unwrap().fetched_blocks.clone()
    }

    pub fn clear_fetched_blocks(&self) {
        self.state.lock().unwrap().fetched_blocks.clear();
    }

    pub fn log_queries(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().log_queries.clone()
    }

    pub fn head_calls(&self) -> u32 {
        self.state.lock().unwrap().head_calls
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn latest_block_number(&self) -> Result<u64> {
        let delay = self.state.lock().unwrap().head_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.head_calls += 1;
        if state.head_always_fails {
            return Err(TrackerError::ChainQuery("connection refused".into()));
        }
        match state.head_script.pop_front() {
            Some(Some(head)) => {
                state.head = head;
                Ok(head)
            }
            Some(None) => Err(TrackerError::ChainQuery("503 Service Unavailable".into())),
            None => Ok(state.head),
        }
    }

    async fn get_logs(
        &self,
        address: Address,
        topic0: H256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        let mut state = self.state.lock().unwrap();
        state.log_queries.push((from_block, to_block));
        if state.log_failures > 0 {
            state.log_failures -= 1;
            return Err(TrackerError::ChainQuery("rate limited".into()));
        }

        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == address && log.topics.first() == Some(&topic0))
            .filter(|log| {
                let block = log.block_number.map(|b| b.as_u64()).unwrap_or_default();
                block >= from_block && block <= to_block
            })
            .cloned()
            .collect())
    }

    async fn block_transactions(&self, number: u64) -> Result<Vec<TxSummary>> {
        let mut state = self.state.lock().unwrap();
        state.fetched_blocks.push(number);
        if let Some(remaining) = state.block_failures.get_mut(&number) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TrackerError::ChainQuery(format!("block {} timed out", number)));
            }
        }
        Ok(state.blocks.get(&number).cloned().unwrap_or_default())
    }

    async fn transaction_sender(&self, hash: H256) -> Result<Option<Address>> {
        Ok(self.state.lock().unwrap().senders.get(&hash).copied())
    }
}
