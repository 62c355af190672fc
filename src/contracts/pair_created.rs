//! UniswapV2 factory `PairCreated` event
//!
//! `event PairCreated(address indexed token0, address indexed token1, address pair, uint)`
//! token0/token1 sit in topics 1 and 2, the pair address in the first data word.
use ethers::types::{Address, Log, H256, U256};
use ethers::utils::keccak256;
use once_cell::sync::Lazy;
use crate::models::PairCreatedEvent;
use crate::utils::{Result, TrackerError};

pub const PAIR_CREATED_SIGNATURE: &str = "PairCreated(address,address,address,uint256)";

/// topic0 of every `PairCreated` log
pub static PAIR_CREATED_TOPIC: Lazy<H256> =
    Lazy::new(|| H256::from(keccak256(PAIR_CREATED_SIGNATURE.as_bytes())));

/// Decode a raw factory log into a [`PairCreatedEvent`]
pub fn decode_pair_created(log: &Log) -> Result<PairCreatedEvent> {
    if log.topics.len() != 3 {
        return Err(TrackerError::DecodeError(format!(
            "expected 3 topics, got {}",
            log.topics.len()
        )));
    }

    if log.topics[0] != *PAIR_CREATED_TOPIC {
        return Err(TrackerError::DecodeError(format!(
            "unexpected topic0 {:?}",
            log.topics[0]
        )));
    }

    if log.data.len() < 32 {
        return Err(TrackerError::DecodeError(format!(
            "data too short ({} bytes): 0x{}",
            log.data.len(),
            hex::encode(&log.data)
        )));
    }

    let block_number = log
        .block_number
        .ok_or_else(|| TrackerError::DecodeError("missing block number".into()))?
        .as_u64();

    let transaction_hash = log
        .transaction_hash
        .ok_or_else(|| TrackerError::DecodeError("missing transaction hash".into()))?;

    let log_index = match log.log_index {
        Some(index) if index > U256::from(u64::MAX) => {
            return Err(TrackerError::DecodeError(format!("log index {} out of range", index)));
        }
        Some(index) => index.low_u64(),
        None => 0,
    };

    Ok(PairCreatedEvent {
        block_number,
        transaction_hash,
        log_index,
        pair: Address::from_slice(&log.data[12..32]),
        token0: Address::from(log.topics[1]),
        token1: Address::from(log.topics[2]),
    })
}
