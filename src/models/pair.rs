use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

/// A decoded `PairCreated` log from the factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCreatedEvent {
    pub block_number: u64,
    pub transaction_hash: H256,
    /// Position of the log inside its block, used for ordering
    #[serde(default)]
    pub log_index: u64,
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
}
