use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

use super::pair::PairCreatedEvent;

/// The earliest inbound transaction found for a deployer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingTransfer {
    pub funder: Address,
    pub block_number: u64,
    pub transaction_hash: H256,
}

/// Outcome of one backward scan.
///
/// `funding == None` means the window was exhausted without a match. That is
/// a valid answer, not a query failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunderResult {
    pub deployer: Address,
    pub funding: Option<FundingTransfer>,
    pub blocks_scanned: u64,
    /// Blocks that still failed after every retry and were treated as empty
    #[serde(default)]
    pub blocks_skipped: u64,
}

impl FunderResult {
    pub fn not_found(deployer: Address, blocks_scanned: u64, blocks_skipped: u64) -> Self {
        Self {
            deployer,
            funding: None,
            blocks_scanned,
            blocks_skipped,
        }
    }

    pub fn funder(&self) -> Option<Address> {
        self.funding.map(|f| f.funder)
    }

    pub fn is_found(&self) -> bool {
        self.funding.is_some()
    }
}

/// One record per detected pair, handed to the reporting side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunderReport {
    pub block_number: u64,
    pub transaction_hash: H256,
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
    /// `None` when the creating transaction could not be fetched
    pub deployer: Option<Address>,
    pub funder: Option<Address>,
    pub funding_block: Option<u64>,
    pub funding_transaction: Option<H256>,
    pub blocks_scanned: u64,
    /// Blocks in the window that could not be fetched. A not-found result
    /// is only conclusive when this is zero.
    pub blocks_skipped: u64,
}

impl FunderReport {
    pub fn new(event: &PairCreatedEvent, trace: Option<&FunderResult>) -> Self {
        let funding = trace.and_then(|t| t.funding);

        Self {
            block_number: event.block_number,
            transaction_hash: event.transaction_hash,
            pair: event.pair,
            token0: event.token0,
            token1: event.token1,
            deployer: trace.map(|t| t.deployer),
            funder: funding.map(|f| f.funder),
            funding_block: funding.map(|f| f.block_number),
            funding_transaction: funding.map(|f| f.transaction_hash),
            blocks_scanned: trace.map(|t| t.blocks_scanned).unwrap_or(0),
            blocks_skipped: trace.map(|t| t.blocks_skipped).unwrap_or(0),
        }
    }

    /// True when no funder was found but part of the window went unread
    pub fn is_inconclusive(&self) -> bool {
        self.funder.is_none() && self.blocks_skipped > 0
    }
}
