use ethers::types::{Address, H256};

/// The part of a block transaction the funder trace looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSummary {
    pub hash: H256,
    pub from: Address,
    /// `None` for contract creations
    pub to: Option<Address>,
}

impl TxSummary {
    pub fn new(hash: H256, from: Address, to: Option<Address>) -> Self {
        Self { hash, from, to }
    }

    pub fn is_sent_to(&self, recipient: Address) -> bool {
        self.to == Some(recipient)
    }
}

impl From<&ethers::types::Transaction> for TxSummary {
    fn from(tx: &ethers::types::Transaction) -> Self {
        Self {
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
        }
    }
}
