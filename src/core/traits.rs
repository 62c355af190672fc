use async_trait::async_trait;
use ethers::types::{Address, Log, H256};
use crate::models::{FunderReport, TxSummary};
use crate::utils::Result;

/// Core abstraction: the chain reads the watcher needs.
///
/// Every method may fail with a retryable chain query error.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current head block number
    async fn latest_block_number(&self) -> Result<u64>;

    /// Logs emitted by `address` with `topic0` in `[from_block, to_block]`
    async fn get_logs(
        &self,
        address: Address,
        topic0: H256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>>;

    /// Full transaction list of a block, in block order
    async fn block_transactions(&self, number: u64) -> Result<Vec<TxSummary>>;

    /// Sender of a transaction, `None` if the node does not know it
    async fn transaction_sender(&self, hash: H256) -> Result<Option<Address>>;
}

/// Receives one report per detected pair, in detection order
pub trait ReportSink: Send {
    fn emit(&mut self, report: FunderReport);
}

impl ReportSink for Vec<FunderReport> {
    fn emit(&mut self, report: FunderReport) {
        self.push(report);
    }
}

impl ReportSink for tokio::sync::mpsc::UnboundedSender<FunderReport> {
    fn emit(&mut self, report: FunderReport) {
        if self.send(report).is_err() {
            tracing::warn!("Report receiver dropped, discarding report");
        }
    }
}
