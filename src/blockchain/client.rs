use ethers::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use crate::core::ChainClient;
use crate::models::TxSummary;
use crate::utils::{Result, TrackerError};

/// Blockchain RPC client backed by one HTTP endpoint
pub struct BlockchainClient {
    provider: Arc<Provider<Http>>,
    url: String,
    request_timeout: Duration,
}

impl BlockchainClient {
    /// Create a new client. Does not touch the network.
    pub fn new(rpc_url: &str, request_timeout: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| TrackerError::RpcError(
                ProviderError::CustomError(format!("Invalid RPC URL: {}", e))
            ))?;

        Ok(Self {
            provider: Arc::new(provider),
            url: rpc_url.to_string(),
            request_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get chain ID
    pub async fn chain_id(&self) -> Result<u64> {
        let id = self.timed("eth_chainId", self.provider.get_chainid()).await?;
        Ok(id.as_u64())
    }

    /// Get chain name
    pub fn chain_name(chain_id: u64) -> &'static str {
        match chain_id {
            1 => "Ethereum Mainnet",
            8453 => "Base",
            84532 => "Base Sepolia",
            _ => "Unknown Chain",
        }
    }

    async fn timed<T, F>(&self, method: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TrackerError::ChainQuery(format!(
                "{} timed out after {:?} on {}",
                method, self.request_timeout, self.url
            ))),
        }
    }
}

#[async_trait]
impl ChainClient for BlockchainClient {
    async fn latest_block_number(&self) -> Result<u64> {
        let block = self.timed("eth_blockNumber", self.provider.get_block_number()).await?;
        Ok(block.as_u64())
    }

    async fn get_logs(
        &self,
        address: Address,
        topic0: H256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        tracing::debug!("eth_getLogs {:?} [{}, {}]", address, from_block, to_block);

        let filter = Filter::new()
            .address(address)
            .topic0(topic0)
            .from_block(from_block)
            .to_block(to_block);

        self.timed("eth_getLogs", self.provider.get_logs(&filter)).await
    }

    async fn block_transactions(&self, number: u64) -> Result<Vec<TxSummary>> {
        let block = self
            .timed("eth_getBlockByNumber", self.provider.get_block_with_txs(number))
            .await?
            .ok_or_else(|| TrackerError::ChainQuery(format!("block {} not found", number)))?;

        Ok(block.transactions.iter().map(TxSummary::from).collect())
    }

    async fn transaction_sender(&self, hash: H256) -> Result<Option<Address>> {
        let tx = self
            .timed("eth_getTransactionByHash", self.provider.get_transaction(hash))
            .await?;
        Ok(tx.map(|t| t.from))
    }
}
