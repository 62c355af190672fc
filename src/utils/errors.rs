use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("No RPC endpoint available (tried {tried} candidates)")]
    NoEndpointAvailable { tried: usize },

    #[error("RPC error: {0}")]
    RpcError(#[from] ethers::providers::ProviderError),

    #[error("Chain query failed: {0}")]
    ChainQuery(String),

    #[error("Failed to decode log: {0}")]
    DecodeError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TrackerError {
    /// Chain query failures are scoped to one call and worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::RpcError(_) | TrackerError::ChainQuery(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
