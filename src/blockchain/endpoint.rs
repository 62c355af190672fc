//! Ordered RPC endpoint fallback
//!
//! Candidates are probed one at a time, in order, with `eth_blockNumber`.
//! The first one that answers within the probe timeout wins and nothing
//! after it is contacted.
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::core::ChainClient;
use crate::utils::{Result, TrackerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointState {
    Reachable,
    Unreachable,
}

/// An endpoint URL together with the outcome of its liveness probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoint {
    pub url: String,
    pub state: EndpointState,
    /// Head block reported by the probe
    pub head_block: Option<u64>,
}

impl ChainEndpoint {
    fn unreachable(url: &str) -> Self {
        Self {
            url: url.to_string(),
            state: EndpointState::Unreachable,
            head_block: None,
        }
    }
}

/// The winning endpoint and the client connected to it
pub struct SelectedEndpoint<C> {
    pub endpoint: ChainEndpoint,
    pub client: C,
    /// Candidates tried before the winner, in probe order
    pub rejected: Vec<ChainEndpoint>,
}

pub struct EndpointSelector {
    candidates: Vec<String>,
    probe_timeout: Duration,
}

impl EndpointSelector {
    pub fn new(candidates: Vec<String>, probe_timeout: Duration) -> Self {
        Self {
            candidates,
            probe_timeout,
        }
    }

    /// Probe candidates in order using `connect` to build each client.
    ///
    /// Fails with [`TrackerError::NoEndpointAvailable`] once every candidate
    /// has failed to connect, errored, or timed out.
    pub async fn select<C, F>(&self, mut connect: F) -> Result<SelectedEndpoint<C>>
    where
        C: ChainClient,
        F: FnMut(&str) -> Result<C>,
    {
        let mut rejected = Vec::new();

        for url in self.candidates.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            tracing::info!("Attempting connection to: {}", url);

            let client = match connect(url) {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!("✗ Could not build client for {}: {}", url, e);
                    rejected.push(ChainEndpoint::unreachable(url));
                    continue;
                }
            };

            match tokio::time::timeout(self.probe_timeout, client.latest_block_number()).await {
                Ok(Ok(head)) => {
                    tracing::info!("✓ Connected to {} (head block {})", url, head);
                    return Ok(SelectedEndpoint {
                        endpoint: ChainEndpoint {
                            url: url.to_string(),
                            state: EndpointState::Reachable,
                            head_block: Some(head),
                        },
                        client,
                        rejected,
                    });
                }
                Ok(Err(e)) => {
                    tracing::warn!("✗ Probe failed for {}: {}", url, e);
                }
                Err(_) => {
                    tracing::warn!("✗ Probe timed out for {} after {:?}", url, self.probe_timeout);
                }
            }
            rejected.push(ChainEndpoint::unreachable(url));
        }

        Err(TrackerError::NoEndpointAvailable { tried: rejected.len() })
    }
}
