pub mod client;
pub mod endpoint;

pub use client::BlockchainClient;
pub use endpoint::{ChainEndpoint, EndpointSelector, EndpointState, SelectedEndpoint};
