//! Factory contract constants and event decoding
//!
//! BaseSwap is a UniswapV2 fork on Base. Any factory that emits the V2
//! `PairCreated` event can be watched by passing its address in the config.
pub mod pair_created;

pub use pair_created::{decode_pair_created, PAIR_CREATED_SIGNATURE, PAIR_CREATED_TOPIC};

/// Base network addresses and public endpoints
pub mod addresses {
    use ethers::types::Address;
    use std::str::FromStr;

    /// BaseSwap factory (UniswapV2 compatible)
    pub const BASESWAP_FACTORY: &str = "0xFDa619b6d20975be80A10332cD39b9a4b0FAa8BB";

    /// Public Base RPC endpoints, in the order they are tried
    pub const DEFAULT_RPC_URLS: &[&str] = &[
        "https://mainnet.base.org",
        "https://base.llamarpc.com",
        "https://base-rpc.publicnode.com",
        "https://1rpc.io/base",
    ];

    /// Parse BASESWAP_FACTORY as Address
    pub fn baseswap_factory() -> Address {
        Address::from_str(BASESWAP_FACTORY).expect("Invalid BASESWAP_FACTORY address")
    }

    pub fn default_rpc_urls() -> Vec<String> {
        DEFAULT_RPC_URLS.iter().map(|s| s.to_string()).collect()
    }
}
