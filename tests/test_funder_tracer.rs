mod common;

use common::{addr, MockChain};
use funder_tracker::FunderTracer;
use std::time::Duration;

fn tracer(window: u64) -> FunderTracer {
    FunderTracer::new(window).with_retries(2, Duration::ZERO)
}

#[tokio::test]
async fn test_earliest_inbound_transaction_wins() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    let early_funder = addr(0xe1);
    let late_funder = addr(0xe2);

    let early_tx = chain.add_tx(990, early_funder, Some(deployer));
    chain.add_tx(995, late_funder, Some(deployer));

    let result = tracer(2000).trace(&chain, deployer, 1000).await;

    assert_eq!(result.funder(), Some(early_funder));
    let funding = result.funding.unwrap();
    assert_eq!(funding.block_number, 990);
    assert_eq!(funding.transaction_hash, early_tx);
    // Window is clamped at genesis: blocks 999..=0
    assert_eq!(result.blocks_scanned, 1000);
}

#[tokio::test]
async fn test_not_found_scans_whole_window() {
    let chain = MockChain::new(5000);
    let deployer = addr(0xd0);
    chain.add_tx(4950, addr(0x01), Some(addr(0x02)));

    let result = tracer(100).trace(&chain, deployer, 5000).await;

    assert!(!result.is_found());
    assert_eq!(result.blocks_scanned, 100);
    assert_eq!(result.blocks_skipped, 0);
}

#[tokio::test]
async fn test_match_at_window_floor_is_found() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    chain.add_tx(900, addr(0xf0), Some(deployer));

    let result = tracer(100).trace(&chain, deployer, 1000).await;

    assert_eq!(result.funder(), Some(addr(0xf0)));
    assert_eq!(result.funding.unwrap().block_number, 900);
}

#[tokio::test]
async fn test_blocks_outside_window_are_never_read() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    // Just below the floor and at the start block itself
    chain.add_tx(899, addr(0xaa), Some(deployer));
    chain.add_tx(1000, addr(0xbb), Some(deployer));

    let result = tracer(100).trace(&chain, deployer, 1000).await;

    assert!(!result.is_found());
    let fetched = chain.fetched_blocks();
    assert_eq!(fetched.len(), 100);
    assert!(fetched.iter().all(|b| (900..=999).contains(b)));
    // Strictly decreasing
    assert!(fetched.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn test_trace_is_idempotent() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    chain.add_tx(950, addr(0xf1), Some(deployer));
    chain.add_tx(970, addr(0xf2), Some(deployer));

    let tracer = tracer(200);
    let first = tracer.trace(&chain, deployer, 1000).await;
    let second = tracer.trace(&chain, deployer, 1000).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_first_transaction_within_block_wins() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    chain.add_tx(980, addr(0xf1), Some(deployer));
    chain.add_tx(980, addr(0xf2), Some(deployer));

    let result = tracer(100).trace(&chain, deployer, 1000).await;

    assert_eq!(result.funder(), Some(addr(0xf1)));
}

#[tokio::test]
async fn test_outbound_and_creation_transactions_ignored() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    chain.add_tx(960, deployer, Some(addr(0x55)));
    chain.add_tx(961, deployer, None);

    let result = tracer(100).trace(&chain, deployer, 1000).await;

    assert!(!result.is_found());
}

#[tokio::test]
async fn test_transient_block_failure_is_retried() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    chain.add_tx(950, addr(0xf0), Some(deployer));
    chain.fail_block(950, 2);

    let result = tracer(100).trace(&chain, deployer, 1000).await;

    assert_eq!(result.funder(), Some(addr(0xf0)));
    assert_eq!(result.blocks_skipped, 0);
    assert_eq!(chain.fetched_blocks().iter().filter(|b| **b == 950).count(), 3);
}

#[tokio::test]
async fn test_persistent_block_failure_is_skipped() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    chain.add_tx(950, addr(0xf0), Some(deployer));
    chain.add_tx(980, addr(0xf1), Some(deployer));
    chain.fail_block(950, 10);

    let result = FunderTracer::new(100)
        .with_retries(1, Duration::ZERO)
        .trace(&chain, deployer, 1000)
        .await;

    // The older match is lost with its block; the scan still completes
    assert_eq!(result.funder(), Some(addr(0xf1)));
    assert_eq!(result.blocks_skipped, 1);
    assert_eq!(result.blocks_scanned, 100);
}

#[tokio::test]
async fn test_trace_from_genesis_scans_nothing() {
    let chain = MockChain::new(0);

    let result = tracer(2000).trace(&chain, addr(0xd0), 0).await;

    assert!(!result.is_found());
    assert_eq!(result.blocks_scanned, 0);
    assert!(chain.fetched_blocks().is_empty());
}

#[tokio::test]
async fn test_explicit_window_overrides_default() {
    let chain = MockChain::new(1000);
    let deployer = addr(0xd0);
    chain.add_tx(700, addr(0xf0), Some(deployer));

    let tracer = tracer(100);
    assert!(!tracer.trace(&chain, deployer, 1000).await.is_found());

    let wide = tracer.trace_window(&chain, deployer, 1000, 500).await;
    assert_eq!(wide.funder(), Some(addr(0xf0)));
    assert_eq!(wide.blocks_scanned, 500);
}
