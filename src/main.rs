use funder_tracker::*;
use funder_tracker::blockchain::BlockchainClient;
use funder_tracker::contracts::addresses;
use funder_tracker::core::shutdown::{forward_interrupts, InterruptOutcome, EXIT_INTERRUPTED};
use clap::Parser;
use ethers::types::Address;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Exit code when no endpoint answers or the configuration is unusable
const EXIT_STARTUP_FAILURE: i32 = 2;

/// Wallet Funder Tracker - watch new pairs and trace their deployers' funders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Preferred RPC URL, tried before the public Base endpoints
    #[arg(long, env = "BASE_RPC_URL")]
    rpc: Option<String>,

    /// Extra fallback RPC URLs (repeatable)
    #[arg(long = "fallback-rpc", value_name = "URL")]
    fallback_rpcs: Vec<String>,

    /// Factory contract emitting PairCreated
    #[arg(long, env = "FACTORY_ADDRESS", default_value = addresses::BASESWAP_FACTORY)]
    factory: String,

    /// Seconds between polls
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 2)]
    poll_interval: u64,

    /// Blocks scanned backward when tracing a funder
    #[arg(long, env = "SEARCH_WINDOW", default_value_t = 2000)]
    search_window: u64,

    /// Consecutive failed polls before exiting
    #[arg(long, env = "MAX_FAILURES", default_value_t = 10)]
    max_failures: u32,

    /// Per-request RPC timeout in seconds
    #[arg(long, env = "RPC_TIMEOUT", default_value_t = 60)]
    rpc_timeout: u64,

    /// Emit one JSON line per report instead of text
    #[arg(long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> Result<TrackerConfig> {
        let factory: Address = self.factory.parse()
            .map_err(|_| TrackerError::InvalidAddress(self.factory.clone()))?;

        let mut rpc_urls = Vec::new();
        if let Some(rpc) = &self.rpc {
            rpc_urls.push(rpc.clone());
        }
        rpc_urls.extend(self.fallback_rpcs.iter().cloned());
        for url in addresses::default_rpc_urls() {
            if !rpc_urls.contains(&url) {
                rpc_urls.push(url);
            }
        }

        let mut config = TrackerConfig::default()
            .with_rpc_urls(rpc_urls)
            .with_factory(factory)
            .with_poll_interval(Duration::from_secs(self.poll_interval))
            .with_search_window(self.search_window)
            .with_max_consecutive_failures(self.max_failures);
        config.request_timeout = Duration::from_secs(self.rpc_timeout);

        config.validate()?;
        Ok(config)
    }
}

fn print_report(report: &FunderReport) {
    let rule = "=".repeat(80);
    println!("\n{}", rule);
    println!("NEW PAIR DETECTED!");
    println!("{}", rule);
    println!("Block Number: {}", report.block_number);
    println!("Transaction: 0x{}", hex::encode(report.transaction_hash.as_bytes()));
    println!("Pair Address: {:?}", report.pair);
    println!("Token0: {:?}", report.token0);
    println!("Token1: {:?}", report.token1);
    println!("{}", "-".repeat(80));

    match report.deployer {
        Some(deployer) => println!("Deployer Address: {:?}", deployer),
        None => println!("⚠️  Deployer could not be resolved"),
    }

    match (report.funder, report.funding_block) {
        (Some(funder), Some(block)) => {
            println!("\n🎯 FUNDER WALLET FOUND: {:?} (block {})", funder, block);
        }
        _ if report.deployer.is_some() => {
            println!(
                "\n⚠️  No funder found in the last {} blocks",
                report.blocks_scanned
            );
        }
        _ => {}
    }
    if report.blocks_skipped > 0 {
        println!(
            "⚠️  {} of {} blocks could not be fetched; result may be incomplete",
            report.blocks_skipped, report.blocks_scanned
        );
    }
    println!("{}\n", rule);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Setup logging
    let directive = if args.verbose { "funder_tracker=debug" } else { "funder_tracker=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_STARTUP_FAILURE);
        }
    };

    let request_timeout = config.request_timeout;
    let mut monitor = match MonitorLoop::start(&config, |url| BlockchainClient::new(url, request_timeout)).await {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("\n❌ ERROR: Could not connect: {}", e);
            eprintln!("\nTried the following RPC endpoints:");
            for url in &config.rpc_urls {
                eprintln!("  - {}", url);
            }
            eprintln!("\nSet a custom endpoint with --rpc or BASE_RPC_URL.");
            std::process::exit(EXIT_STARTUP_FAILURE);
        }
    };

    for rejected in monitor.rejected_endpoints() {
        println!("✗ Unreachable: {}", rejected.url);
    }
    if let Some(endpoint) = monitor.endpoint() {
        println!("✓ Connected to: {}", endpoint.url);
    }
    match monitor.client().chain_id().await {
        Ok(chain_id) => println!("✓ Chain: {} ({})", BlockchainClient::chain_name(chain_id), chain_id),
        Err(e) => tracing::warn!("Could not query chain id: {}", e),
    }
    println!("Factory: {:?}", config.factory);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let InterruptOutcome::ForceExit = forward_interrupts(tokio::signal::ctrl_c, stop_tx).await {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let (report_tx, mut report_rx) = mpsc::unbounded_channel::<FunderReport>();
    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            if json {
                match serde_json::to_string(&report) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!("Failed to serialize report: {}", e),
                }
            } else {
                print_report(&report);
            }
        }
    });

    let mut sink = report_tx;
    let exit = monitor.run(&mut sink, stop_rx).await;
    drop(sink);
    let _ = printer.await;

    std::process::exit(exit.exit_code());
}
