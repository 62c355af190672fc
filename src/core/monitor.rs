//! Poll, trace, report, repeat
//!
//! One logical thread of control: each detected pair is fully traced before
//! the next one, and the next poll only starts once the current batch is
//! done. Stop requests are honoured between polls and between traces, never
//! inside a running trace.
use std::collections::HashMap;
use std::time::Duration;
use ethers::types::{Address, H256};
use tokio::sync::watch;
use crate::blockchain::{ChainEndpoint, EndpointSelector};
use crate::config::TrackerConfig;
use crate::core::{ChainClient, FunderTracer, PairEventWatcher, ReportSink};
use crate::models::{FunderReport, PairCreatedEvent};
use crate::utils::Result;

/// How far below the cursor reported pairs are remembered
pub const DEDUP_RETENTION_BLOCKS: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MonitorState::Stopped | MonitorState::Failed)
    }
}

/// How the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// External stop signal
    Stopped,
    /// Too many back-to-back failed polls
    Failed { consecutive_failures: u32 },
}

impl MonitorExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorExit::Stopped => 0,
            MonitorExit::Failed { .. } => 1,
        }
    }
}

/// Back-to-back poll failures. Any successful poll resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureCounter {
    consecutive_failures: u32,
    max_allowed: u32,
}

impl FailureCounter {
    pub fn new(max_allowed: u32) -> Self {
        Self {
            consecutive_failures: 0,
            max_allowed,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn max_allowed(&self) -> u32 {
        self.max_allowed
    }

    /// Returns true once the budget is exhausted
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.is_exhausted()
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.consecutive_failures >= self.max_allowed
    }
}

pub struct MonitorLoop<C> {
    client: C,
    endpoint: Option<ChainEndpoint>,
    rejected_endpoints: Vec<ChainEndpoint>,
    watcher: PairEventWatcher,
    tracer: FunderTracer,
    failures: FailureCounter,
    state: MonitorState,
    poll_interval: Duration,
    error_backoff: Duration,
    lookup_retries: u32,
    retry_backoff: Duration,
    /// Reported pairs and the block they were created in
    seen_pairs: HashMap<Address, u64>,
}

impl<C: ChainClient> MonitorLoop<C> {
    /// Resolve an endpoint and point the watcher at its head block.
    ///
    /// Fails with `NoEndpointAvailable` when no candidate answers.
    pub async fn start<F>(config: &TrackerConfig, connect: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<C>,
    {
        config.validate()?;

        let selected = EndpointSelector::new(config.rpc_urls.clone(), config.probe_timeout)
            .select(connect)
            .await?;

        let mut watcher = PairEventWatcher::new(config.factory, config.max_log_range);
        match selected.endpoint.head_block {
            Some(head) => {
                tracing::info!("Starting from block: {}", head);
                watcher = watcher.starting_at(head);
            }
            None => {
                watcher.initialize(&selected.client).await?;
            }
        }

        let mut monitor = Self::build(config, selected.client, watcher);
        monitor.endpoint = Some(selected.endpoint);
        monitor.rejected_endpoints = selected.rejected;
        monitor.state = MonitorState::Running;
        Ok(monitor)
    }

    /// Skip endpoint selection and watch everything after `last_processed_block`
    pub fn with_client(config: &TrackerConfig, client: C, last_processed_block: u64) -> Self {
        let watcher = PairEventWatcher::new(config.factory, config.max_log_range)
            .starting_at(last_processed_block);
        let mut monitor = Self::build(config, client, watcher);
        monitor.state = MonitorState::Running;
        monitor
    }

    fn build(config: &TrackerConfig, client: C, watcher: PairEventWatcher) -> Self {
        Self {
            client,
            endpoint: None,
            rejected_endpoints: Vec::new(),
            watcher,
            tracer: FunderTracer::from_config(config),
            failures: FailureCounter::new(config.max_consecutive_failures),
            state: MonitorState::Starting,
            poll_interval: config.poll_interval,
            error_backoff: config.error_backoff,
            lookup_retries: config.block_fetch_retries,
            retry_backoff: config.retry_backoff,
            seen_pairs: HashMap::new(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn failures(&self) -> &FailureCounter {
        &self.failures
    }

    pub fn endpoint(&self) -> Option<&ChainEndpoint> {
        self.endpoint.as_ref()
    }

    /// Candidates that failed their probe before the selected endpoint answered
    pub fn rejected_endpoints(&self) -> &[ChainEndpoint] {
        &self.rejected_endpoints
    }

    /// Pairs currently remembered for de-duplication
    pub fn tracked_pairs(&self) -> usize {
        self.seen_pairs.len()
    }

    pub fn watcher(&self) -> &PairEventWatcher {
        &self.watcher
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run until a stop signal (`true` on `shutdown`) or the failure budget runs out
    pub async fn run<S: ReportSink>(
        &mut self,
        sink: &mut S,
        mut shutdown: watch::Receiver<bool>,
    ) -> MonitorExit {
        tracing::info!("Monitoring new pairs on factory {:?}", self.watcher.factory());

        loop {
            if stop_requested(&shutdown) {
                return self.stop();
            }

            let delay = if self.failures.consecutive_failures() > 0 {
                self.error_backoff
            } else {
                self.poll_interval
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_stop(&mut shutdown) => return self.stop(),
            }

            if let Some(exit) = self.step(sink, &shutdown).await {
                return exit;
            }
        }
    }

    /// One poll cycle plus the traces it triggers.
    ///
    /// Returns `Some` once the loop has reached a terminal state.
    pub async fn step<S: ReportSink>(
        &mut self,
        sink: &mut S,
        shutdown: &watch::Receiver<bool>,
    ) -> Option<MonitorExit> {
        match self.state {
            MonitorState::Failed => {
                return Some(MonitorExit::Failed {
                    consecutive_failures: self.failures.consecutive_failures(),
                })
            }
            MonitorState::Stopped | MonitorState::Stopping => return Some(MonitorExit::Stopped),
            _ => {}
        }

        let events = match self.watcher.poll(&self.client).await {
            Ok(events) => {
                self.failures.reset();
                events
            }
            Err(e) => {
                let exhausted = self.failures.record_failure();
                tracing::warn!(
                    "Error in monitoring loop (failure {}/{}): {}",
                    self.failures.consecutive_failures(),
                    self.failures.max_allowed(),
                    e
                );

                if exhausted {
                    tracing::error!(
                        "❌ Exiting after {} consecutive failures",
                        self.failures.consecutive_failures()
                    );
                    self.state = MonitorState::Failed;
                    return Some(MonitorExit::Failed {
                        consecutive_failures: self.failures.consecutive_failures(),
                    });
                }
                return None;
            }
        };

        for event in events {
            if stop_requested(shutdown) {
                tracing::info!("Stop requested, leaving remaining pairs of this batch untraced");
                return Some(self.stop());
            }

            if self.seen_pairs.contains_key(&event.pair) {
                tracing::debug!("Pair {:?} already reported, skipping", event.pair);
                continue;
            }
            self.seen_pairs.insert(event.pair, event.block_number);

            let report = self.process_event(&event).await;
            sink.emit(report);
        }

        self.prune_seen_pairs();
        None
    }

    /// Forget pairs created well below the cursor; the watcher never
    /// queries those blocks again.
    fn prune_seen_pairs(&mut self) {
        if let Some(last) = self.watcher.last_processed_block() {
            let floor = last.saturating_sub(DEDUP_RETENTION_BLOCKS);
            self.seen_pairs.retain(|_, block| *block > floor);
        }
    }

    async fn process_event(&self, event: &PairCreatedEvent) -> FunderReport {
        tracing::info!(
            "🆕 New pair {:?} ({:?} / {:?}) at block {}",
            event.pair,
            event.token0,
            event.token1,
            event.block_number
        );

        match self.resolve_deployer(event.transaction_hash).await {
            Some(deployer) => {
                tracing::info!("Deployer Address: {:?}", deployer);
                let trace = self.tracer.trace(&self.client, deployer, event.block_number).await;
                FunderReport::new(event, Some(&trace))
            }
            None => {
                tracing::warn!(
                    "Could not resolve deployer of pair {:?} (tx {:?})",
                    event.pair,
                    event.transaction_hash
                );
                FunderReport::new(event, None)
            }
        }
    }

    async fn resolve_deployer(&self, tx_hash: H256) -> Option<Address> {
        let mut attempt = 0u32;
        loop {
            match self.client.transaction_sender(tx_hash).await {
                Ok(sender) => return sender,
                Err(e) if e.is_retryable() && attempt < self.lookup_retries => {
                    attempt += 1;
                    tracing::debug!("Retrying deployer lookup for {:?} ({}): {}", tx_hash, attempt, e);
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => {
                    tracing::warn!("Deployer lookup for {:?} failed: {}", tx_hash, e);
                    return None;
                }
            }
        }
    }

    fn stop(&mut self) -> MonitorExit {
        self.state = MonitorState::Stopping;
        tracing::info!("Monitoring stopped.");
        self.state = MonitorState::Stopped;
        MonitorExit::Stopped
    }
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

async fn wait_for_stop(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender gone: nobody can ask us to stop any more
            std::future::pending::<()>().await;
        }
    }
}
