//! Interrupt handling for the binary
//!
//! The first interrupt asks the monitor to stop once its current trace is
//! done. A second one means the user does not want to wait.
use std::future::Future;
use tokio::sync::watch;

/// Conventional exit status for a process killed by SIGINT
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// Second interrupt received, exit without waiting
    ForceExit,
    /// The signal source failed; no further interrupts will arrive
    SignalsClosed,
}

/// Turn interrupts from `next_interrupt` into a stop request on `stop`
pub async fn forward_interrupts<F, Fut>(mut next_interrupt: F, stop: watch::Sender<bool>) -> InterruptOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        tracing::warn!("Cannot listen for interrupts: {}", e);
        return InterruptOutcome::SignalsClosed;
    }

    tracing::info!("Received interrupt signal, finishing current work (interrupt again to exit now)...");
    let _ = stop.send(true);

    match next_interrupt().await {
        Ok(()) => {
            tracing::warn!("Second interrupt, exiting immediately");
            InterruptOutcome::ForceExit
        }
        Err(e) => {
            tracing::warn!("Stopped listening for interrupts: {}", e);
            InterruptOutcome::SignalsClosed
        }
    }
}
