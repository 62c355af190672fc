pub mod config;
pub mod contracts;
pub mod core;
pub mod models;
pub mod blockchain;
pub mod utils;

pub use config::TrackerConfig;
pub use crate::core::{ChainClient, FunderTracer, MonitorExit, MonitorLoop, PairEventWatcher, ReportSink};
pub use models::{FunderReport, FunderResult, PairCreatedEvent};
pub use utils::{TrackerError, Result};
