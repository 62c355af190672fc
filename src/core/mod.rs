pub mod traits;
pub mod watcher;
pub mod tracer;
pub mod monitor;
pub mod shutdown;

pub use traits::{ChainClient, ReportSink};
pub use watcher::{BlockCursor, PairEventWatcher};
pub use tracer::FunderTracer;
pub use monitor::{FailureCounter, MonitorExit, MonitorLoop, MonitorState};
