pub mod errors;

pub use errors::{TrackerError, Result};
