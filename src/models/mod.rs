pub mod pair;
pub mod funder;
pub mod transaction;

pub use pair::PairCreatedEvent;
pub use funder::{FunderResult, FunderReport, FundingTransfer};
pub use transaction::TxSummary;
