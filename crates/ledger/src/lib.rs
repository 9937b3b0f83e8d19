pub mod doc;
pub mod history;
pub mod positions;

pub use history::{CandleCacheStore, HistoryStore, SignalStore};
pub use positions::{LedgerPolicy, PositionBook, PositionLedger};
