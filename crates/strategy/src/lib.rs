pub mod config;
pub mod indicators;
pub mod scorer;

pub use config::ScorerParams;
pub use scorer::{Evaluation, Scorer, TradePlan};
