pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod provider;
pub mod types;

pub use clock::{Sleeper, TokioSleeper};
pub use config::Config;
pub use error::{Error, Result};
pub use gate::{DisabledGate, SignalGate, GATE_FEATURES};
pub use provider::{MarketDataProvider, Notifier};
pub use types::*;
