pub mod backoff;
pub mod coingecko;
pub mod symbols;

pub use backoff::Backoff;
pub use coingecko::{CoinGeckoClient, GatewayConfig};
pub use symbols::provider_id;
