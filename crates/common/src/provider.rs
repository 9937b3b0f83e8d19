use std::collections::HashMap;

use async_trait::async_trait;

use crate::{Candle, QuoteSnapshot, Result, Signal};

/// Abstraction over the market data provider.
///
/// `CoinGeckoClient` in `crates/market` implements this for production.
/// Pipeline and resolver tests substitute scripted fakes.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch current prices for a set of symbols in one batched request.
    /// The result is keyed by the symbol the caller asked with; symbols the
    /// provider does not know are silently absent from the map.
    async fn fetch_bulk_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, QuoteSnapshot>>;

    /// Fetch historical candles for one asset. An empty vector means the
    /// provider could not supply data within the retry budget; callers
    /// treat that as "insufficient data", not as an error.
    async fn fetch_ohlc(&self, symbol: &str, days: u32) -> Result<Vec<Candle>>;
}

/// Fire-and-forget delivery of rendered messages to the broadcast channel.
/// Delivery failures are reported via the return value and never abort a run.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a freshly accepted trade signal, optionally annotated with
    /// the AI gate's probability.
    async fn send_signal(&self, signal: &Signal, gate_probability: Option<f64>) -> bool;

    /// Deliver a plain status line (resolution outcomes).
    async fn send_status(&self, text: &str) -> bool;
}
