//! Hand-rolled fakes shared by the pipeline and resolver tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use common::{
    Candle, Error, MarketDataProvider, Notifier, QuoteSnapshot, Result, Signal, Sleeper,
};

/// Market data provider that answers from scripted tables.
#[derive(Default)]
pub struct ScriptedProvider {
    quotes: HashMap<String, QuoteSnapshot>,
    candles: HashMap<String, Vec<Candle>>,
    ohlc_failures: HashMap<String, u16>,
    bulk_fails: bool,
    bulk_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn add_quote(&mut self, symbol: &str, usd: f64, change: f64) {
        self.quotes.insert(
            symbol.to_string(),
            QuoteSnapshot {
                usd,
                usd_24h_change: change,
            },
        );
    }

    pub fn add_candles(&mut self, symbol: &str, candles: Vec<Candle>) {
        self.candles.insert(symbol.to_string(), candles);
    }

    pub fn fail_bulk(&mut self) {
        self.bulk_fails = true;
    }

    pub fn fail_ohlc(&mut self, symbol: &str, status: u16) {
        self.ohlc_failures.insert(symbol.to_string(), status);
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fetch_bulk_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, QuoteSnapshot>> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if self.bulk_fails {
            return Err(Error::Network("scripted bulk failure".into()));
        }
        Ok(symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).map(|q| (s.clone(), *q)))
            .collect())
    }

    async fn fetch_ohlc(&self, symbol: &str, _days: u32) -> Result<Vec<Candle>> {
        if let Some(status) = self.ohlc_failures.get(symbol) {
            return Err(Error::Http {
                status: *status,
                body: "scripted failure".into(),
            });
        }
        Ok(self.candles.get(symbol).cloned().unwrap_or_default())
    }
}

/// Notifier that records what it was asked to deliver.
#[derive(Default)]
pub struct CollectingNotifier {
    signals: Mutex<Vec<String>>,
    statuses: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    pub fn sent_signals(&self) -> Vec<String> {
        self.signals.lock().unwrap().clone()
    }

    pub fn sent_statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn send_signal(&self, signal: &Signal, _gate_probability: Option<f64>) -> bool {
        self.signals.lock().unwrap().push(signal.symbol.clone());
        true
    }

    async fn send_status(&self, text: &str) -> bool {
        self.statuses.lock().unwrap().push(text.to_string());
        true
    }
}

/// Sleeper that records requested delays instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// A gently rising candle series long enough to score.
pub fn candles_for(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            Candle {
                timestamp: 1_700_000_000_000 + i as i64 * 3_600_000,
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
            }
        })
        .collect()
}
