use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use common::{Candle, Error, MarketDataProvider, QuoteSnapshot, Result, Sleeper, TokioSleeper};

use crate::backoff::Backoff;
use crate::symbols::provider_id;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const BACKOFF_CEILING: Duration = Duration::from_secs(60);

/// Pacing and retry policy against the provider's rate limits.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Fixed delay before every bulk price call.
    pub delay_bulk: Duration,
    /// Base spacing between OHLC calls; also the initial backoff delay.
    pub delay_ohlc: Duration,
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            delay_bulk: Duration::from_secs_f64(2.5),
            delay_ohlc: Duration::from_secs(12),
            max_retries: 6,
            backoff_factor: 2.5,
        }
    }
}

/// REST client for the CoinGecko public API.
///
/// All waiting goes through the injected [`Sleeper`], so pacing and backoff
/// are observable in tests without real elapsed time.
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    cfg: GatewayConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl CoinGeckoClient {
    pub fn new(cfg: GatewayConfig) -> Self {
        Self::with_sleeper(cfg, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(cfg: GatewayConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            http: Client::builder()
                .user_agent("PulseBot/1.0")
                .build()
                .expect("Failed to build HTTP client"),
            base_url: BASE_URL.to_string(),
            cfg,
            sleeper,
        }
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn fetch_bulk_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, QuoteSnapshot>> {
        let ids: Vec<String> = symbols.iter().map(|s| provider_id(s)).collect();
        let url = format!("{}/simple/price", self.base_url);

        // Light pre-call delay to space successive runs apart.
        self.sleeper.sleep(self.cfg.delay_bulk).await;

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("ids", ids.join(",").as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ])
            .timeout(Duration::from_secs(20))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let data: HashMap<String, QuoteSnapshot> = resp
            .json()
            .await
            .map_err(|e| Error::Network(format!("invalid bulk price payload: {e}")))?;

        // Re-key by the symbols the caller asked with. Assets the provider
        // does not know are dropped, not errors.
        let mut out = HashMap::new();
        for (symbol, id) in symbols.iter().zip(ids) {
            if let Some(quote) = data.get(&id) {
                out.insert(symbol.clone(), *quote);
            }
        }
        Ok(out)
    }

    async fn fetch_ohlc(&self, symbol: &str, days: u32) -> Result<Vec<Candle>> {
        let coin_id = provider_id(symbol);
        let url = format!("{}/coins/{}/ohlc", self.base_url, coin_id);
        let mut backoff = Backoff::new(
            self.cfg.delay_ohlc,
            self.cfg.backoff_factor,
            BACKOFF_CEILING,
        );

        for attempt in 1..=self.cfg.max_retries {
            let sent = self
                .http
                .get(&url)
                .query(&[("vs_currency", "usd".to_string()), ("days", days.to_string())])
                .timeout(Duration::from_secs(25))
                .send()
                .await;

            match sent {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let rows: Vec<[f64; 5]> = resp.json().await.map_err(|e| {
                            Error::Network(format!("invalid OHLC payload for {coin_id}: {e}"))
                        })?;
                        // Post-success spacing keeps consecutive OHLC calls
                        // under the provider's throughput limit.
                        self.sleeper
                            .sleep(self.cfg.delay_ohlc + jitter(0.4, 1.6))
                            .await;
                        return Ok(candles_from_rows(&rows));
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let hint = parse_retry_after(resp.headers().get(reqwest::header::RETRY_AFTER));
                        let wait = hint
                            .map(Duration::from_secs_f64)
                            .unwrap_or_else(|| backoff.delay())
                            + jitter(0.8, 2.0);
                        warn!(
                            coin = %coin_id,
                            attempt,
                            max = self.cfg.max_retries,
                            wait_secs = wait.as_secs_f64(),
                            "Rate limited on OHLC; backing off"
                        );
                        self.sleeper.sleep(wait).await;
                        backoff.grow();
                        continue;
                    }

                    if status.is_server_error() {
                        let wait = backoff.delay() + jitter(0.8, 2.0);
                        warn!(
                            coin = %coin_id,
                            status = status.as_u16(),
                            wait_secs = wait.as_secs_f64(),
                            "Server error on OHLC; backing off"
                        );
                        self.sleeper.sleep(wait).await;
                        backoff.grow();
                        continue;
                    }

                    // Anything else is not worth retrying for this asset.
                    let body = resp.text().await.unwrap_or_default();
                    return Err(Error::Http {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => {
                    let wait = backoff.delay() + jitter(0.8, 2.0);
                    warn!(
                        coin = %coin_id,
                        attempt,
                        error = %e,
                        wait_secs = wait.as_secs_f64(),
                        "OHLC request failed; backing off"
                    );
                    self.sleeper.sleep(wait).await;
                    backoff.grow();
                }
            }
        }

        debug!(coin = %coin_id, "OHLC retry budget exhausted; treating as insufficient data");
        Ok(Vec::new())
    }
}

fn candles_from_rows(rows: &[[f64; 5]]) -> Vec<Candle> {
    rows.iter()
        .map(|row| Candle {
            timestamp: row[0] as i64,
            open: row[1],
            high: row[2],
            low: row[3],
            close: row[4],
        })
        .collect()
}

fn parse_retry_after(value: Option<&HeaderValue>) -> Option<f64> {
    value?.to_str().ok()?.trim().parse().ok()
}

fn jitter(lo: f64, hi: f64) -> Duration {
    Duration::from_secs_f64(rand::thread_rng().gen_range(lo..hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_become_candles_in_order() {
        let rows = vec![
            [1_700_000_000_000.0, 1.0, 2.0, 0.5, 1.5],
            [1_700_000_060_000.0, 1.5, 2.5, 1.0, 2.0],
        ];
        let candles = candles_from_rows(&rows);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert_eq!(candles[0].close, 1.5);
        assert_eq!(candles[1].open, 1.5);
    }

    #[test]
    fn retry_after_parses_seconds() {
        let value = HeaderValue::from_static("30");
        assert_eq!(parse_retry_after(Some(&value)), Some(30.0));

        let garbage = HeaderValue::from_static("soon");
        assert_eq!(parse_retry_after(Some(&garbage)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn jitter_stays_in_range() {
        for _ in 0..100 {
            let j = jitter(0.4, 1.6).as_secs_f64();
            assert!((0.4..1.6).contains(&j), "jitter out of range: {j}");
        }
    }
}
