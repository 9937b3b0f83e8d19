use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use common::{CachedAsset, MarketDataProvider, Notifier, Result, SignalGate, Sleeper};
use ledger::{CandleCacheStore, HistoryStore, PositionLedger, SignalStore};
use strategy::Scorer;

use crate::scheduler;

/// Knobs for one scan pass.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub symbols: Vec<String>,
    pub top_symbols: usize,
    pub ohlc_days: u32,
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub use_ai: bool,
    pub ai_threshold: f64,
}

/// Counters for one scan pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub selected: usize,
    pub scored: usize,
    pub approved: usize,
    pub sent: usize,
    pub suppressed: usize,
    pub gated: usize,
}

/// The scan pipeline: bulk prices → rank/select → batched OHLC → score →
/// ledger decision → delivery. Single-writer: the caller must not run two
/// passes concurrently over the same stores.
pub struct Pipeline {
    provider: Arc<dyn MarketDataProvider>,
    notifier: Arc<dyn Notifier>,
    gate: Arc<dyn SignalGate>,
    sleeper: Arc<dyn Sleeper>,
    scorer: Scorer,
    cfg: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
        gate: Arc<dyn SignalGate>,
        sleeper: Arc<dyn Sleeper>,
        scorer: Scorer,
        cfg: PipelineConfig,
    ) -> Self {
        Self {
            provider,
            notifier,
            gate,
            sleeper,
            scorer,
            cfg,
        }
    }

    /// Run one full scan. Per-asset failures are isolated and logged; a
    /// total bulk-price failure or any persistence failure aborts the run,
    /// leaving previously written documents untouched.
    pub async fn run_once(
        &self,
        ledger: &mut PositionLedger,
        history: &mut HistoryStore,
        signals: &mut SignalStore,
        candle_cache: &CandleCacheStore,
    ) -> Result<RunSummary> {
        let quotes = self.provider.fetch_bulk_prices(&self.cfg.symbols).await?;
        let ranked = scheduler::rank_by_volatility(&self.cfg.symbols, &quotes);
        let selected = scheduler::select_top(ranked, self.cfg.top_symbols);
        info!(count = selected.len(), "Symbols selected for OHLC");

        let mut summary = RunSummary {
            selected: selected.len(),
            ..Default::default()
        };
        let mut collected: Vec<CachedAsset> = Vec::new();

        for (index, batch) in scheduler::batches(&selected, self.cfg.batch_size)
            .iter()
            .enumerate()
        {
            if index > 0 {
                self.sleeper.sleep(self.cfg.batch_pause).await;
            }

            for symbol in batch {
                let candles = match self.provider.fetch_ohlc(symbol, self.cfg.ohlc_days).await {
                    Ok(candles) => candles,
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "OHLC fetch failed; skipping asset");
                        continue;
                    }
                };
                if candles.is_empty() {
                    debug!(symbol = %symbol, "No candles; skipping asset");
                    continue;
                }

                let now = Utc::now();
                let evaluation = self.scorer.evaluate(symbol, &candles, now);
                collected.push(CachedAsset {
                    symbol: symbol.clone(),
                    ohlc: candles,
                });
                let Some(evaluation) = evaluation else {
                    debug!(symbol = %symbol, "Insufficient data to score");
                    continue;
                };

                summary.scored += 1;
                history.append(evaluation.record)?;

                let Some(signal) = evaluation.signal else {
                    continue;
                };
                summary.approved += 1;

                let gate_probability = if self.cfg.use_ai {
                    self.gate
                        .predict(&signal.indicators.feature_vector(signal.confidence))
                } else {
                    None
                };
                if let Some(probability) = gate_probability {
                    if probability < self.cfg.ai_threshold {
                        info!(
                            symbol = %signal.symbol,
                            probability,
                            "Gate probability below threshold; delivery vetoed"
                        );
                        summary.gated += 1;
                        continue;
                    }
                }

                signals.append(signal.clone())?;
                let disposition = ledger.decide(&signal, now)?;
                if disposition.should_send() {
                    info!(
                        symbol = %signal.symbol,
                        disposition = %disposition,
                        confidence = signal.confidence,
                        "Broadcasting signal"
                    );
                    if !self.notifier.send_signal(&signal, gate_probability).await {
                        warn!(symbol = %signal.symbol, "Signal delivery failed");
                    }
                    summary.sent += 1;
                } else {
                    debug!(symbol = %signal.symbol, "Duplicate signal suppressed");
                    summary.suppressed += 1;
                }
            }
        }

        candle_cache.replace(&collected)?;
        info!(
            selected = summary.selected,
            scored = summary.scored,
            approved = summary.approved,
            sent = summary.sent,
            suppressed = summary.suppressed,
            "Scan complete"
        );
        Ok(summary)
    }
}
