use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use common::{MarketDataProvider, Notifier, Outcome, Result};
use ledger::{HistoryStore, PositionLedger, SignalStore};

/// Resolves pending history records against current prices, closes the
/// matching positions and notifies outcomes. Scheduling is the caller's
/// concern; each `run_once` is a complete pass.
pub struct Resolver {
    provider: Arc<dyn MarketDataProvider>,
    notifier: Arc<dyn Notifier>,
    expiry: Duration,
    send_status_updates: bool,
}

impl Resolver {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
        expiry: Duration,
        send_status_updates: bool,
    ) -> Self {
        Self {
            provider,
            notifier,
            expiry,
            send_status_updates,
        }
    }

    /// One resolution pass. Prices are fetched once for the distinct pending
    /// symbols; the history document is rewritten only if something changed.
    /// Returns how many records reached a terminal result.
    pub async fn run_once(
        &self,
        history: &mut HistoryStore,
        signals: &SignalStore,
        ledger: &mut PositionLedger,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let pending = history.pending_symbols();
        if pending.is_empty() {
            debug!("Nothing pending to resolve");
            return Ok(0);
        }

        info!(symbols = pending.len(), "Fetching prices for pending symbols");
        let prices = self.provider.fetch_bulk_prices(&pending).await?;
        let expiry = chrono::Duration::from_std(self.expiry).unwrap_or(chrono::Duration::MAX);

        let mut resolved: Vec<(String, Outcome)> = Vec::new();
        for record in history.records_mut() {
            if !record.result.is_pending() {
                continue;
            }

            // A record may predate plan capture; fill the gaps from the most
            // recent approved signal for the symbol.
            let fallback = signals.latest_for(&record.symbol);
            let entry = record.entry.or_else(|| fallback.map(|s| s.entry));
            let target = record.target.or_else(|| fallback.map(|s| s.target));
            let stop = record.stop.or_else(|| fallback.map(|s| s.stop));
            let (Some(_entry), Some(target), Some(stop)) = (entry, target, stop) else {
                debug!(symbol = %record.symbol, "Plan incomplete; leaving pending");
                continue;
            };

            let Some(quote) = prices.get(&record.symbol) else {
                continue;
            };
            let current = quote.usd;

            let outcome = if current >= target {
                Some(Outcome::HitTarget)
            } else if current <= stop {
                Some(Outcome::HitStop)
            } else if now.signed_duration_since(record.timestamp) >= expiry {
                Some(Outcome::Expired)
            } else {
                None
            };
            let Some(outcome) = outcome else { continue };

            record.result = outcome.into();
            resolved.push((record.symbol.clone(), outcome));
        }

        for (symbol, outcome) in &resolved {
            ledger.close_position(symbol, *outcome, now)?;
            if self.send_status_updates {
                let text = status_line(symbol, *outcome, self.expiry);
                if !self.notifier.send_status(&text).await {
                    warn!(symbol = %symbol, "Status notification failed");
                }
            }
        }

        if !resolved.is_empty() {
            history.save()?;
            info!(updated = resolved.len(), "History records resolved");
        }
        Ok(resolved.len())
    }
}

fn status_line(symbol: &str, outcome: Outcome, expiry: Duration) -> String {
    match outcome {
        Outcome::HitTarget => format!("✅ {symbol}: target hit!"),
        Outcome::HitStop => format!("❌ {symbol}: stop triggered."),
        Outcome::Expired => format!(
            "⏳ {symbol}: signal expired after {}h.",
            expiry.as_secs() / 3600
        ),
    }
}
