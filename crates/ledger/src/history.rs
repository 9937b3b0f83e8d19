use std::path::{Path, PathBuf};

use common::{CachedAsset, HistoryRecord, Result, Signal};

use crate::doc::{load_document, save_document};

/// Append-only record of every scored asset, pass or fail. Backed by a
/// single JSON array document.
pub struct HistoryStore {
    path: PathBuf,
    records: Vec<HistoryRecord>,
}

impl HistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_document(&path, Vec::new);
        Self { path, records }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Mutable access for the resolution engine. Callers must `save` after
    /// changing anything.
    pub fn records_mut(&mut self) -> &mut [HistoryRecord] {
        &mut self.records
    }

    pub fn append(&mut self, record: HistoryRecord) -> Result<()> {
        self.records.push(record);
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        save_document(&self.path, &self.records)
    }

    /// Distinct symbols that still have a pending record, in first-seen
    /// order.
    pub fn pending_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for record in &self.records {
            if record.result.is_pending() && !out.contains(&record.symbol) {
                out.push(record.symbol.clone());
            }
        }
        out
    }
}

/// Ordered log of approved signals. The resolution engine reads it to fill
/// in entry/target/stop for history records that predate plan capture.
pub struct SignalStore {
    path: PathBuf,
    signals: Vec<Signal>,
}

impl SignalStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let signals = load_document(&path, Vec::new);
        Self { path, signals }
    }

    /// Read-only snapshot of the document, for concurrent readers like the
    /// advanced-signals cache refresher.
    pub fn peek(path: &Path) -> Vec<Signal> {
        load_document(path, Vec::new)
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn append(&mut self, signal: Signal) -> Result<()> {
        self.signals.push(signal);
        save_document(&self.path, &self.signals)
    }

    /// The most recent approved signal for a symbol, by timestamp.
    pub fn latest_for(&self, symbol: &str) -> Option<&Signal> {
        self.signals
            .iter()
            .filter(|s| s.symbol == symbol)
            .max_by_key(|s| s.timestamp)
    }
}

/// Whole-document cache of the raw candles collected in the last run.
pub struct CandleCacheStore {
    path: PathBuf,
}

impl CandleCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn replace(&self, assets: &[CachedAsset]) -> Result<()> {
        save_document(&self.path, &assets)
    }

    pub fn load(&self) -> Vec<CachedAsset> {
        load_document(&self.path, Vec::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Candle, IndicatorSnapshot, SignalResult, Verdict};

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 55.0,
            macd_line: 0.2,
            signal_line: 0.1,
            histogram: 0.1,
            ema20: 101.0,
            ema50: 100.0,
            bb_upper: 106.0,
            bb_mid: 101.0,
            bb_lower: 96.0,
        }
    }

    fn record(symbol: &str, result: SignalResult) -> HistoryRecord {
        HistoryRecord {
            symbol: symbol.into(),
            timestamp: Utc::now(),
            score: 0.66,
            verdict: Verdict::Approved,
            entry: Some(100.0),
            target: Some(110.0),
            stop: Some(90.0),
            indicators: snapshot(),
            recorded_at: Utc::now(),
            result,
        }
    }

    fn signal_at(symbol: &str, hours_ago: i64, entry: f64) -> Signal {
        Signal {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            timestamp: Utc::now() - chrono::Duration::hours(hours_ago),
            confidence: 0.8,
            entry,
            target: entry * 1.1,
            stop: entry * 0.9,
            risk_reward: Some(2.0),
            strategy: "RSI+MACD+EMA+BB".into(),
            indicators: snapshot(),
        }
    }

    #[test]
    fn history_appends_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path);
        store.append(record("BTCUSDT", SignalResult::Pending)).unwrap();
        store.append(record("ETHUSDT", SignalResult::HitTarget)).unwrap();

        let reloaded = HistoryStore::open(&path);
        assert_eq!(reloaded.records().len(), 2);
        assert_eq!(reloaded.records()[0].symbol, "BTCUSDT");
    }

    #[test]
    fn pending_symbols_are_distinct_and_exclude_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json"));
        store.append(record("BTCUSDT", SignalResult::Pending)).unwrap();
        store.append(record("BTCUSDT", SignalResult::Pending)).unwrap();
        store.append(record("ETHUSDT", SignalResult::HitStop)).unwrap();
        store.append(record("SOLUSDT", SignalResult::Pending)).unwrap();

        assert_eq!(store.pending_symbols(), vec!["BTCUSDT", "SOLUSDT"]);
    }

    #[test]
    fn latest_for_picks_the_newest_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SignalStore::open(dir.path().join("signals.json"));
        store.append(signal_at("BTCUSDT", 10, 100.0)).unwrap();
        store.append(signal_at("BTCUSDT", 1, 105.0)).unwrap();
        store.append(signal_at("ETHUSDT", 0, 2000.0)).unwrap();

        assert_eq!(store.latest_for("BTCUSDT").unwrap().entry, 105.0);
        assert!(store.latest_for("XRPUSDT").is_none());
    }

    #[test]
    fn candle_cache_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CandleCacheStore::new(dir.path().join("data_raw.json"));
        let assets = vec![CachedAsset {
            symbol: "BTCUSDT".into(),
            ohlc: vec![Candle {
                timestamp: 1_700_000_000_000,
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
            }],
        }];
        cache.replace(&assets).unwrap();
        assert_eq!(cache.load(), assets);
    }
}
