use chrono::{DateTime, Utc};

use common::{
    Candle, HistoryRecord, IndicatorSnapshot, Signal, SignalResult, Verdict, STRATEGY_TAG,
};

use crate::config::ScorerParams;
use crate::indicators::{bollinger, ema, macd, rsi};

/// Entry/target/stop derived from recent volatility.
#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub entry: f64,
    pub target: f64,
    pub stop: f64,
    /// `None` when entry == stop.
    pub risk_reward: Option<f64>,
}

/// The outcome of scoring one asset: a history record in every case, and a
/// finalized signal only when confidence cleared the threshold.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub record: HistoryRecord,
    pub signal: Option<Signal>,
}

/// Turns a candle series into a confidence score and trade plan.
/// Pure: no I/O, no stored state beyond its parameters.
pub struct Scorer {
    params: ScorerParams,
    min_bars: usize,
    threshold: f64,
}

impl Scorer {
    pub fn new(params: ScorerParams, min_bars: usize, threshold: f64) -> Self {
        Self {
            params,
            min_bars,
            threshold,
        }
    }

    /// Blend four bounded sub-scores into a confidence value in [0, 1].
    /// Returns `None` when the series is too short or RSI/Bollinger are
    /// undefined at the last bar. That is "no signal", not an error.
    pub fn score_signal(&self, closes: &[f64]) -> Option<(f64, IndicatorSnapshot)> {
        let p = &self.params;
        let n = closes.len();
        if n < self.min_bars || n < 2 {
            return None;
        }

        let r = rsi(closes, p.rsi_period);
        let m = macd(closes, p.macd_fast, p.macd_slow, p.macd_signal);
        let ema_fast = ema(closes, p.ema_fast);
        let ema_slow = ema(closes, p.ema_slow);
        let bb = bollinger(closes, p.bb_period, p.bb_mult);

        let i = n - 1;
        let (Some(rsi_i), Some(bb_up), Some(bb_mid), Some(bb_low)) =
            (r[i], bb.upper[i], bb.mid[i], bb.lower[i])
        else {
            return None;
        };
        let close = closes[i];

        let rsi_zone = if (40.0..=65.0).contains(&rsi_i) {
            1.0
        } else if (38.0..=70.0).contains(&rsi_i) {
            0.6
        } else {
            0.0
        };
        let crossed_up = m.line[i] > m.signal[i] && m.line[i - 1] <= m.signal[i - 1];
        let momentum = if crossed_up {
            1.0
        } else if m.histogram[i] > 0.0 {
            0.7
        } else {
            0.2
        };
        let trend = if ema_fast[i] > ema_slow[i] { 1.0 } else { 0.35 };
        let band = if close <= bb_low * 1.03 { 1.0 } else { 0.5 };

        let base = (rsi_zone + momentum + trend + band) / 4.0;
        let extra = if close > ema_fast[i] { 0.10 } else { 0.0 };
        let mut score = base + extra;

        // Reward signals whose histogram is near its recent extreme.
        let window = &m.histogram[n.saturating_sub(20)..];
        let peak = window.iter().fold(0.0f64, |acc, h| acc.max(h.abs()));
        let vol_boost = (m.histogram[i].abs() / (peak + 1e-9)).clamp(0.0, 1.0);
        score = 0.85 * score + 0.15 * vol_boost;

        let snapshot = IndicatorSnapshot {
            rsi: rsi_i,
            macd_line: m.line[i],
            signal_line: m.signal[i],
            histogram: m.histogram[i],
            ema20: ema_fast[i],
            ema50: ema_slow[i],
            bb_upper: bb_up,
            bb_mid: bb_mid,
            bb_lower: bb_low,
        };
        Some((score.clamp(0.0, 1.0), snapshot))
    }

    /// Stop/target around the last close, sized by the mean absolute
    /// close-to-close move over the final 15 bars. Needs at least 30 bars.
    pub fn build_trade_plan(&self, closes: &[f64]) -> Option<TradePlan> {
        if closes.len() < 30 {
            return None;
        }
        let last = closes[closes.len() - 1];
        let tail = &closes[closes.len() - 16..];
        let vol = tail.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / 15.0;

        let stop = last - vol * self.params.sl_mult;
        let target = last + vol * self.params.tp_mult;
        let denom = last - stop;
        let risk_reward = (denom != 0.0).then(|| (target - last) / denom);
        Some(TradePlan {
            entry: last,
            target,
            stop,
            risk_reward,
        })
    }

    /// Score one asset and build its history record. Returns `None` when the
    /// asset could not be scored at all (insufficient data); a sub-threshold
    /// confidence still yields a record, just no signal.
    pub fn evaluate(
        &self,
        symbol: &str,
        candles: &[Candle],
        now: DateTime<Utc>,
    ) -> Option<Evaluation> {
        if candles.is_empty() {
            return None;
        }
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let (score, indicators) = self.score_signal(&closes)?;
        let plan = self.build_trade_plan(&closes)?;

        let confidence = (score * 10_000.0).round() / 10_000.0;
        let verdict = if confidence >= self.threshold {
            Verdict::Approved
        } else {
            Verdict::Rejected
        };

        let record = HistoryRecord {
            symbol: symbol.to_string(),
            timestamp: now,
            score: confidence,
            verdict,
            entry: Some(plan.entry),
            target: Some(plan.target),
            stop: Some(plan.stop),
            indicators,
            recorded_at: now,
            result: SignalResult::Pending,
        };
        let signal = (verdict == Verdict::Approved).then(|| Signal {
            id: Signal::new_id(),
            symbol: symbol.to_string(),
            timestamp: now,
            confidence,
            entry: plan.entry,
            target: plan.target,
            stop: plan.stop,
            risk_reward: plan.risk_reward.map(|rr| (rr * 100.0).round() / 100.0),
            strategy: STRATEGY_TAG.to_string(),
            indicators,
        });
        Some(Evaluation { record, signal })
    }
}
