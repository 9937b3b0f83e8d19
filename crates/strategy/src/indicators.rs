//! Pure indicator computations over a close-price series.
//!
//! Every function returns a sequence of the same length as its input, with
//! `None` marking positions before a lookback window has filled. EMA is the
//! exception: it seeds from the first observation instead of an SMA warm-up,
//! so every position is defined but the early values lean toward the first
//! price. Downstream scoring is calibrated against exactly this behavior;
//! do not "fix" the seeding.

/// Exponential moving average, `k = 2/(period+1)`, seeded with the first
/// price: `e[0] = price[0]`, `e[i] = price[i]*k + e[i-1]*(1-k)`.
pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    for &price in series {
        let next = match prev {
            None => price,
            Some(p) => price * k + p * (1.0 - k),
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Relative Strength Index with Wilder smoothing after a simple-mean seed
/// over the first `period` deltas. All-`None` when fewer than `period + 1`
/// prices are supplied; the leading `period` entries are always `None`.
///
/// The rolling loop consumes the delta at `i-1` and stops one bar short of
/// the end, so the tail is padded by repeating the last computed value
/// (50.0 when nothing was computed).
pub fn rsi(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = series.len();
    if n < period + 1 {
        return vec![None; n];
    }

    let mut gains = Vec::with_capacity(n - 1);
    let mut losses = Vec::with_capacity(n - 1);
    for w in series.windows(2) {
        let change = w[1] - w[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut out: Vec<Option<f64>> = vec![None; period];
    for i in period..n - 1 {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i - 1]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i - 1]) / period as f64;
        let value = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
        out.push(Some(value));
    }

    while out.len() < n {
        let last = out.last().copied().flatten().unwrap_or(50.0);
        out.push(Some(last));
    }
    out
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(series: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let ema_fast = ema(series, fast);
    let ema_slow = ema(series, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);
    let histogram: Vec<f64> = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| l - s)
        .collect();
    MacdSeries {
        line,
        signal: signal_line,
        histogram,
    }
}

/// Bollinger bands over a trailing window of `period` bars, using the
/// POPULATION standard deviation (divide by `period`, not `period - 1`).
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub mid: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger(series: &[f64], period: usize, mult: f64) -> BollingerBands {
    let n = series.len();
    if n < period {
        return BollingerBands {
            upper: vec![None; n],
            mid: vec![None; n],
            lower: vec![None; n],
        };
    }

    let mut upper = Vec::with_capacity(n);
    let mut mid = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    for i in 0..n {
        if i + 1 < period {
            upper.push(None);
            mid.push(None);
            lower.push(None);
            continue;
        }
        let window = &series[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = var.sqrt();
        upper.push(Some(mean + mult * std));
        mid.push(Some(mean));
        lower.push(Some(mean - mult * std));
    }
    BollingerBands { upper, mid, lower }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ema_seeds_with_first_price() {
        let out = ema(&[42.0, 43.0, 44.0], 20);
        assert_eq!(out[0], 42.0);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn ema_recurrence_holds_exactly() {
        let series: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let period = 12;
        let k = 2.0 / (period as f64 + 1.0);
        let out = ema(&series, period);
        for i in 1..series.len() {
            let expected = series[i] * k + out[i - 1] * (1.0 - k);
            assert!(
                (out[i] - expected).abs() < 1e-12,
                "recurrence broken at {i}: {} vs {expected}",
                out[i]
            );
        }
    }

    #[test]
    fn rsi_all_none_when_insufficient() {
        let out = rsi(&[100.0; 14], 14);
        assert_eq!(out.len(), 14);
        assert!(out.iter().all(|v| v.is_none()));
    }

    #[test]
    fn rsi_leading_window_is_none_and_output_matches_length() {
        let series: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin()).collect();
        let out = rsi(&series, 14);
        assert_eq!(out.len(), series.len());
        assert!(out[..14].iter().all(|v| v.is_none()));
        assert!(out[14..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn rsi_is_100_when_losses_are_zero() {
        let series: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&series, 14);
        let last = out.last().copied().flatten().unwrap();
        assert!((last - 100.0).abs() < 1e-9, "expected 100, got {last}");
    }

    #[test]
    fn rsi_pads_tail_with_last_value() {
        // Exactly period+1 prices: the rolling loop computes nothing, so the
        // single padded entry falls back to 50.0.
        let series: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&series, 14);
        assert_eq!(out.len(), 15);
        assert_eq!(out[14], Some(50.0));
    }

    proptest! {
        #[test]
        fn rsi_defined_values_stay_in_range(
            series in proptest::collection::vec(0.01f64..10_000.0, 2..120)
        ) {
            for value in rsi(&series, 14).into_iter().flatten() {
                prop_assert!((0.0..=100.0).contains(&value), "RSI out of range: {value}");
            }
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let series: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).cos() * 3.0).collect();
        let m = macd(&series, 12, 26, 9);
        assert_eq!(m.line.len(), series.len());
        for i in 0..series.len() {
            assert!((m.histogram[i] - (m.line[i] - m.signal[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn bollinger_none_until_window_fills() {
        let series: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let bb = bollinger(&series, 20, 2.0);
        assert!(bb.lower[..19].iter().all(|v| v.is_none()));
        assert!(bb.lower[19..].iter().all(|v| v.is_some()));
        assert_eq!(bb.lower.len(), series.len());
    }

    #[test]
    fn bollinger_all_none_when_series_shorter_than_period() {
        let bb = bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!(bb.upper.iter().all(|v| v.is_none()));
        assert!(bb.mid.iter().all(|v| v.is_none()));
        assert!(bb.lower.iter().all(|v| v.is_none()));
    }

    #[test]
    fn bollinger_bands_are_symmetric_around_mid() {
        let series: Vec<f64> = (0..30).map(|i| 50.0 + ((i * 7) % 11) as f64).collect();
        let bb = bollinger(&series, 20, 2.0);
        let i = series.len() - 1;
        let (up, mid, low) = (
            bb.upper[i].unwrap(),
            bb.mid[i].unwrap(),
            bb.lower[i].unwrap(),
        );
        assert!(((up - mid) - (mid - low)).abs() < 1e-9);
        assert!(up >= mid && mid >= low);
    }
}
