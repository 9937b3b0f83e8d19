use serde::{Deserialize, Serialize};
use tracing::info;

/// Indicator periods and trade-plan multipliers, loaded from a TOML file.
///
/// Example `config/scorer.toml`:
/// ```toml
/// rsi_period = 14
/// macd_fast = 12
/// macd_slow = 26
/// macd_signal = 9
/// ema_fast = 20
/// ema_slow = 50
/// bb_period = 20
/// bb_mult = 2.0
/// sl_mult = 1.0
/// tp_mult = 2.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScorerParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub bb_period: usize,
    pub bb_mult: f64,
    /// Stop distance in units of recent mean absolute move.
    pub sl_mult: f64,
    /// Target distance in units of recent mean absolute move.
    pub tp_mult: f64,
}

impl Default for ScorerParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            ema_fast: 20,
            ema_slow: 50,
            bb_period: 20,
            bb_mult: 2.0,
            sl_mult: 1.0,
            tp_mult: 2.0,
        }
    }
}

impl ScorerParams {
    /// Load from a TOML file. Falls back to defaults when the file is
    /// absent; exits the process on a malformed file.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .unwrap_or_else(|e| panic!("Failed to parse scorer config at '{path}': {e}")),
            Err(_) => {
                info!(path, "No scorer config file found; using defaults");
                Self::default()
            }
        }
    }
}
