use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLC candle from the market data provider.
/// Timestamps are provider-native milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Bulk price entry for one asset from the provider's simple-price endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub usd: f64,
    /// 24-hour percentage change. The provider may omit it for thin assets.
    #[serde(default)]
    pub usd_24h_change: f64,
}

/// Latest indicator values captured at signal time. Field order here is
/// load-bearing: `feature_vector` feeds the AI gate in exactly this order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub bb_upper: f64,
    pub bb_mid: f64,
    pub bb_lower: f64,
}

impl IndicatorSnapshot {
    /// Fixed-order feature vector for the AI gate: the nine indicator values
    /// followed by the confidence score.
    pub fn feature_vector(&self, confidence: f64) -> [f64; 10] {
        [
            self.rsi,
            self.macd_line,
            self.signal_line,
            self.histogram,
            self.ema20,
            self.ema50,
            self.bb_upper,
            self.bb_mid,
            self.bb_lower,
            confidence,
        ]
    }
}

/// A finalized trade signal. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    /// Blended confidence score in [0, 1].
    pub confidence: f64,
    pub entry: f64,
    pub target: f64,
    pub stop: f64,
    /// `None` when entry == stop (degenerate plan).
    pub risk_reward: Option<f64>,
    pub strategy: String,
    pub indicators: IndicatorSnapshot,
}

impl Signal {
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Strategy tag stamped on every signal this pipeline produces.
pub const STRATEGY_TAG: &str = "RSI+MACD+EMA+BB";

/// Terminal outcome of a resolved signal or closed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    HitTarget,
    HitStop,
    Expired,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::HitTarget => write!(f, "hit_target"),
            Outcome::HitStop => write!(f, "hit_stop"),
            Outcome::Expired => write!(f, "expired"),
        }
    }
}

/// Lifecycle state of a tracked position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    HitTarget,
    HitStop,
    Expired,
}

impl From<Outcome> for PositionStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::HitTarget => PositionStatus::HitTarget,
            Outcome::HitStop => PositionStatus::HitStop,
            Outcome::Expired => PositionStatus::Expired,
        }
    }
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "open"),
            PositionStatus::HitTarget => write!(f, "hit_target"),
            PositionStatus::HitStop => write!(f, "hit_stop"),
            PositionStatus::Expired => write!(f, "expired"),
        }
    }
}

/// An open or closed position tracked by the ledger. At most one position
/// per symbol may be `Open` at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub entry: f64,
    pub target: f64,
    pub stop: f64,
    pub created_at: DateTime<Utc>,
    pub last_sent_at: DateTime<Utc>,
    pub status: PositionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Whether a scored asset cleared the confidence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Approved => write!(f, "approved"),
            Verdict::Rejected => write!(f, "rejected"),
        }
    }
}

/// Resolution state of a history record. Moves from `Pending` to a terminal
/// value exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalResult {
    Pending,
    HitTarget,
    HitStop,
    Expired,
}

impl SignalResult {
    pub fn is_pending(&self) -> bool {
        matches!(self, SignalResult::Pending)
    }
}

impl From<Outcome> for SignalResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::HitTarget => SignalResult::HitTarget,
            Outcome::HitStop => SignalResult::HitStop,
            Outcome::Expired => SignalResult::Expired,
        }
    }
}

impl std::fmt::Display for SignalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalResult::Pending => write!(f, "pending"),
            SignalResult::HitTarget => write!(f, "hit_target"),
            SignalResult::HitStop => write!(f, "hit_stop"),
            SignalResult::Expired => write!(f, "expired"),
        }
    }
}

/// One row in the append-only scoring history. Every scored asset produces a
/// record, whether or not it cleared the threshold. `entry/target/stop` are
/// optional so the resolver can fall back to the signals document when a
/// record predates plan capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<f64>,
    pub indicators: IndicatorSnapshot,
    pub recorded_at: DateTime<Utc>,
    pub result: SignalResult,
}

/// What the ledger decided to do with an incoming signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// No open position existed; one was registered.
    New,
    /// Open position existed but the plan moved past the change threshold.
    Changed,
    /// Open position existed, unchanged, but the cooldown elapsed.
    Cooldown,
    /// Open position exists and nothing warrants a resend.
    Duplicate,
}

impl Disposition {
    /// Duplicates are suppressed; everything else goes out.
    pub fn should_send(&self) -> bool {
        !matches!(self, Disposition::Duplicate)
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::New => write!(f, "new"),
            Disposition::Changed => write!(f, "changed"),
            Disposition::Cooldown => write!(f, "cooldown"),
            Disposition::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// One asset's raw candles as persisted in the candle cache document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAsset {
    pub symbol: String,
    pub ohlc: Vec<Candle>,
}
