use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Watchlist
    pub symbols: Vec<String>,
    /// How many of the ranked symbols get an OHLC fetch each run.
    pub top_symbols: usize,

    // Provider pacing / retry
    pub api_delay_bulk: Duration,
    pub api_delay_ohlc: Duration,
    pub max_retries: u32,
    pub backoff_factor: f64,

    // OHLC / scoring
    pub ohlc_days: u32,
    pub min_bars: usize,
    pub min_confidence: f64,

    // Batching
    pub batch_size: usize,
    pub batch_pause: Duration,

    // Anti-duplicate / resolution
    pub cooldown: Duration,
    pub change_threshold_pct: f64,
    pub expiry: Duration,

    // Run cadence
    pub scan_interval: Duration,
    pub resolve_interval: Duration,

    // Snapshot cache for the advanced-signals collaborator
    pub snapshot_ttl: Duration,
    pub snapshot_grace: Duration,

    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub send_status_updates: bool,

    // AI gate
    pub use_ai: bool,
    pub ai_threshold: f64,

    // Store documents
    pub positions_file: String,
    pub history_file: String,
    pub signals_file: String,
    pub candle_cache_file: String,

    // Scorer parameter file (TOML)
    pub scorer_config_path: String,
}

const DEFAULT_SYMBOLS: &str = "BTCUSDT,ETHUSDT,BNBUSDT,XRPUSDT,ADAUSDT,DOGEUSDT,\
                               SOLUSDT,MATICUSDT,DOTUSDT,LTCUSDT,LINKUSDT";

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let symbols: Vec<String> = optional_env("SYMBOLS")
            .unwrap_or_else(|| DEFAULT_SYMBOLS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Config {
            symbols,
            top_symbols: parsed_env("TOP_SYMBOLS", 20),
            api_delay_bulk: secs_env("API_DELAY_BULK", 2.5),
            api_delay_ohlc: secs_env("API_DELAY_OHLC", 12.0),
            max_retries: parsed_env("MAX_RETRIES", 6),
            backoff_factor: parsed_env("BACKOFF_FACTOR", 2.5),
            ohlc_days: parsed_env("OHLC_DAYS", 14),
            min_bars: parsed_env("MIN_BARS", 40),
            min_confidence: normalized_confidence(parsed_env("MIN_CONFIDENCE", 0.50)),
            batch_size: parsed_env("BATCH_OHLC", 8),
            batch_pause: secs_env("BATCH_PAUSE_SEC", 60.0),
            cooldown: hours_env("COOLDOWN_HOURS", 6.0),
            change_threshold_pct: parsed_env("CHANGE_THRESHOLD_PCT", 1.0),
            expiry: hours_env("RESOLVE_EXPIRY_HOURS", 36.0),
            scan_interval: secs_env("SCAN_INTERVAL_SEC", 3600.0),
            resolve_interval: secs_env("RESOLVE_INTERVAL_SEC", 900.0),
            snapshot_ttl: secs_env("SNAPSHOT_TTL_SEC", 300.0),
            snapshot_grace: secs_env("SNAPSHOT_GRACE_SEC", 3600.0),
            telegram_token: required_env("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: required_env("TELEGRAM_CHAT_ID"),
            send_status_updates: parsed_env("SEND_STATUS_UPDATES", true),
            use_ai: parsed_env("USE_AI", false),
            ai_threshold: parsed_env("AI_THRESHOLD", 0.55),
            positions_file: optional_env("POSITIONS_FILE")
                .unwrap_or_else(|| "positions.json".to_string()),
            history_file: optional_env("HISTORY_FILE")
                .unwrap_or_else(|| "history.json".to_string()),
            signals_file: optional_env("SIGNALS_FILE")
                .unwrap_or_else(|| "signals.json".to_string()),
            candle_cache_file: optional_env("DATA_RAW_FILE")
                .unwrap_or_else(|| "data_raw.json".to_string()),
            scorer_config_path: optional_env("SCORER_CONFIG_PATH")
                .unwrap_or_else(|| "config/scorer.toml".to_string()),
        }
    }
}

/// Thresholds may be given as a fraction (0.5) or a percentage (50).
fn normalized_confidence(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    optional_env(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn secs_env(key: &str, default: f64) -> Duration {
    Duration::from_secs_f64(parsed_env(key, default))
}

fn hours_env(key: &str, default: f64) -> Duration {
    Duration::from_secs_f64(parsed_env(key, default) * 3600.0)
}
