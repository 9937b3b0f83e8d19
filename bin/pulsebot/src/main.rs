use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, DisabledGate, Signal, SignalGate, TokioSleeper};
use engine::{refresh_loop, Pipeline, PipelineConfig, Resolver, SnapshotCache};
use ledger::{CandleCacheStore, HistoryStore, LedgerPolicy, PositionLedger, SignalStore};
use market::{CoinGeckoClient, GatewayConfig};
use notifier::TelegramNotifier;
use strategy::{Scorer, ScorerParams};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(symbols = cfg.symbols.len(), "PulseBot starting");

    // ── Market data gateway ───────────────────────────────────────────────────
    let provider = Arc::new(CoinGeckoClient::new(GatewayConfig {
        delay_bulk: cfg.api_delay_bulk,
        delay_ohlc: cfg.api_delay_ohlc,
        max_retries: cfg.max_retries,
        backoff_factor: cfg.backoff_factor,
    }));

    // ── Notification channel ──────────────────────────────────────────────────
    let chat_id: i64 = cfg.telegram_chat_id.parse().unwrap_or_else(|_| {
        panic!(
            "TELEGRAM_CHAT_ID must be a numeric chat id, got: '{}'",
            cfg.telegram_chat_id
        )
    });
    let telegram = Arc::new(TelegramNotifier::new(&cfg.telegram_token, chat_id));

    // ── AI gate (chosen once; no model shipped → disabled) ────────────────────
    let gate: Arc<dyn SignalGate> = Arc::new(DisabledGate);

    // ── Stores ────────────────────────────────────────────────────────────────
    let mut position_ledger = PositionLedger::open(
        &cfg.positions_file,
        LedgerPolicy {
            cooldown: cfg.cooldown,
            change_threshold_pct: cfg.change_threshold_pct,
        },
    );
    let mut history = HistoryStore::open(&cfg.history_file);
    let mut signals = SignalStore::open(&cfg.signals_file);
    let candle_cache = CandleCacheStore::new(&cfg.candle_cache_file);

    // ── Scorer ────────────────────────────────────────────────────────────────
    let scorer = Scorer::new(
        ScorerParams::load(&cfg.scorer_config_path),
        cfg.min_bars,
        cfg.min_confidence,
    );

    // ── Pipeline & resolver ───────────────────────────────────────────────────
    let pipeline = Pipeline::new(
        provider.clone(),
        telegram.clone(),
        gate,
        Arc::new(TokioSleeper),
        scorer,
        PipelineConfig {
            symbols: cfg.symbols.clone(),
            top_symbols: cfg.top_symbols,
            ohlc_days: cfg.ohlc_days,
            batch_size: cfg.batch_size,
            batch_pause: cfg.batch_pause,
            use_ai: cfg.use_ai,
            ai_threshold: cfg.ai_threshold,
        },
    );
    let resolver = Resolver::new(
        provider,
        telegram,
        cfg.expiry,
        cfg.send_status_updates,
    );

    // ── Advanced-signals snapshot cache ───────────────────────────────────────
    // Refreshed in the background; readers always see a whole snapshot.
    let snapshot_cache: Arc<SnapshotCache<Vec<Signal>>> =
        Arc::new(SnapshotCache::new(cfg.snapshot_ttl, cfg.snapshot_grace));
    {
        let signals_path = std::path::PathBuf::from(cfg.signals_file.clone());
        let interval = cfg.snapshot_ttl;
        tokio::spawn(refresh_loop(snapshot_cache.clone(), interval, move || {
            SignalStore::peek(&signals_path)
        }));
    }

    // ── Main loop: one scan, then resolve passes until the next scan ─────────
    // Strictly serialized: at most one pass touches the stores at a time.
    let run = async {
        loop {
            let scan_started = Instant::now();
            match pipeline
                .run_once(&mut position_ledger, &mut history, &mut signals, &candle_cache)
                .await
            {
                Ok(summary) => info!(
                    sent = summary.sent,
                    approved = summary.approved,
                    "Scan pass finished"
                ),
                Err(e) => error!(error = %e, "Scan pass aborted"),
            }

            while scan_started.elapsed() < cfg.scan_interval {
                tokio::time::sleep(cfg.resolve_interval).await;
                match resolver
                    .run_once(
                        &mut history,
                        &signals,
                        &mut position_ledger,
                        chrono::Utc::now(),
                    )
                    .await
                {
                    Ok(0) => {}
                    Ok(n) => info!(resolved = n, "Resolve pass finished"),
                    Err(e) => error!(error = %e, "Resolve pass aborted"),
                }
            }
        }
    };

    tokio::select! {
        _ = run => {}
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received. Exiting."),
    }
}
