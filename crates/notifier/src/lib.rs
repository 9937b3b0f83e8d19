//! Telegram delivery for accepted signals and resolution updates.
//!
//! Fire-and-forget: delivery retries with its own doubling backoff and
//! reports success via the return value. A failed delivery never fails a
//! pipeline run.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::{info, warn};

use common::{Notifier, Signal};

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
    max_retries: u32,
    retry_delay: Duration,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }

    async fn deliver(&self, text: &str) -> bool {
        let mut delay = self.retry_delay;
        for attempt in 1..=self.max_retries {
            match self
                .bot
                .send_message(self.chat_id, text)
                .parse_mode(ParseMode::Html)
                .disable_web_page_preview(true)
                .await
            {
                Ok(_) => return true,
                Err(e) => {
                    warn!(attempt, max = self.max_retries, error = %e, "Telegram delivery failed");
                    if attempt < self.max_retries {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        false
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_signal(&self, signal: &Signal, gate_probability: Option<f64>) -> bool {
        let ok = self.deliver(&render_signal(signal, gate_probability)).await;
        if ok {
            info!(symbol = %signal.symbol, "Signal notification delivered");
        } else {
            warn!(symbol = %signal.symbol, "Signal notification failed after retries");
        }
        ok
    }

    async fn send_status(&self, text: &str) -> bool {
        self.deliver(text).await
    }
}

/// Build the HTML message for a new signal.
pub fn render_signal(signal: &Signal, gate_probability: Option<f64>) -> String {
    let mut lines = vec![
        format!("📢 <b>New signal</b> for <b>{}</b>", signal.symbol),
        format!("🎯 <b>Entry:</b> <code>{}</code>", fmt_price(signal.entry)),
        format!("🎯 <b>Target:</b> <code>{}</code>", fmt_price(signal.target)),
        format!("🛑 <b>Stop:</b> <code>{}</code>", fmt_price(signal.stop)),
    ];
    if let Some(rr) = signal.risk_reward {
        lines.push(format!("📊 <b>R:R:</b> <code>{rr:.2}</code>"));
    }
    lines.push(format!(
        "📈 <b>Confidence:</b> <code>{}%</code>",
        fmt_percent(signal.confidence)
    ));
    if let Some(probability) = gate_probability {
        lines.push(format!(
            "🧠 <b>AI (proba):</b> <code>{}%</code>",
            fmt_percent(probability)
        ));
    }
    lines.push(format!(
        "🧠 <b>Strategy:</b> <code>{}</code>",
        signal.strategy
    ));
    lines.push(format!(
        "📅 <b>Created:</b> <code>{}</code>",
        signal.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(format!("🆔 <b>ID:</b> <code>{}</code>", signal.id));
    lines.join("\n")
}

/// More decimals for low-priced assets, fewer for expensive ones.
fn fmt_price(price: f64) -> String {
    if price < 0.001 {
        format!("{price:.8}")
    } else if price < 0.01 {
        format!("{price:.6}")
    } else if price < 1.0 {
        format!("{price:.4}")
    } else {
        format!("{price:.2}")
    }
}

/// Fractions in [0, 1] are shown as percentages; anything larger is assumed
/// to already be one.
fn fmt_percent(value: f64) -> String {
    let pct = if value <= 1.0 { value * 100.0 } else { value };
    format!("{pct:.2}")
}
