use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Disposition, Outcome, Position, PositionStatus, Result, Signal};

use crate::doc::{load_document, save_document};

/// Relative difference reported when the stored baseline is zero: past any
/// sane threshold, so a zero baseline always counts as "changed".
const MAX_DIFF_PCT: f64 = 999.0;

/// The position ledger document: `{open: [...], closed: [...]}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionBook {
    #[serde(default)]
    pub open: Vec<Position>,
    #[serde(default)]
    pub closed: Vec<Position>,
}

/// Anti-duplicate parameters.
#[derive(Debug, Clone)]
pub struct LedgerPolicy {
    /// Minimum time before an unchanged plan may be resent.
    pub cooldown: Duration,
    /// Relative move in entry/target/stop that forces a resend regardless
    /// of cooldown.
    pub change_threshold_pct: f64,
}

impl PositionBook {
    pub fn open_for(&self, symbol: &str) -> Option<&Position> {
        self.open
            .iter()
            .find(|p| p.symbol == symbol && p.status == PositionStatus::Open)
    }

    /// Decide what to do with an incoming signal. Mutates the book for
    /// every disposition except `Duplicate`:
    /// - no open position → register, send ("new")
    /// - plan moved past the threshold → overwrite, send ("changed")
    /// - cooldown elapsed → refresh `last_sent_at`, send ("cooldown")
    /// - otherwise → untouched, suppress ("duplicate")
    pub fn decide(
        &mut self,
        signal: &Signal,
        now: DateTime<Utc>,
        policy: &LedgerPolicy,
    ) -> Disposition {
        let found = self
            .open
            .iter()
            .position(|p| p.symbol == signal.symbol && p.status == PositionStatus::Open);

        let Some(idx) = found else {
            self.open.push(Position {
                symbol: signal.symbol.clone(),
                entry: signal.entry,
                target: signal.target,
                stop: signal.stop,
                created_at: now,
                last_sent_at: now,
                status: PositionStatus::Open,
                closed_at: None,
            });
            return Disposition::New;
        };
        let position = &mut self.open[idx];

        let changed = pct_diff(position.entry, signal.entry) > policy.change_threshold_pct
            || pct_diff(position.target, signal.target) > policy.change_threshold_pct
            || pct_diff(position.stop, signal.stop) > policy.change_threshold_pct;

        let cooldown = chrono::Duration::from_std(policy.cooldown)
            .unwrap_or(chrono::Duration::MAX);
        let cooldown_over = now.signed_duration_since(position.last_sent_at) >= cooldown;

        if changed || cooldown_over {
            position.entry = signal.entry;
            position.target = signal.target;
            position.stop = signal.stop;
            position.last_sent_at = now;
            if changed {
                Disposition::Changed
            } else {
                Disposition::Cooldown
            }
        } else {
            Disposition::Duplicate
        }
    }

    /// Move the open position for `symbol` to the closed set with the given
    /// outcome. Idempotent: returns false and mutates nothing when the
    /// symbol has no open position.
    pub fn close(&mut self, symbol: &str, outcome: Outcome, now: DateTime<Utc>) -> bool {
        let Some(idx) = self
            .open
            .iter()
            .position(|p| p.symbol == symbol && p.status == PositionStatus::Open)
        else {
            return false;
        };
        let mut position = self.open.remove(idx);
        position.status = outcome.into();
        position.closed_at = Some(now);
        self.closed.push(position);
        true
    }
}

fn pct_diff(stored: f64, new: f64) -> f64 {
    if stored == 0.0 {
        return MAX_DIFF_PCT;
    }
    (stored - new).abs() / stored.abs() * 100.0
}

/// The persistent ledger: the in-memory book plus its document path.
/// Every mutating decision is written back immediately, so the on-disk
/// document always reflects the last decision taken.
pub struct PositionLedger {
    path: PathBuf,
    policy: LedgerPolicy,
    book: PositionBook,
}

impl PositionLedger {
    pub fn open(path: impl Into<PathBuf>, policy: LedgerPolicy) -> Self {
        let path = path.into();
        let book = load_document(&path, PositionBook::default);
        Self { path, policy, book }
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn decide(&mut self, signal: &Signal, now: DateTime<Utc>) -> Result<Disposition> {
        let disposition = self.book.decide(signal, now, &self.policy);
        if disposition != Disposition::Duplicate {
            save_document(&self.path, &self.book)?;
        }
        Ok(disposition)
    }

    pub fn close_position(
        &mut self,
        symbol: &str,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let closed = self.book.close(symbol, outcome, now);
        if closed {
            info!(symbol, outcome = %outcome, "Position closed");
            save_document(&self.path, &self.book)?;
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::IndicatorSnapshot;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 50.0,
            macd_line: 0.1,
            signal_line: 0.05,
            histogram: 0.05,
            ema20: 100.0,
            ema50: 99.0,
            bb_upper: 105.0,
            bb_mid: 100.0,
            bb_lower: 95.0,
        }
    }

    fn signal(symbol: &str, entry: f64, target: f64, stop: f64) -> Signal {
        Signal {
            id: "test".into(),
            symbol: symbol.into(),
            timestamp: Utc::now(),
            confidence: 0.7,
            entry,
            target,
            stop,
            risk_reward: Some(2.0),
            strategy: "RSI+MACD+EMA+BB".into(),
            indicators: snapshot(),
        }
    }

    fn policy() -> LedgerPolicy {
        LedgerPolicy {
            cooldown: Duration::from_secs(6 * 3600),
            change_threshold_pct: 1.0,
        }
    }

    #[test]
    fn first_signal_registers_as_new() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        let d = book.decide(&signal("X", 100.0, 110.0, 90.0), now, &policy());
        assert_eq!(d, Disposition::New);
        assert!(d.should_send());
        let pos = book.open_for("X").unwrap();
        assert_eq!(pos.entry, 100.0);
        assert_eq!(pos.status, PositionStatus::Open);
    }

    #[test]
    fn repeat_within_cooldown_is_a_duplicate() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        book.decide(&signal("X", 100.0, 110.0, 90.0), now, &policy());
        let later = now + chrono::Duration::minutes(5);
        let d = book.decide(&signal("X", 100.0, 110.0, 90.0), later, &policy());
        assert_eq!(d, Disposition::Duplicate);
        assert!(!d.should_send());
        // no mutation on duplicates
        assert_eq!(book.open_for("X").unwrap().last_sent_at, now);
    }

    #[test]
    fn entry_moving_past_threshold_forces_resend() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        book.decide(&signal("X", 100.0, 110.0, 90.0), now, &policy());
        let later = now + chrono::Duration::minutes(5);
        let d = book.decide(&signal("X", 103.0, 110.0, 90.0), later, &policy());
        assert_eq!(d, Disposition::Changed);
        let pos = book.open_for("X").unwrap();
        assert_eq!(pos.entry, 103.0);
        assert_eq!(pos.last_sent_at, later);
    }

    #[test]
    fn cooldown_re_arms_even_without_changes() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        book.decide(&signal("X", 100.0, 110.0, 90.0), now, &policy());
        let later = now + chrono::Duration::hours(7);
        let d = book.decide(&signal("X", 100.0, 110.0, 90.0), later, &policy());
        assert_eq!(d, Disposition::Cooldown);
        assert_eq!(book.open_for("X").unwrap().last_sent_at, later);
    }

    #[test]
    fn change_takes_precedence_over_cooldown() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        book.decide(&signal("X", 100.0, 110.0, 90.0), now, &policy());
        let later = now + chrono::Duration::hours(7);
        let d = book.decide(&signal("X", 110.0, 120.0, 95.0), later, &policy());
        assert_eq!(d, Disposition::Changed);
    }

    #[test]
    fn zero_baseline_always_counts_as_changed() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        book.decide(&signal("X", 0.0, 110.0, 90.0), now, &policy());
        let d = book.decide(&signal("X", 0.0, 110.0, 90.0), now, &policy());
        assert_eq!(d, Disposition::Changed);
    }

    #[test]
    fn repeated_signals_never_create_a_second_open_position() {
        let mut book = PositionBook::default();
        let mut now = Utc::now();
        for i in 0..10 {
            book.decide(&signal("X", 100.0 + i as f64, 110.0, 90.0), now, &policy());
            now += chrono::Duration::hours(1);
        }
        assert_eq!(book.open.len(), 1);
    }

    #[test]
    fn close_moves_position_to_closed_set() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        book.decide(&signal("X", 100.0, 110.0, 90.0), now, &policy());
        assert!(book.close("X", Outcome::HitTarget, now));
        assert!(book.open_for("X").is_none());
        assert_eq!(book.closed.len(), 1);
        assert_eq!(book.closed[0].status, PositionStatus::HitTarget);
        assert_eq!(book.closed[0].closed_at, Some(now));
    }

    #[test]
    fn close_is_idempotent() {
        let mut book = PositionBook::default();
        let now = Utc::now();
        assert!(!book.close("X", Outcome::HitStop, now));
        book.decide(&signal("X", 100.0, 110.0, 90.0), now, &policy());
        assert!(book.close("X", Outcome::HitStop, now));
        assert!(!book.close("X", Outcome::HitStop, now));
        assert_eq!(book.closed.len(), 1);
    }

    #[test]
    fn ledger_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        let now = Utc::now();

        let mut ledger = PositionLedger::open(&path, policy());
        ledger.decide(&signal("X", 100.0, 110.0, 90.0), now).unwrap();
        ledger.decide(&signal("Y", 5.0, 6.0, 4.0), now).unwrap();
        ledger.close_position("Y", Outcome::Expired, now).unwrap();
        let before = ledger.book().clone();

        let reloaded = PositionLedger::open(&path, policy());
        assert_eq!(*reloaded.book(), before);
    }
}
