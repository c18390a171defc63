//! Journal statistics engine
//!
//! Derives aggregate and time-bucketed performance statistics from a set of
//! canonical trades. `analyze` is a pure function: it re-sorts by date, so
//! input order never matters, and it never fails — degenerate input produces
//! zeroed statistics.


use crate::types::{Outcome, Trade};
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Fallback bucket label for missing categorical values
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// One point on the cumulative equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    /// Running R total up to and including this trade, 2 decimals
    pub cumulative_r: Decimal,
}

/// Wins/total tally for one breakdown bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    pub wins: usize,
    pub total: usize,
}

/// Monthly bucket carries net R and its own win rate on top of the tally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub wins: usize,
    pub total: usize,
    /// Net R for the month, 2 decimals
    pub r: Decimal,
    /// Integer percent
    pub win_rate: u32,
}

/// Aggregate journal statistics, recomputed wholesale on every load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalStats {
    /// Dated trades, ascending by date
    pub trades: Vec<Trade>,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    /// Integer percent of wins over all dated trades
    pub win_rate: u32,
    /// Mean winning R, 2-decimal magnitude
    pub avg_win: Decimal,
    /// Mean losing R, 2-decimal magnitude
    pub avg_loss: Decimal,
    /// Expectancy per trade in R, 3 decimals
    pub ev: Decimal,
    pub equity: Vec<EquityPoint>,
    /// Last cumulative R
    pub cur_r: Decimal,
    /// Highest cumulative R seen
    pub peak_r: Decimal,
    /// Integer percent retracement from peak; 0 when the peak is not positive
    pub drawdown: u32,
    /// "YYYY-MM" -> monthly tally
    pub monthly: BTreeMap<String, MonthlyStats>,
    pub sessions: BTreeMap<String, BucketStats>,
    pub grades: BTreeMap<String, BucketStats>,
    pub timeframes: BTreeMap<String, BucketStats>,
}

fn round_pct(numerator: Decimal, denominator: Decimal) -> u32 {
    if denominator.is_zero() {
        return 0;
    }
    (numerator / denominator * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, ROUNDING)
        .to_u32()
        .unwrap_or(0)
}

fn mean_magnitude(trades: &[&Trade]) -> Decimal {
    if trades.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = trades
        .iter()
        .map(|t| t.r_multiple.unwrap_or_default().abs())
        .sum();
    (sum / Decimal::from(trades.len())).round_dp_with_strategy(2, ROUNDING)
}

/// Derive journal statistics from a set of trades.
///
/// Trades without a date are excluded entirely; a missing `r_multiple`
/// contributes 0 to every sum but the trade still counts toward totals.
pub fn analyze(trades: &[Trade]) -> JournalStats {
    let mut dated: Vec<Trade> = trades.iter().filter(|t| t.date.is_some()).cloned().collect();
    // Tie-break on id so any permutation of the input yields the same output
    dated.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut stats = JournalStats::default();
    if dated.is_empty() {
        return stats;
    }

    let mut running = Decimal::ZERO;
    for trade in &dated {
        let Some(date) = trade.date else { continue };
        let r = trade.r_multiple.unwrap_or_default();
        running += r;
        let cumulative_r = running.round_dp_with_strategy(2, ROUNDING);
        stats.equity.push(EquityPoint { date, cumulative_r });

        match trade.outcome {
            Outcome::Win => stats.wins += 1,
            Outcome::Lose => stats.losses += 1,
            Outcome::Breakeven => stats.breakevens += 1,
            Outcome::Unknown => {}
        }

        let month_key = format!("{:04}-{:02}", date.year(), date.month());
        let month = stats.monthly.entry(month_key).or_default();
        month.total += 1;
        month.r += r;
        if trade.outcome == Outcome::Win {
            month.wins += 1;
        }

        for (bucket, label) in [
            (&mut stats.sessions, trade.session.as_deref()),
            (&mut stats.grades, trade.grade.map(|g| g.to_string()).as_deref()),
            (&mut stats.timeframes, trade.timeframe.as_deref()),
        ] {
            let entry = bucket
                .entry(label.unwrap_or(UNKNOWN_BUCKET).to_string())
                .or_default();
            entry.total += 1;
            if trade.outcome == Outcome::Win {
                entry.wins += 1;
            }
        }
    }

    for month in stats.monthly.values_mut() {
        month.r = month.r.round_dp_with_strategy(2, ROUNDING);
        month.win_rate = round_pct(Decimal::from(month.wins), Decimal::from(month.total));
    }

    let total = dated.len();
    stats.win_rate = round_pct(Decimal::from(stats.wins), Decimal::from(total));

    let winners: Vec<&Trade> = dated.iter().filter(|t| t.outcome == Outcome::Win).collect();
    let losers: Vec<&Trade> = dated.iter().filter(|t| t.outcome == Outcome::Lose).collect();
    stats.avg_win = mean_magnitude(&winners);
    stats.avg_loss = mean_magnitude(&losers);

    let wr = Decimal::from(stats.win_rate) / Decimal::ONE_HUNDRED;
    stats.ev = (wr * stats.avg_win - (Decimal::ONE - wr) * stats.avg_loss)
        .round_dp_with_strategy(3, ROUNDING);

    stats.cur_r = stats.equity.last().map(|p| p.cumulative_r).unwrap_or_default();
    stats.peak_r = stats
        .equity
        .iter()
        .map(|p| p.cumulative_r)
        .max()
        .unwrap_or_default();
    // Guard: a non-positive peak has no meaningful retracement
    stats.drawdown = if stats.peak_r > Decimal::ZERO {
        round_pct(stats.peak_r - stats.cur_r, stats.peak_r)
    } else {
        0
    };

    stats.trades = dated;
    stats
}
