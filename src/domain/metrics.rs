//! Per-sentiment trade metrics: win and loss counts, profit factor and Sharpe ratio.

use super::aggregate::{GroupStats, best_by, group_by};
use super::sentiment::Sentiment;
use super::stats::{self, present};
use super::trade::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_pnl: f64,
    pub avg_pnl: Option<f64>,
    pub volatility: Option<f64>,
    pub trade_count: usize,
    pub avg_magnitude: Option<f64>,
    pub win_rate: f64,
    pub avg_size: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    /// Gross wins over gross losses; infinite when nothing was lost.
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Metrics {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let group = GroupStats::compute(trades);
        let magnitudes = present(trades.iter().map(|t| t.magnitude()));

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for pnl in trades.iter().filter_map(|t| t.net_pnl) {
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                if pnl > largest_win {
                    largest_win = pnl;
                }
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                if pnl.abs() > largest_loss {
                    largest_loss = pnl.abs();
                }
            } else {
                trades_breakeven += 1;
            }
        }

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        Metrics {
            total_pnl: group.total_pnl,
            avg_pnl: group.avg_pnl,
            volatility: group.std_pnl,
            trade_count: group.trade_count,
            avg_magnitude: stats::mean(&magnitudes),
            win_rate: group.win_rate,
            avg_size: group.avg_size,
            sharpe_ratio: group.sharpe(),
            trades_won,
            trades_lost,
            trades_breakeven,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
        }
    }
}

/// Scores in 0..=100 for comparing buckets on one scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    pub win_rate: f64,
    /// Sharpe mapped from -2..=2 onto 0..=100.
    pub sharpe: Option<f64>,
    /// Average magnitude relative to the largest bucket.
    pub magnitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentMetrics {
    /// Buckets with trades, in bucket order.
    pub rows: Vec<(Sentiment, Metrics)>,
    pub best_overall: Option<Sentiment>,
    pub best_sharpe: Option<Sentiment>,
    pub best_win_rate: Option<Sentiment>,
}

impl SentimentMetrics {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let groups = group_by(trades, |t| Some(t.sentiment));
        let rows: Vec<(Sentiment, Metrics)> = groups
            .iter()
            .map(|(s, g)| (*s, Metrics::compute(g)))
            .collect();
        let stats: Vec<(Sentiment, GroupStats)> = groups
            .iter()
            .map(|(s, g)| (*s, GroupStats::compute(g)))
            .collect();

        Self {
            best_overall: best_by(&stats, |g| Some(g.total_pnl)),
            best_sharpe: best_by(&stats, GroupStats::sharpe),
            best_win_rate: best_by(&stats, |g| Some(g.win_rate)),
            rows,
        }
    }

    pub fn profiles(&self) -> Vec<(Sentiment, Profile)> {
        let top_magnitude = self
            .rows
            .iter()
            .filter_map(|(_, m)| m.avg_magnitude)
            .reduce(f64::max);
        self.rows
            .iter()
            .map(|(s, m)| {
                let profile = Profile {
                    win_rate: m.win_rate,
                    sharpe: m.sharpe_ratio.map(|v| ((v + 2.0) / 4.0 * 100.0).clamp(0.0, 100.0)),
                    magnitude: match (m.avg_magnitude, top_magnitude) {
                        (Some(v), Some(top)) => stats::safe_ratio(v, top).map(|r| r * 100.0),
                        _ => None,
                    },
                };
                (*s, profile)
            })
            .collect()
    }

    pub fn get(&self, sentiment: Sentiment) -> Option<&Metrics> {
        self.rows
            .iter()
            .find(|(s, _)| *s == sentiment)
            .map(|(_, m)| m)
    }
}
