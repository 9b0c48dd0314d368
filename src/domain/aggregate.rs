//! Group-by summaries of the filtered trade table.

use chrono::Weekday;
use std::collections::BTreeMap;

use super::sentiment::Sentiment;
use super::stats::{self, complete_pairs, pearson, present, safe_ratio};
use super::trade::{Side, TradeRecord, TradingSession, WEEKDAYS};

/// Headline numbers for a set of trades.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub total_trades: usize,
    pub total_pnl: f64,
    /// Percentage of trades with positive net PnL.
    pub win_rate: f64,
    pub avg_pnl: Option<f64>,
    pub total_volume: f64,
}

impl Overview {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let pnl = net_pnls(trades);
        let wins = trades.iter().filter(|t| t.is_profitable).count();
        Self {
            total_trades: trades.len(),
            total_pnl: stats::sum(&pnl),
            win_rate: win_rate_pct(wins, trades.len()),
            avg_pnl: stats::mean(&pnl),
            total_volume: stats::sum(&sizes(trades)),
        }
    }
}

/// Summary statistics of one group of trades.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupStats {
    pub trade_count: usize,
    pub total_pnl: f64,
    pub avg_pnl: Option<f64>,
    pub std_pnl: Option<f64>,
    pub min_pnl: Option<f64>,
    pub max_pnl: Option<f64>,
    pub total_volume: f64,
    pub avg_size: Option<f64>,
    pub std_size: Option<f64>,
    pub total_fees: f64,
    /// Percentage of trades with positive net PnL.
    pub win_rate: f64,
}

impl GroupStats {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let pnl = net_pnls(trades);
        let size = sizes(trades);
        let fees = present(trades.iter().map(|t| t.fee));
        let wins = trades.iter().filter(|t| t.is_profitable).count();
        Self {
            trade_count: trades.len(),
            total_pnl: stats::sum(&pnl),
            avg_pnl: stats::mean(&pnl),
            std_pnl: stats::std_dev(&pnl),
            min_pnl: stats::min(&pnl),
            max_pnl: stats::max(&pnl),
            total_volume: stats::sum(&size),
            avg_size: stats::mean(&size),
            std_size: stats::std_dev(&size),
            total_fees: stats::sum(&fees),
            win_rate: win_rate_pct(wins, trades.len()),
        }
    }

    /// Mean PnL over its standard deviation.
    pub fn sharpe(&self) -> Option<f64> {
        safe_ratio(self.avg_pnl?, self.std_pnl?)
    }

    /// Standard deviation over absolute mean, in percent.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        safe_ratio(self.std_pnl?, self.avg_pnl?.abs()).map(|cv| cv * 100.0)
    }
}

pub fn net_pnls(trades: &[&TradeRecord]) -> Vec<f64> {
    present(trades.iter().map(|t| t.net_pnl))
}

pub fn sizes(trades: &[&TradeRecord]) -> Vec<f64> {
    present(trades.iter().map(|t| t.size_usd))
}

pub fn win_rate_pct(wins: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64 * 100.0
    }
}

/// Partition trades by a key; rows whose key is `None` are left out.
pub fn group_by<'a, K, F>(trades: &[&'a TradeRecord], key: F) -> BTreeMap<K, Vec<&'a TradeRecord>>
where
    K: Ord,
    F: Fn(&TradeRecord) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&'a TradeRecord>> = BTreeMap::new();
    for &t in trades {
        if let Some(k) = key(t) {
            groups.entry(k).or_default().push(t);
        }
    }
    groups
}

/// Stats for every sentiment bucket in order; empty buckets get zeroed stats.
pub fn by_sentiment(trades: &[&TradeRecord]) -> Vec<(Sentiment, GroupStats)> {
    let groups = group_by(trades, |t| Some(t.sentiment));
    Sentiment::ALL
        .iter()
        .map(|s| {
            let stats = groups
                .get(s)
                .map(|g| GroupStats::compute(g))
                .unwrap_or_default();
            (*s, stats)
        })
        .collect()
}

/// Stats for the sides present in the data.
pub fn by_side(trades: &[&TradeRecord]) -> Vec<(Side, GroupStats)> {
    group_by(trades, |t| t.side)
        .into_iter()
        .map(|(k, g)| (k, GroupStats::compute(&g)))
        .collect()
}

/// Stats for the sessions present in the data.
pub fn by_session(trades: &[&TradeRecord]) -> Vec<(TradingSession, GroupStats)> {
    group_by(trades, |t| Some(t.session))
        .into_iter()
        .map(|(k, g)| (k, GroupStats::compute(&g)))
        .collect()
}

/// Stats for the hours of day present in the data.
pub fn by_hour(trades: &[&TradeRecord]) -> Vec<(u32, GroupStats)> {
    group_by(trades, |t| Some(t.hour()))
        .into_iter()
        .map(|(k, g)| (k, GroupStats::compute(&g)))
        .collect()
}

/// Stats for Monday through Sunday; empty days get zeroed stats.
pub fn by_weekday(trades: &[&TradeRecord]) -> Vec<(Weekday, GroupStats)> {
    let groups = group_by(trades, |t| Some(t.weekday().num_days_from_monday()));
    WEEKDAYS
        .iter()
        .map(|d| {
            let stats = groups
                .get(&d.num_days_from_monday())
                .map(|g| GroupStats::compute(g))
                .unwrap_or_default();
            (*d, stats)
        })
        .collect()
}

/// Trade counts per sentiment bucket.
pub fn sentiment_distribution(trades: &[&TradeRecord]) -> Vec<(Sentiment, usize)> {
    let mut counts = [0usize; 5];
    for t in trades {
        counts[t.sentiment.index()] += 1;
    }
    Sentiment::ALL.iter().map(|s| (*s, counts[s.index()])).collect()
}

/// A two-way table; cells are `None` where no trades fall.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot<R, C> {
    pub rows: Vec<R>,
    pub cols: Vec<C>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl<R: PartialEq, C: PartialEq> Pivot<R, C> {
    pub fn get(&self, row: &R, col: &C) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.cols.iter().position(|x| x == col)?;
        self.cells[r][c]
    }
}

pub fn pivot<R, C, FR, FC>(
    trades: &[&TradeRecord],
    rows: Vec<R>,
    cols: Vec<C>,
    row_key: FR,
    col_key: FC,
    agg: fn(&[&TradeRecord]) -> Option<f64>,
) -> Pivot<R, C>
where
    R: PartialEq,
    C: PartialEq,
    FR: Fn(&TradeRecord) -> Option<R>,
    FC: Fn(&TradeRecord) -> Option<C>,
{
    let mut buckets: Vec<Vec<Vec<&TradeRecord>>> = vec![vec![Vec::new(); cols.len()]; rows.len()];
    for &t in trades {
        let (Some(rk), Some(ck)) = (row_key(t), col_key(t)) else {
            continue;
        };
        let (Some(r), Some(c)) = (
            rows.iter().position(|x| *x == rk),
            cols.iter().position(|x| *x == ck),
        ) else {
            continue;
        };
        buckets[r][c].push(t);
    }
    let cells = buckets
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| if cell.is_empty() { None } else { agg(cell) })
                .collect()
        })
        .collect();
    Pivot { rows, cols, cells }
}

pub fn sum_pnl(trades: &[&TradeRecord]) -> Option<f64> {
    Some(stats::sum(&net_pnls(trades)))
}

pub fn mean_pnl(trades: &[&TradeRecord]) -> Option<f64> {
    stats::mean(&net_pnls(trades))
}

pub fn mean_size(trades: &[&TradeRecord]) -> Option<f64> {
    stats::mean(&sizes(trades))
}

pub fn win_rate_of(trades: &[&TradeRecord]) -> Option<f64> {
    let wins = trades.iter().filter(|t| t.is_profitable).count();
    Some(win_rate_pct(wins, trades.len()))
}

/// Sentiment rows by side columns.
pub fn sentiment_by_side(
    trades: &[&TradeRecord],
    agg: fn(&[&TradeRecord]) -> Option<f64>,
) -> Pivot<Sentiment, Side> {
    pivot(
        trades,
        Sentiment::ALL.to_vec(),
        Side::ALL.to_vec(),
        |t| Some(t.sentiment),
        |t| t.side,
        agg,
    )
}

/// Session rows by sentiment columns of mean net PnL.
pub fn session_by_sentiment(trades: &[&TradeRecord]) -> Pivot<TradingSession, Sentiment> {
    pivot(
        trades,
        TradingSession::ALL.to_vec(),
        Sentiment::ALL.to_vec(),
        |t| Some(t.session),
        |t| Some(t.sentiment),
        mean_pnl,
    )
}

/// Sentiment rows by profitability columns (losing, winning) of mean size.
pub fn size_by_profitability(trades: &[&TradeRecord]) -> Pivot<Sentiment, bool> {
    pivot(
        trades,
        Sentiment::ALL.to_vec(),
        vec![false, true],
        |t| Some(t.sentiment),
        |t| Some(t.is_profitable),
        mean_size,
    )
}

/// Pairwise Pearson correlations between the numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<&'static str>,
    pub values: Vec<Vec<Option<f64>>>,
}

pub const CORRELATION_LABELS: [&str; 5] = ["Sentiment", "PnL", "Trade Size", "Fee", "Hour"];

pub fn correlation_matrix(trades: &[&TradeRecord]) -> CorrelationMatrix {
    let columns: Vec<Vec<Option<f64>>> = vec![
        trades.iter().map(|t| Some(t.index_value)).collect(),
        trades.iter().map(|t| t.net_pnl).collect(),
        trades.iter().map(|t| t.size_usd).collect(),
        trades.iter().map(|t| t.fee).collect(),
        trades.iter().map(|t| Some(t.hour() as f64)).collect(),
    ];
    let values = columns
        .iter()
        .enumerate()
        .map(|(i, a)| {
            columns
                .iter()
                .enumerate()
                .map(|(j, b)| {
                    let pairs = complete_pairs(a.iter().copied().zip(b.iter().copied()));
                    if i == j && pearson(&pairs).is_some() {
                        Some(1.0)
                    } else {
                        pearson(&pairs)
                    }
                })
                .collect()
        })
        .collect();
    CorrelationMatrix {
        labels: CORRELATION_LABELS.to_vec(),
        values,
    }
}

/// Correlation of the index value with net PnL.
pub fn sentiment_pnl_correlation(trades: &[&TradeRecord]) -> Option<f64> {
    let pairs = complete_pairs(trades.iter().map(|t| (Some(t.index_value), t.net_pnl)));
    pearson(&pairs)
}

/// Bucket with the greatest value of `metric`, skipping `None`. Ties keep the first.
pub fn best_by<K: Copy>(rows: &[(K, GroupStats)], metric: fn(&GroupStats) -> Option<f64>) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (k, s) in rows {
        if let Some(v) = metric(s) {
            if best.is_none_or(|(_, b)| v > b) {
                best = Some((*k, v));
            }
        }
    }
    best.map(|(k, _)| k)
}

/// Bucket with the least value of `metric`, skipping `None`. Ties keep the first.
pub fn worst_by<K: Copy>(rows: &[(K, GroupStats)], metric: fn(&GroupStats) -> Option<f64>) -> Option<K> {
    let mut worst: Option<(K, f64)> = None;
    for (k, s) in rows {
        if let Some(v) = metric(s) {
            if worst.is_none_or(|(_, w)| v < w) {
                worst = Some((*k, v));
            }
        }
    }
    worst.map(|(k, _)| k)
}
