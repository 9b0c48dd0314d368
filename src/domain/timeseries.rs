//! Daily PnL series, rolling statistics and drawdown.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

use super::stats::{self, present};
use super::trade::TradeRecord;

pub const MIN_ROLLING_WINDOW: usize = 1;
pub const MAX_ROLLING_WINDOW: usize = 30;
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub net_pnl: f64,
    /// Index value of the first trade that day.
    pub index_value: f64,
    pub cumulative_pnl: f64,
}

/// Per-day net PnL sums in date order, with running cumulative PnL.
pub fn daily_performance(trades: &[&TradeRecord]) -> Vec<DailyPoint> {
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for t in trades {
        let entry = days.entry(t.date).or_insert((0.0, t.index_value));
        if let Some(pnl) = t.net_pnl {
            entry.0 += pnl;
        }
    }

    let mut cumulative = 0.0;
    days.into_iter()
        .map(|(date, (net_pnl, index_value))| {
            cumulative += net_pnl;
            DailyPoint {
                date,
                net_pnl,
                index_value,
                cumulative_pnl: cumulative,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub net_pnl: f64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

/// Rolling mean and std of daily PnL. `window` is clamped to the supported range.
pub fn rolling_daily(daily: &[DailyPoint], window: usize) -> Vec<RollingPoint> {
    let window = window.clamp(MIN_ROLLING_WINDOW, MAX_ROLLING_WINDOW);
    let values: Vec<f64> = daily.iter().map(|d| d.net_pnl).collect();
    let means = stats::rolling_mean(&values, window);
    let stds = stats::rolling_std(&values, window);
    daily
        .iter()
        .zip(means)
        .zip(stds)
        .map(|((d, mean), std)| RollingPoint {
            date: d.date,
            net_pnl: d.net_pnl,
            mean,
            std,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub cumulative_pnl: f64,
    pub running_max: f64,
    /// Cumulative PnL minus the running maximum; never positive.
    pub drawdown: f64,
    /// Drawdown relative to the running maximum; undefined while the peak is zero.
    pub drawdown_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    Recovered { date: NaiveDate, days: i64 },
    NotRecovered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownAnalysis {
    pub series: Vec<DrawdownPoint>,
    pub max_drawdown: f64,
    pub max_drawdown_pct: Option<f64>,
    pub max_drawdown_date: NaiveDate,
    pub recovery: Recovery,
}

/// Peak-to-trough analysis of cumulative daily PnL. `None` without data.
pub fn drawdown(daily: &[DailyPoint]) -> Option<DrawdownAnalysis> {
    let first = daily.first()?;

    let mut peak = first.cumulative_pnl;
    let series: Vec<DrawdownPoint> = daily
        .iter()
        .map(|d| {
            peak = peak.max(d.cumulative_pnl);
            let dd = d.cumulative_pnl - peak;
            DrawdownPoint {
                date: d.date,
                cumulative_pnl: d.cumulative_pnl,
                running_max: peak,
                drawdown: dd,
                drawdown_pct: stats::safe_ratio(dd, peak).map(|r| r * 100.0),
            }
        })
        .collect();

    let mut trough = &series[0];
    for p in &series[1..] {
        if p.drawdown < trough.drawdown {
            trough = p;
        }
    }

    let max_drawdown_pct = series
        .iter()
        .filter_map(|p| p.drawdown_pct)
        .reduce(f64::min);

    let recovery = series
        .iter()
        .find(|p| p.date > trough.date && p.cumulative_pnl >= trough.running_max)
        .map(|p| Recovery::Recovered {
            date: p.date,
            days: (p.date - trough.date).num_days(),
        })
        .unwrap_or(Recovery::NotRecovered);

    Some(DrawdownAnalysis {
        max_drawdown: trough.drawdown,
        max_drawdown_date: trough.date,
        max_drawdown_pct,
        recovery,
        series,
    })
}

/// Mean position size per week, weeks starting on Monday.
pub fn weekly_avg_size(trades: &[&TradeRecord]) -> Vec<(NaiveDate, f64)> {
    let mut weeks: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for t in trades {
        let offset = t.date.weekday().num_days_from_monday() as i64;
        weeks
            .entry(t.date - Duration::days(offset))
            .or_default()
            .push(t.size_usd);
    }
    weeks
        .into_iter()
        .filter_map(|(week, sizes)| stats::mean(&present(sizes)).map(|m| (week, m)))
        .collect()
}
