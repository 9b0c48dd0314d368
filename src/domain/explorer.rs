//! Trade-level exploration, CSV export rows and fee impact.

use std::cmp::Ordering;

use super::aggregate::{self, net_pnls, win_rate_pct};
use super::error::DashboardError;
use super::sentiment::Sentiment;
use super::stats::{self, present};
use super::trade::{Side, TradeRecord};

pub const DEFAULT_EXPLORER_ROWS: usize = 10;

pub const EXPORT_HEADERS: [&str; 9] = [
    "Timestamp IST",
    "Sentiment",
    "Side",
    "Size USD",
    "Closed PnL",
    "Fee",
    "Net PnL",
    "PnL %",
    "Session",
];

pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideView {
    #[default]
    All,
    Only(Side),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    NetPnl,
    Size,
    Fee,
    PnlPercentage,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::NetPnl,
        SortKey::Size,
        SortKey::Fee,
        SortKey::PnlPercentage,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            SortKey::NetPnl => "net_pnl",
            SortKey::Size => "size",
            SortKey::Fee => "fee",
            SortKey::PnlPercentage => "pnl_pct",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::NetPnl => "Net PnL",
            SortKey::Size => "Size USD",
            SortKey::Fee => "Fee",
            SortKey::PnlPercentage => "PnL %",
        }
    }

    fn value(self, trade: &TradeRecord) -> Option<f64> {
        match self {
            SortKey::NetPnl => trade.net_pnl,
            SortKey::Size => trade.size_usd,
            SortKey::Fee => trade.fee,
            SortKey::PnlPercentage => trade.pnl_percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerOptions {
    /// Minimum absolute net PnL; zero disables the threshold.
    pub min_pnl: f64,
    pub side: SideView,
    pub sort: SortKey,
    pub rows: usize,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            min_pnl: 0.0,
            side: SideView::All,
            sort: SortKey::NetPnl,
            rows: DEFAULT_EXPLORER_ROWS,
        }
    }
}

impl ExplorerOptions {
    /// Read `min_pnl`, `side_view`, `sort` and `rows` from query pairs.
    pub fn from_pairs(pairs: &[(String, String)], default_rows: usize) -> Result<Self, DashboardError> {
        let mut opts = ExplorerOptions {
            rows: default_rows,
            ..Default::default()
        };
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "min_pnl" => {
                    let v: f64 = value.parse().map_err(|_| {
                        DashboardError::invalid_filter("min_pnl", format!("'{}' is not a number", value))
                    })?;
                    if !v.is_finite() || v < 0.0 {
                        return Err(DashboardError::invalid_filter("min_pnl", "must be zero or more"));
                    }
                    opts.min_pnl = v;
                }
                "side_view" => {
                    opts.side = if value.eq_ignore_ascii_case("all") {
                        SideView::All
                    } else {
                        SideView::Only(
                            value
                                .parse::<Side>()
                                .map_err(|e| DashboardError::invalid_filter("side_view", e))?,
                        )
                    };
                }
                "sort" => {
                    opts.sort = SortKey::ALL
                        .into_iter()
                        .find(|k| k.slug() == value)
                        .ok_or_else(|| {
                            DashboardError::invalid_filter(
                                "sort",
                                format!("expected net_pnl, size, fee or pnl_pct, got '{}'", value),
                            )
                        })?;
                }
                "rows" => {
                    opts.rows = match value.parse::<usize>() {
                        Ok(n) if n > 0 => n,
                        _ => {
                            return Err(DashboardError::invalid_filter(
                                "rows",
                                "must be a positive integer",
                            ));
                        }
                    };
                }
                _ => {}
            }
        }
        Ok(opts)
    }

    pub fn matches(&self, trade: &TradeRecord) -> bool {
        if self.min_pnl > 0.0 && !trade.magnitude().is_some_and(|m| m >= self.min_pnl) {
            return false;
        }
        match self.side {
            SideView::All => true,
            SideView::Only(side) => trade.side == Some(side),
        }
    }
}

/// The explorer view: threshold and side applied, sorted descending by the
/// chosen key with missing values last. Ties keep ledger order.
pub fn explore<'a>(trades: &[&'a TradeRecord], opts: &ExplorerOptions) -> Vec<&'a TradeRecord> {
    let mut view: Vec<&'a TradeRecord> = trades.iter().copied().filter(|t| opts.matches(t)).collect();
    view.sort_by(|a, b| match (opts.sort.value(a), opts.sort.value(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    view
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerSummary {
    pub count: usize,
    pub total_pnl: f64,
    pub avg_pnl: Option<f64>,
    pub win_rate: f64,
    pub total_fees: f64,
}

impl ExplorerSummary {
    pub fn compute(view: &[&TradeRecord]) -> Self {
        let pnl = net_pnls(view);
        let wins = view.iter().filter(|t| t.is_profitable).count();
        Self {
            count: view.len(),
            total_pnl: stats::sum(&pnl),
            avg_pnl: stats::mean(&pnl),
            win_rate: win_rate_pct(wins, view.len()),
            total_fees: stats::sum(&present(view.iter().map(|t| t.fee))),
        }
    }
}

/// One export line in [`EXPORT_HEADERS`] order; missing values are empty.
pub fn export_record(trade: &TradeRecord) -> Vec<String> {
    let num = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    vec![
        trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        trade.sentiment.label().to_string(),
        trade.side.map(|s| s.label().to_string()).unwrap_or_default(),
        num(trade.size_usd),
        num(trade.closed_pnl),
        num(trade.fee),
        num(trade.net_pnl),
        num(trade.pnl_percentage()),
        trade.session.label().to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeCohort {
    pub count: usize,
    pub avg_fee_ratio: Option<f64>,
    pub avg_net_pnl: Option<f64>,
    pub win_rate: f64,
}

impl FeeCohort {
    fn compute(trades: &[&TradeRecord]) -> Self {
        let wins = trades.iter().filter(|t| t.is_profitable).count();
        Self {
            count: trades.len(),
            avg_fee_ratio: stats::mean(&present(trades.iter().map(|t| t.fee_ratio()))),
            avg_net_pnl: stats::mean(&net_pnls(trades)),
            win_rate: win_rate_pct(wins, trades.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeAnalysis {
    pub total_fees: f64,
    /// Sum of closed PnL before fees.
    pub gross_profit: f64,
    /// Fees as a percentage of gross profit; undefined at zero gross profit.
    pub fee_pct_of_profit: Option<f64>,
    pub fees_by_sentiment: Vec<(Sentiment, f64)>,
    /// Mean fee ratio in percent, per bucket.
    pub fee_ratio_by_sentiment: Vec<(Sentiment, Option<f64>)>,
    /// Trades whose fee ratio is above the 75th percentile.
    pub high_fee: Option<FeeCohort>,
    /// Trades whose fee ratio is at or below the 25th percentile.
    pub low_fee: Option<FeeCohort>,
}

impl FeeAnalysis {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let total_fees = stats::sum(&present(trades.iter().map(|t| t.fee)));
        let gross_profit = stats::sum(&present(trades.iter().map(|t| t.closed_pnl)));

        let groups = aggregate::group_by(trades, |t| Some(t.sentiment));
        let fees_by_sentiment = Sentiment::ALL
            .iter()
            .map(|s| {
                let fees = groups
                    .get(s)
                    .map(|g| stats::sum(&present(g.iter().map(|t| t.fee))))
                    .unwrap_or(0.0);
                (*s, fees)
            })
            .collect();
        let fee_ratio_by_sentiment = Sentiment::ALL
            .iter()
            .map(|s| {
                let ratio = groups
                    .get(s)
                    .and_then(|g| stats::mean(&present(g.iter().map(|t| t.fee_ratio()))));
                (*s, ratio)
            })
            .collect();

        let ratios = present(trades.iter().map(|t| t.fee_ratio()));
        let cohort = |pred: &dyn Fn(f64) -> bool| {
            let members: Vec<&TradeRecord> = trades
                .iter()
                .copied()
                .filter(|t| t.fee_ratio().is_some_and(pred))
                .collect();
            FeeCohort::compute(&members)
        };
        let high_fee = stats::quantile(&ratios, 0.75).map(|q75| cohort(&|r| r > q75));
        let low_fee = stats::quantile(&ratios, 0.25).map(|q25| cohort(&|r| r <= q25));

        Self {
            total_fees,
            gross_profit,
            fee_pct_of_profit: stats::safe_ratio(total_fees, gross_profit).map(|r| r * 100.0),
            fees_by_sentiment,
            fee_ratio_by_sentiment,
            high_fee,
            low_fee,
        }
    }
}
