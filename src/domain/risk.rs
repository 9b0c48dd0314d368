//! Risk-adjusted views of the sentiment buckets.

use super::aggregate::{self, GroupStats, best_by, sizes, worst_by};
use super::sentiment::Sentiment;
use super::stats;
use super::trade::TradeRecord;

/// Sharpe above which a bucket counts as a strong opportunity.
pub const STRONG_SHARPE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PositionStats {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let size = sizes(trades);
        Self {
            mean: stats::mean(&size),
            median: stats::median(&size),
            std: stats::std_dev(&size),
            min: stats::min(&size),
            max: stats::max(&size),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    HighVolatility(Vec<Sentiment>),
    NegativeSharpe(Vec<Sentiment>),
    StrongOpportunity(Vec<Sentiment>),
    ConservativeSizing(Sentiment),
}

impl Recommendation {
    pub fn headline(&self) -> &'static str {
        match self {
            Self::HighVolatility(_) => "High Volatility Alert",
            Self::NegativeSharpe(_) => "Negative Sharpe Ratios",
            Self::StrongOpportunity(_) => "Strong Opportunities",
            Self::ConservativeSizing(_) => "Position Sizing",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::HighVolatility(s) => format!(
                "{} show above-median volatility. Consider reducing position sizes.",
                join_labels(s)
            ),
            Self::NegativeSharpe(s) => format!(
                "{} have negative risk-adjusted returns. Re-evaluate strategy.",
                join_labels(s)
            ),
            Self::StrongOpportunity(s) => format!(
                "{} show favorable risk-adjusted returns (Sharpe > {STRONG_SHARPE}).",
                join_labels(s)
            ),
            Self::ConservativeSizing(s) => format!(
                "Best performer ({s}) uses below-average position sizes. Consider conservative sizing."
            ),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::HighVolatility(_) | Self::NegativeSharpe(_))
    }
}

fn join_labels(sentiments: &[Sentiment]) -> String {
    sentiments
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything the risk page shows about the sentiment buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReport {
    /// Only buckets with trades, in bucket order.
    pub buckets: Vec<(Sentiment, GroupStats)>,
    pub positions: Vec<(Sentiment, PositionStats)>,
    pub most_volatile: Option<Sentiment>,
    pub least_volatile: Option<Sentiment>,
    pub most_efficient: Option<Sentiment>,
    pub best_sharpe: Option<Sentiment>,
    pub worst_sharpe: Option<Sentiment>,
    pub most_consistent: Option<Sentiment>,
    pub average_position: Option<f64>,
    pub recommendations: Vec<Recommendation>,
}

impl RiskReport {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let groups = aggregate::group_by(trades, |t| Some(t.sentiment));
        let buckets: Vec<(Sentiment, GroupStats)> = groups
            .iter()
            .map(|(s, g)| (*s, GroupStats::compute(g)))
            .collect();
        let positions = groups
            .iter()
            .map(|(s, g)| (*s, PositionStats::compute(g)))
            .collect();

        let best_sharpe = best_by(&buckets, GroupStats::sharpe);
        let average_position = stats::mean(&sizes(trades));
        let recommendations = recommend(&buckets, best_sharpe, average_position);

        Self {
            most_volatile: best_by(&buckets, |s| s.std_pnl),
            least_volatile: worst_by(&buckets, |s| s.std_pnl),
            most_efficient: worst_by(&buckets, GroupStats::coefficient_of_variation),
            best_sharpe,
            worst_sharpe: worst_by(&buckets, GroupStats::sharpe),
            most_consistent: worst_by(&buckets, |s| s.std_pnl),
            average_position,
            recommendations,
            buckets,
            positions,
        }
    }

    pub fn stats_of(&self, sentiment: Sentiment) -> Option<&GroupStats> {
        self.buckets
            .iter()
            .find(|(s, _)| *s == sentiment)
            .map(|(_, g)| g)
    }
}

fn recommend(
    buckets: &[(Sentiment, GroupStats)],
    best_sharpe: Option<Sentiment>,
    average_position: Option<f64>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let stds: Vec<f64> = buckets.iter().filter_map(|(_, g)| g.std_pnl).collect();
    if let Some(median_std) = stats::median(&stds) {
        let high: Vec<Sentiment> = buckets
            .iter()
            .filter(|(_, g)| g.std_pnl.is_some_and(|s| s > median_std))
            .map(|(s, _)| *s)
            .collect();
        if !high.is_empty() {
            out.push(Recommendation::HighVolatility(high));
        }
    }

    let negative = select(buckets, |sharpe| sharpe < 0.0);
    if !negative.is_empty() {
        out.push(Recommendation::NegativeSharpe(negative));
    }
    let strong = select(buckets, |sharpe| sharpe > STRONG_SHARPE);
    if !strong.is_empty() {
        out.push(Recommendation::StrongOpportunity(strong));
    }

    if let (Some(best), Some(overall)) = (best_sharpe, average_position) {
        let best_size = buckets
            .iter()
            .find(|(s, _)| *s == best)
            .and_then(|(_, g)| g.avg_size);
        if best_size.is_some_and(|size| size < overall) {
            out.push(Recommendation::ConservativeSizing(best));
        }
    }
    out
}

fn select(buckets: &[(Sentiment, GroupStats)], pred: impl Fn(f64) -> bool) -> Vec<Sentiment> {
    buckets
        .iter()
        .filter(|(_, g)| g.sharpe().is_some_and(&pred))
        .map(|(s, _)| *s)
        .collect()
}
