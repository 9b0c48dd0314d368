use super::dashboard::correlation_strength;
use super::{PageContext, kpi_cards, section, sentiment_label, table};
use crate::adapters::format::{MISSING, count, currency, currency_opt, pct};
use crate::domain::aggregate::{GroupStats, Overview, best_by, by_sentiment, sentiment_pnl_correlation, worst_by};
use crate::domain::sentiment::Sentiment;
use crate::domain::trade::TradeRecord;

/// Headline facts about the loaded data and the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub overview: Overview,
    pub date_range: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
    pub best: Option<Sentiment>,
    pub worst: Option<Sentiment>,
    pub correlation: Option<f64>,
}

impl DatasetSummary {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let buckets: Vec<(Sentiment, GroupStats)> = by_sentiment(trades)
            .into_iter()
            .filter(|(_, g)| g.trade_count > 0)
            .collect();
        let first = trades.iter().map(|t| t.date).min();
        let last = trades.iter().map(|t| t.date).max();
        Self {
            overview: Overview::compute(trades),
            date_range: first.zip(last),
            best: best_by(&buckets, |g| Some(g.total_pnl)),
            worst: worst_by(&buckets, |g| Some(g.total_pnl)),
            correlation: sentiment_pnl_correlation(trades),
        }
    }
}

pub struct SummaryView<'a> {
    ctx: &'a PageContext<'a>,
}

impl<'a> SummaryView<'a> {
    pub fn new(ctx: &'a PageContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn fragment(&self) -> String {
        let summary = DatasetSummary::compute(&self.ctx.trades);
        let dataset = self.ctx.dataset;

        let range = summary
            .date_range
            .map(|(a, b)| format!("{} to {}", a, b))
            .unwrap_or_else(|| MISSING.to_string());
        let mut html = kpi_cards(&[
            ("Total Trades", count(summary.overview.total_trades)),
            ("Date Range", range),
            ("Net PnL", currency(summary.overview.total_pnl)),
            ("Win Rate", pct(summary.overview.win_rate)),
            ("Best Sentiment", sentiment_label(summary.best)),
            ("Worst Sentiment", sentiment_label(summary.worst)),
        ]);
        let correlation = match summary.correlation {
            Some(r) => format!("{:.3} ({})", r, correlation_strength(r)),
            None => MISSING.to_string(),
        };
        html.push_str(&format!(
            "<p class=\"insight\">Index–PnL correlation: {}</p>",
            correlation
        ));

        let loaded_range = dataset
            .date_bounds()
            .map(|(a, b)| format!("{} to {}", a, b))
            .unwrap_or_else(|| MISSING.to_string());
        let rows = vec![
            vec!["Ledger rows read".to_string(), count(dataset.raw_trade_count)],
            vec!["Trades joined with sentiment".to_string(), count(dataset.trades.len())],
            vec!["Trades without sentiment (dropped)".to_string(), count(dataset.dropped_trade_count())],
            vec!["Sentiment days".to_string(), count(dataset.sentiment.len())],
            vec!["Loaded date range".to_string(), loaded_range],
            vec!["Avg PnL / trade (selection)".to_string(), currency_opt(summary.overview.avg_pnl)],
            vec!["Volume (selection)".to_string(), currency(summary.overview.total_volume)],
        ];
        html.push_str(&table(&["Dataset", "Value"], &rows));
        section("Overview", &html)
    }
}
