//! The joined, immutable in-memory table the dashboard works from.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::sentiment::SentimentObservation;
use super::trade::{RawTrade, TradeRecord};

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Sentiment readings sorted by date.
    pub sentiment: Vec<SentimentObservation>,
    /// Joined trades in ledger order.
    pub trades: Vec<TradeRecord>,
    /// Ledger rows read before joining.
    pub raw_trade_count: usize,
}

impl Dataset {
    /// Join each trade to the latest sentiment reading on or before its date.
    ///
    /// Trades dated before the first reading cannot be filled and are dropped.
    /// When a date carries more than one reading the last one read wins.
    pub fn join(mut sentiment: Vec<SentimentObservation>, raw_trades: Vec<RawTrade>) -> Self {
        sentiment.sort_by_key(|o| o.date);

        let by_date: BTreeMap<NaiveDate, &SentimentObservation> =
            sentiment.iter().map(|o| (o.date, o)).collect();

        let raw_trade_count = raw_trades.len();
        let trades: Vec<TradeRecord> = raw_trades
            .into_iter()
            .filter_map(|raw| {
                let date = raw.timestamp.date();
                by_date
                    .range(..=date)
                    .next_back()
                    .map(|(_, obs)| TradeRecord::enrich(raw, obs))
            })
            .collect();

        Self {
            sentiment,
            trades,
            raw_trade_count,
        }
    }

    pub fn dropped_trade_count(&self) -> usize {
        self.raw_trade_count - self.trades.len()
    }

    /// First and last trade date.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.trades.iter().map(|t| t.date).min()?;
        let max = self.trades.iter().map(|t| t.date).max()?;
        Some((min, max))
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
