//! User-selected filters over the joined trade table.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

use super::error::DashboardError;
use super::sentiment::Sentiment;
use super::trade::{Side, TradeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PnlFilter {
    #[default]
    All,
    ProfitableOnly,
    UnprofitableOnly,
}

impl PnlFilter {
    pub fn parse(raw: &str) -> Result<Self, DashboardError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "all" => Ok(PnlFilter::All),
            "profitable" => Ok(PnlFilter::ProfitableOnly),
            "unprofitable" => Ok(PnlFilter::UnprofitableOnly),
            other => Err(DashboardError::invalid_filter(
                "pnl",
                format!("expected all, profitable or unprofitable, got '{}'", other),
            )),
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            PnlFilter::All => "all",
            PnlFilter::ProfitableOnly => "profitable",
            PnlFilter::UnprofitableOnly => "unprofitable",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PnlFilter::All => "All Trades",
            PnlFilter::ProfitableOnly => "Profitable Only",
            PnlFilter::UnprofitableOnly => "Unprofitable Only",
        }
    }

    fn accepts(self, profitable: bool) -> bool {
        match self {
            PnlFilter::All => true,
            PnlFilter::ProfitableOnly => profitable,
            PnlFilter::UnprofitableOnly => !profitable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sentiments: BTreeSet<Sentiment>,
    pub sides: BTreeSet<Side>,
    pub pnl: PnlFilter,
}

impl Default for TradeFilter {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            sentiments: Sentiment::ALL.into_iter().collect(),
            sides: Side::ALL.into_iter().collect(),
            pnl: PnlFilter::All,
        }
    }
}

impl TradeFilter {
    /// Build a filter from decoded query-string pairs.
    ///
    /// `sentiment` and `side` may repeat; when absent every value is selected.
    /// Unknown keys are ignored so page-specific parameters can share the query.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, DashboardError> {
        let mut filter = TradeFilter::default();
        let mut sentiments = BTreeSet::new();
        let mut sides = BTreeSet::new();

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "start" if !value.is_empty() => filter.start = Some(parse_date("start", value)?),
                "end" if !value.is_empty() => filter.end = Some(parse_date("end", value)?),
                "sentiment" => {
                    let s = value
                        .parse::<Sentiment>()
                        .map_err(|e| DashboardError::invalid_filter("sentiment", e.to_string()))?;
                    sentiments.insert(s);
                }
                "side" => {
                    let s = value
                        .parse::<Side>()
                        .map_err(|e| DashboardError::invalid_filter("side", e))?;
                    sides.insert(s);
                }
                "pnl" => filter.pnl = PnlFilter::parse(value)?,
                _ => {}
            }
        }

        if !sentiments.is_empty() {
            filter.sentiments = sentiments;
        }
        if !sides.is_empty() {
            filter.sides = sides;
        }
        if let (Some(start), Some(end)) = (filter.start, filter.end) {
            if start > end {
                return Err(DashboardError::invalid_filter(
                    "start",
                    format!("start date {} is after end date {}", start, end),
                ));
            }
        }
        Ok(filter)
    }

    /// Encode back into query pairs, omitting values equal to the defaults.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start {
            pairs.push(("start".to_string(), start.to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("end".to_string(), end.to_string()));
        }
        if self.sentiments.len() != Sentiment::ALL.len() {
            for s in &self.sentiments {
                pairs.push(("sentiment".to_string(), s.slug().to_string()));
            }
        }
        if self.sides.len() != Side::ALL.len() {
            for s in &self.sides {
                pairs.push(("side".to_string(), s.label().to_string()));
            }
        }
        if self.pnl != PnlFilter::All {
            pairs.push(("pnl".to_string(), self.pnl.slug().to_string()));
        }
        pairs
    }

    pub fn matches(&self, trade: &TradeRecord) -> bool {
        if self.start.is_some_and(|start| trade.date < start) {
            return false;
        }
        if self.end.is_some_and(|end| trade.date > end) {
            return false;
        }
        if !self.sentiments.contains(&trade.sentiment) {
            return false;
        }
        match trade.side {
            Some(side) if self.sides.contains(&side) => {}
            _ => return false,
        }
        self.pnl.accepts(trade.is_profitable)
    }

    /// The rows passing every predicate, in ledger order.
    pub fn apply<'a>(&self, trades: &'a [TradeRecord]) -> Vec<&'a TradeRecord> {
        trades.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Sidebar summary of the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSummary {
    pub trades: usize,
    pub days: usize,
    pub sentiments: usize,
    pub sides: Vec<Side>,
}

impl FilterSummary {
    pub fn compute(filter: &TradeFilter, filtered: &[&TradeRecord]) -> Self {
        let days: HashSet<NaiveDate> = filtered.iter().map(|t| t.date).collect();
        Self {
            trades: filtered.len(),
            days: days.len(),
            sentiments: filter.sentiments.len(),
            sides: filter.sides.iter().copied().collect(),
        }
    }
}

fn parse_date(param: &str, value: &str) -> Result<NaiveDate, DashboardError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        DashboardError::invalid_filter(param, format!("'{}' is not a YYYY-MM-DD date", value))
    })
}
