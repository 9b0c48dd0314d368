//! Trade ledger rows and their derived columns.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use std::fmt;
use std::str::FromStr;

use super::sentiment::{Sentiment, SentimentObservation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Buy, Side::Sell];

    pub fn label(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

/// Three eight-hour buckets of the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TradingSession {
    Asian,
    European,
    American,
}

impl TradingSession {
    pub const ALL: [TradingSession; 3] = [
        TradingSession::Asian,
        TradingSession::European,
        TradingSession::American,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..8 => TradingSession::Asian,
            8..16 => TradingSession::European,
            _ => TradingSession::American,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TradingSession::Asian => "Asian",
            TradingSession::European => "European",
            TradingSession::American => "American",
        }
    }
}

impl fmt::Display for TradingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Monday-first weekday order used for weekday tables.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A ledger row as read from disk. Numeric fields that failed to parse are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrade {
    pub timestamp: NaiveDateTime,
    pub account: String,
    pub coin: Option<String>,
    pub side: Option<Side>,
    pub size_usd: Option<f64>,
    pub closed_pnl: Option<f64>,
    pub fee: Option<f64>,
}

/// A ledger row joined with its day's sentiment reading.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub account: String,
    pub coin: Option<String>,
    pub side: Option<Side>,
    pub size_usd: Option<f64>,
    pub closed_pnl: Option<f64>,
    pub fee: Option<f64>,
    pub sentiment: Sentiment,
    pub index_value: f64,
    pub net_pnl: Option<f64>,
    pub is_profitable: bool,
    pub session: TradingSession,
}

impl TradeRecord {
    /// Attach a sentiment observation to a raw trade and compute derived fields.
    pub fn enrich(raw: RawTrade, observation: &SentimentObservation) -> Self {
        let net_pnl = match (raw.closed_pnl, raw.fee) {
            (Some(pnl), Some(fee)) => Some(pnl - fee),
            _ => None,
        };
        let is_profitable = net_pnl.is_some_and(|n| n > 0.0);
        let session = TradingSession::from_hour(raw.timestamp.hour());

        TradeRecord {
            date: raw.timestamp.date(),
            timestamp: raw.timestamp,
            account: raw.account,
            coin: raw.coin,
            side: raw.side,
            size_usd: raw.size_usd,
            closed_pnl: raw.closed_pnl,
            fee: raw.fee,
            sentiment: observation.sentiment(),
            index_value: observation.value,
            net_pnl,
            is_profitable,
            session,
        }
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn weekday(&self) -> Weekday {
        self.timestamp.weekday()
    }

    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    pub fn iso_week(&self) -> u32 {
        self.timestamp.iso_week().week()
    }

    pub fn sentiment_score(&self) -> u8 {
        self.sentiment.score()
    }

    /// Net PnL relative to position size, in percent.
    pub fn pnl_percentage(&self) -> Option<f64> {
        ratio_pct(self.net_pnl, self.size_usd)
    }

    /// Fee relative to position size, in percent.
    pub fn fee_ratio(&self) -> Option<f64> {
        ratio_pct(self.fee, self.size_usd)
    }

    /// Absolute net PnL.
    pub fn magnitude(&self) -> Option<f64> {
        self.net_pnl.map(f64::abs)
    }
}

fn ratio_pct(numerator: Option<f64>, size: Option<f64>) -> Option<f64> {
    match (numerator, size) {
        (Some(n), Some(s)) if s != 0.0 => Some(n / s * 100.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(ts: &str, pnl: Option<f64>, fee: Option<f64>, size: Option<f64>) -> RawTrade {
        RawTrade {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            account: "0xabc".into(),
            coin: Some("BTC".into()),
            side: Some(Side::Buy),
            size_usd: size,
            closed_pnl: pnl,
            fee,
        }
    }

    fn obs() -> SentimentObservation {
        SentimentObservation {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            value: 30.0,
            classification: "Fear".into(),
        }
    }

    #[test]
    fn session_buckets_by_hour() {
        assert_eq!(TradingSession::from_hour(0), TradingSession::Asian);
        assert_eq!(TradingSession::from_hour(7), TradingSession::Asian);
        assert_eq!(TradingSession::from_hour(8), TradingSession::European);
        assert_eq!(TradingSession::from_hour(15), TradingSession::European);
        assert_eq!(TradingSession::from_hour(16), TradingSession::American);
        assert_eq!(TradingSession::from_hour(23), TradingSession::American);
    }

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!(" SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("HOLD".parse::<Side>().is_err());
    }

    #[test]
    fn enrich_computes_net_pnl_and_flags() {
        let rec = TradeRecord::enrich(
            raw("2024-01-15 09:30", Some(120.0), Some(20.0), Some(1000.0)),
            &obs(),
        );
        assert_eq!(rec.net_pnl, Some(100.0));
        assert!(rec.is_profitable);
        assert_eq!(rec.session, TradingSession::European);
        assert_eq!(rec.sentiment, Sentiment::Fear);
        assert_eq!(rec.sentiment_score(), 2);
        assert_eq!(rec.pnl_percentage(), Some(10.0));
        assert_eq!(rec.fee_ratio(), Some(2.0));
        assert_eq!(rec.weekday(), Weekday::Mon);
        assert_eq!(rec.month(), 1);
        assert_eq!(rec.iso_week(), 3);
    }

    #[test]
    fn missing_fee_leaves_net_pnl_missing() {
        let rec = TradeRecord::enrich(raw("2024-01-15 18:00", Some(50.0), None, Some(10.0)), &obs());
        assert_eq!(rec.net_pnl, None);
        assert!(!rec.is_profitable);
        assert_eq!(rec.magnitude(), None);
    }

    #[test]
    fn zero_size_has_no_ratio() {
        let rec = TradeRecord::enrich(raw("2024-01-15 01:00", Some(-5.0), Some(1.0), Some(0.0)), &obs());
        assert_eq!(rec.pnl_percentage(), None);
        assert_eq!(rec.magnitude(), Some(6.0));
        assert!(!rec.is_profitable);
    }
}
