#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sentidash::adapters::file_config_adapter::FileConfigAdapter;
use sentidash::domain::config::DashboardConfig;
use sentidash::domain::dataset::Dataset;
use sentidash::domain::error::DashboardError;
use sentidash::domain::sentiment::SentimentObservation;
use sentidash::domain::trade::{RawTrade, Side};
use sentidash::ports::data_port::DataPort;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Five readings over six days; 2024-01-04 is missing and forward-fills from the 3rd.
pub const SENTIMENT_CSV: &str = "timestamp,value,classification,date\n\
    1704067200,20,Extreme Fear,2024-01-01\n\
    1704153600,35,Fear,2024-01-02\n\
    1704240000,50,Neutral,2024-01-03\n\
    1704412800,65,Greed,2024-01-05\n\
    1704499200,85,Extreme Greed,2024-01-06\n";

pub const TOTAL_TRADES: usize = 24;
pub const TOTAL_NET_PNL: f64 = 947.25;
pub const WINNING_TRADES: usize = 12;

const HOURS: [u32; 4] = [2, 9, 15, 21];
const PNLS: [f64; 6] = [120.0, -45.5, 0.0, 310.25, -80.0, 15.0];

/// Four trades a day over 2024-01-01..=06 plus one ledger row before the
/// sentiment history starts. Every fee is 0.5.
pub fn trades_csv() -> String {
    let mut csv = String::from(
        "Account,Coin,Execution Price,Size Tokens,Size USD,Side,Timestamp IST,Closed PnL,Fee\n",
    );
    csv.push_str("0xacc0,BTC,42000,0.01,50,BUY,31-12-2023 12:00,10,0.5\n");
    for day in 1..=6usize {
        for (k, hour) in HOURS.iter().enumerate() {
            let i = (day - 1) * 4 + k;
            let side = if i % 2 == 0 { "BUY" } else { "SELL" };
            let pnl = PNLS[i % PNLS.len()] * if day % 2 == 0 { 1.0 } else { 0.5 };
            let size = 100 + 25 * i;
            csv.push_str(&format!(
                "0xacc{},BTC,42000,0.01,{},{},{:02}-01-2024 {:02}:15,{},0.5\n",
                k % 2,
                size,
                side,
                day,
                hour,
                pnl
            ));
        }
    }
    csv
}

/// CSV inputs and an INI file pointing at them, in a temp directory.
pub struct Fixture {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub trades_path: PathBuf,
    pub sentiment_path: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_extra_config("")
    }

    pub fn with_extra_config(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let trades_path = dir.path().join("historical_data.csv");
        let sentiment_path = dir.path().join("fear_greed_index.csv");
        fs::write(&trades_path, trades_csv()).unwrap();
        fs::write(&sentiment_path, SENTIMENT_CSV).unwrap();

        let config_path = dir.path().join("sentidash.ini");
        let ini = format!(
            "[data]\ntrades_csv = {}\nsentiment_csv = {}\n\n[analysis]\nrolling_window = 3\n\n[logging]\nfilter = warn\n{}\n",
            trades_path.display(),
            sentiment_path.display(),
            extra
        );
        fs::write(&config_path, ini).unwrap();

        Self {
            dir,
            config_path,
            trades_path,
            sentiment_path,
        }
    }

    pub fn config(&self) -> DashboardConfig {
        let adapter = FileConfigAdapter::from_file(&self.config_path).unwrap();
        DashboardConfig::from_port(&adapter).unwrap()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn observation(day: NaiveDate, value: f64, classification: &str) -> SentimentObservation {
    SentimentObservation {
        date: day,
        value,
        classification: classification.to_string(),
    }
}

pub fn raw_trade(timestamp: &str, side: Side, size: f64, pnl: f64, fee: f64) -> RawTrade {
    RawTrade {
        timestamp: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M").unwrap(),
        account: "0xacc".to_string(),
        coin: Some("BTC".to_string()),
        side: Some(side),
        size_usd: Some(size),
        closed_pnl: Some(pnl),
        fee: Some(fee),
    }
}

/// In-memory data source.
pub struct MockDataPort {
    pub sentiment: Vec<SentimentObservation>,
    pub trades: Vec<RawTrade>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            sentiment: Vec::new(),
            trades: Vec::new(),
            error: None,
        }
    }

    pub fn with_sentiment(mut self, sentiment: Vec<SentimentObservation>) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_trades(mut self, trades: Vec<RawTrade>) -> Self {
        self.trades = trades;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    /// Three days of sentiment and eight trades across both sides.
    pub fn sample() -> Self {
        Self::new()
            .with_sentiment(vec![
                observation(date(2024, 3, 1), 22.0, "Extreme Fear"),
                observation(date(2024, 3, 2), 48.0, "Neutral"),
                observation(date(2024, 3, 3), 77.0, "Extreme Greed"),
            ])
            .with_trades(vec![
                raw_trade("2024-03-01 03:00", Side::Buy, 500.0, 40.0, 1.0),
                raw_trade("2024-03-01 11:00", Side::Sell, 250.0, -15.0, 0.5),
                raw_trade("2024-03-02 17:30", Side::Buy, 800.0, 22.0, 1.5),
                raw_trade("2024-03-02 20:00", Side::Sell, 300.0, -60.0, 0.5),
                raw_trade("2024-03-03 01:15", Side::Buy, 1200.0, 140.0, 2.0),
                raw_trade("2024-03-03 09:45", Side::Sell, 450.0, 5.0, 0.25),
                raw_trade("2024-03-03 14:00", Side::Buy, 650.0, -30.0, 1.0),
                raw_trade("2024-03-03 22:30", Side::Sell, 900.0, 75.0, 1.5),
            ])
    }
}

impl DataPort for MockDataPort {
    fn load_sentiment(&self) -> Result<Vec<SentimentObservation>, DashboardError> {
        if let Some(reason) = &self.error {
            return Err(DashboardError::Csv {
                file: "mock".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.sentiment.clone())
    }

    fn load_trades(&self) -> Result<Vec<RawTrade>, DashboardError> {
        Ok(self.trades.clone())
    }
}

pub fn sample_dataset() -> Dataset {
    MockDataPort::sample().load_dataset().unwrap()
}
