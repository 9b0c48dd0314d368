//! CSV file data adapter.

use crate::domain::error::DashboardError;
use crate::domain::explorer::{EXPORT_HEADERS, TIMESTAMP_FORMAT, export_record};
use crate::domain::sentiment::SentimentObservation;
use crate::domain::trade::{RawTrade, Side, TradeRecord};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Write;
use std::path::{Path, PathBuf};

const SENTIMENT_DATE: &[&str] = &["date"];
const SENTIMENT_VALUE: &[&str] = &["value"];
const SENTIMENT_CLASS: &[&str] = &["classification", "value_classification"];

const TRADE_ACCOUNT: &[&str] = &["Account"];
const TRADE_COIN: &[&str] = &["Coin"];
const TRADE_SIDE: &[&str] = &["Side"];
const TRADE_TIMESTAMP: &[&str] = &["Timestamp IST"];
const TRADE_SIZE: &[&str] = &["Size USD"];
const TRADE_PNL: &[&str] = &["Closed PnL", "Realized Profit"];
const TRADE_FEE: &[&str] = &["Fee", "Fee USD"];

const FALLBACK_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvAdapter {
    trades_path: PathBuf,
    sentiment_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(trades_path: PathBuf, sentiment_path: PathBuf) -> Self {
        Self {
            trades_path,
            sentiment_path,
        }
    }

    fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, DashboardError> {
        if !path.exists() {
            return Err(DashboardError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| csv_error(path, e))
    }
}

/// Column positions resolved from the header row.
struct Columns<'a> {
    file: &'a Path,
    headers: csv::StringRecord,
}

impl<'a> Columns<'a> {
    fn find(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h == *name))
    }

    fn required(&self, names: &[&str]) -> Result<usize, DashboardError> {
        self.find(names).ok_or_else(|| DashboardError::MissingColumn {
            file: self.file.display().to_string(),
            column: names[0].to_string(),
        })
    }
}

fn csv_error(path: &Path, e: csv::Error) -> DashboardError {
    DashboardError::Csv {
        file: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Parse a numeric cell; blanks and garbage become missing values.
fn number(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .map(|s| s.replace(',', ""))
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, FALLBACK_TIMESTAMP_FORMAT))
        .ok()
}

impl DataPort for CsvAdapter {
    fn load_sentiment(&self) -> Result<Vec<SentimentObservation>, DashboardError> {
        let path = self.sentiment_path.as_path();
        let mut rdr = Self::reader(path)?;
        let columns = Columns {
            file: path,
            headers: rdr.headers().map_err(|e| csv_error(path, e))?.clone(),
        };
        let date_col = columns.required(SENTIMENT_DATE)?;
        let value_col = columns.required(SENTIMENT_VALUE)?;
        let class_col = columns.required(SENTIMENT_CLASS)?;

        let mut observations = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(path, e))?;
            let date = record
                .get(date_col)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            let value = number(&record, value_col);
            match (date, value) {
                (Some(date), Some(value)) => observations.push(SentimentObservation {
                    date,
                    value,
                    classification: record.get(class_col).unwrap_or_default().to_string(),
                }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(file = %path.display(), skipped, "unparseable sentiment rows skipped");
        }
        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }

    fn load_trades(&self) -> Result<Vec<RawTrade>, DashboardError> {
        let path = self.trades_path.as_path();
        let mut rdr = Self::reader(path)?;
        let columns = Columns {
            file: path,
            headers: rdr.headers().map_err(|e| csv_error(path, e))?.clone(),
        };
        let account_col = columns.required(TRADE_ACCOUNT)?;
        let coin_col = columns.find(TRADE_COIN);
        let side_col = columns.required(TRADE_SIDE)?;
        let ts_col = columns.required(TRADE_TIMESTAMP)?;
        let size_col = columns.required(TRADE_SIZE)?;
        let pnl_col = columns.required(TRADE_PNL)?;
        let fee_col = columns.required(TRADE_FEE)?;

        let mut trades = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(path, e))?;
            let Some(timestamp) = record.get(ts_col).and_then(parse_timestamp) else {
                skipped += 1;
                continue;
            };
            trades.push(RawTrade {
                timestamp,
                account: record.get(account_col).unwrap_or_default().to_string(),
                coin: coin_col
                    .and_then(|c| record.get(c))
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                side: record.get(side_col).and_then(|s| s.parse::<Side>().ok()),
                size_usd: number(&record, size_col),
                closed_pnl: number(&record, pnl_col),
                fee: number(&record, fee_col),
            });
        }

        if skipped > 0 {
            tracing::warn!(file = %path.display(), skipped, "trade rows with bad timestamps skipped");
        }
        tracing::debug!(file = %path.display(), rows = trades.len(), "trades read");
        Ok(trades)
    }
}

/// Write the explorer view as CSV with a header row.
pub fn write_export<W: Write>(out: W, trades: &[&TradeRecord]) -> Result<(), DashboardError> {
    let mut wtr = csv::Writer::from_writer(out);
    let to_err = |e: csv::Error| DashboardError::Csv {
        file: "export".into(),
        reason: e.to_string(),
    };
    wtr.write_record(EXPORT_HEADERS).map_err(to_err)?;
    for t in trades {
        wtr.write_record(export_record(t)).map_err(to_err)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SENTIMENT: &str = "timestamp,value,classification,date\n\
        1704067200,25,Extreme Fear,2024-01-01\n\
        1704240000,55,Neutral,2024-01-03\n\
        1704153600,40,Fear,2024-01-02\n\
        bad,xx,Fear,not-a-date\n";

    const TRADES: &str = "Account,Coin,Execution Price,Size Tokens,Size USD,Side,Timestamp IST,Closed PnL,Fee\n\
        0xabc,BTC,42000,0.01,420,BUY,01-01-2024 10:30,12.5,0.5\n\
        0xabc,ETH,2200,1,2200,SELL,02-01-2024 18:05,-30,1.2\n\
        0xdef,,1,1,n/a,BUY,03-01-2024 03:00,,0.1\n\
        0xdef,BTC,1,1,100,SELL,garbage,1,1\n";

    fn setup(trades: &str, sentiment: &str) -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        let t = dir.path().join("historical_data.csv");
        let s = dir.path().join("fear_greed_index.csv");
        fs::write(&t, trades).unwrap();
        fs::write(&s, sentiment).unwrap();
        let adapter = CsvAdapter::new(t, s);
        (dir, adapter)
    }

    #[test]
    fn sentiment_is_sorted_and_bad_rows_skipped() {
        let (_dir, adapter) = setup(TRADES, SENTIMENT);
        let obs = adapter.load_sentiment().unwrap();
        assert_eq!(obs.len(), 3);
        assert_eq!(obs[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(obs[1].value, 40.0);
        assert_eq!(obs[1].classification, "Fear");
    }

    #[test]
    fn trades_coerce_numbers_and_drop_bad_timestamps() {
        let (_dir, adapter) = setup(TRADES, SENTIMENT);
        let trades = adapter.load_trades().unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].side, Some(Side::Buy));
        assert_eq!(trades[0].coin.as_deref(), Some("BTC"));
        assert_eq!(trades[0].closed_pnl, Some(12.5));
        assert_eq!(
            trades[1].timestamp,
            NaiveDateTime::parse_from_str("2024-01-02 18:05", "%Y-%m-%d %H:%M").unwrap()
        );
        assert_eq!(trades[2].coin, None);
        assert_eq!(trades[2].size_usd, None);
        assert_eq!(trades[2].closed_pnl, None);
    }

    #[test]
    fn alias_headers_are_accepted() {
        let trades = "Account,Side,Timestamp IST,Size USD,Realized Profit,Fee USD\n\
            a,SELL,05-01-2024 12:00,10,3,1\n";
        let sentiment = "date,value,value_classification\n2024-01-05,70,Greed\n";
        let (_dir, adapter) = setup(trades, sentiment);
        let loaded = adapter.load_trades().unwrap();
        assert_eq!(loaded[0].closed_pnl, Some(3.0));
        assert_eq!(loaded[0].fee, Some(1.0));
        assert_eq!(loaded[0].coin, None);
        assert_eq!(adapter.load_sentiment().unwrap()[0].classification, "Greed");
    }

    #[test]
    fn missing_column_is_reported() {
        let (_dir, adapter) = setup("Account,Side,Timestamp IST,Size USD,Fee\n", SENTIMENT);
        let err = adapter.load_trades().unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn { ref column, .. } if column == "Closed PnL"));
    }

    #[test]
    fn missing_file_is_missing_input() {
        let adapter = CsvAdapter::new(
            PathBuf::from("/nonexistent/historical_data.csv"),
            PathBuf::from("/nonexistent/fear_greed_index.csv"),
        );
        assert!(matches!(
            adapter.load_sentiment(),
            Err(DashboardError::MissingInput { .. })
        ));
        assert!(matches!(
            adapter.load_dataset(),
            Err(DashboardError::MissingInput { .. })
        ));
    }

    #[test]
    fn load_dataset_joins_and_forward_fills() {
        let (_dir, adapter) = setup(TRADES, SENTIMENT);
        let ds = adapter.load_dataset().unwrap();
        assert_eq!(ds.trades.len(), 3);
        assert_eq!(ds.trades[1].index_value, 40.0);
        assert_eq!(ds.trades[0].net_pnl, Some(12.0));
    }

    #[test]
    fn trades_before_sentiment_history_are_an_empty_dataset() {
        let sentiment = "date,value,classification\n2025-06-01,50,Neutral\n";
        let (_dir, adapter) = setup(TRADES, sentiment);
        assert!(matches!(adapter.load_dataset(), Err(DashboardError::EmptyDataset)));
    }

    #[test]
    fn export_writes_header_and_rows() {
        let (_dir, adapter) = setup(TRADES, SENTIMENT);
        let ds = adapter.load_dataset().unwrap();
        let refs: Vec<&TradeRecord> = ds.trades.iter().collect();
        let mut buf = Vec::new();
        write_export(&mut buf, &refs[..1]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Timestamp IST,Sentiment,Side,Size USD,Closed PnL,Fee,Net PnL,PnL %,Session")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("01-01-2024 10:30,Extreme Fear,BUY,420,12.5,0.5,12,2.857"));
        assert!(row.ends_with(",European"));
        assert_eq!(lines.next(), None);
    }
}
