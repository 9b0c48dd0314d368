//! Data access port trait.

use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::sentiment::SentimentObservation;
use crate::domain::trade::RawTrade;

pub trait DataPort {
    fn load_sentiment(&self) -> Result<Vec<SentimentObservation>, DashboardError>;

    fn load_trades(&self) -> Result<Vec<RawTrade>, DashboardError>;

    /// Load both sources and join them by date.
    ///
    /// A ledger whose rows all predate the sentiment history is an error.
    fn load_dataset(&self) -> Result<Dataset, DashboardError> {
        let sentiment = self.load_sentiment()?;
        let trades = self.load_trades()?;
        let dataset = Dataset::join(sentiment, trades);
        if dataset.trades.is_empty() && dataset.raw_trade_count > 0 {
            return Err(DashboardError::EmptyDataset);
        }
        tracing::info!(
            sentiment_rows = dataset.sentiment.len(),
            trades = dataset.trades.len(),
            dropped = dataset.dropped_trade_count(),
            "dataset loaded"
        );
        if dataset.dropped_trade_count() > 0 {
            tracing::warn!(
                dropped = dataset.dropped_trade_count(),
                "trades without prior sentiment reading were dropped"
            );
        }
        Ok(dataset)
    }
}
