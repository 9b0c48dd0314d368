//! Dashboard settings read through the config port, with validation.

use std::path::PathBuf;

use crate::domain::error::DashboardError;
use crate::domain::explorer::DEFAULT_EXPLORER_ROWS;
use crate::domain::hypothesis::DEFAULT_SIGNIFICANCE;
use crate::domain::timeseries::{DEFAULT_ROLLING_WINDOW, MAX_ROLLING_WINDOW, MIN_ROLLING_WINDOW};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8501";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub trades_csv: PathBuf,
    pub sentiment_csv: PathBuf,
    pub listen: String,
    pub cache_ttl_secs: u64,
    /// Load the dataset before accepting requests.
    pub preload: bool,
    pub rolling_window: usize,
    pub significance: f64,
    pub explorer_rows: usize,
    pub log_filter: String,
}

impl DashboardConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, DashboardError> {
        let trades_csv = required_path(config, "data", "trades_csv")?;
        let sentiment_csv = required_path(config, "data", "sentiment_csv")?;

        let rolling_window = parsed(config, "analysis", "rolling_window", DEFAULT_ROLLING_WINDOW)?;
        if !(MIN_ROLLING_WINDOW..=MAX_ROLLING_WINDOW).contains(&rolling_window) {
            return Err(invalid(
                "analysis",
                "rolling_window",
                format!("rolling_window must be between {MIN_ROLLING_WINDOW} and {MAX_ROLLING_WINDOW}"),
            ));
        }

        let significance = parsed(config, "analysis", "significance", DEFAULT_SIGNIFICANCE)?;
        if !(significance > 0.0 && significance < 1.0) {
            return Err(invalid(
                "analysis",
                "significance",
                "significance must be strictly between 0 and 1".to_string(),
            ));
        }

        let explorer_rows = parsed(config, "analysis", "explorer_rows", DEFAULT_EXPLORER_ROWS)?;
        if explorer_rows == 0 {
            return Err(invalid(
                "analysis",
                "explorer_rows",
                "explorer_rows must be positive".to_string(),
            ));
        }

        Ok(Self {
            trades_csv,
            sentiment_csv,
            listen: config
                .get_string("web", "listen")
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            cache_ttl_secs: parsed(config, "cache", "ttl_secs", DEFAULT_CACHE_TTL_SECS)?,
            preload: flag(config, "cache", "preload", true)?,
            rolling_window,
            significance,
            explorer_rows,
            log_filter: config
                .get_string("logging", "filter")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

fn required_path(config: &dyn ConfigPort, section: &str, key: &str) -> Result<PathBuf, DashboardError> {
    config
        .get_string(section, key)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| DashboardError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

/// A present value must parse; an absent one takes the default.
fn parsed<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, DashboardError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, format!("'{}' is not a valid value", raw.trim()))),
    }
}

/// Booleans accept true/yes/on/1 and false/no/off/0, in any case.
fn flag(config: &dyn ConfigPort, section: &str, key: &str, default: bool) -> Result<bool, DashboardError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(invalid(section, key, format!("'{}' is not a boolean", other))),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> DashboardError {
    DashboardError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason,
    }
}
