//! Static report port trait.

use std::path::Path;

use crate::domain::config::DashboardConfig;
use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::filter::TradeFilter;

/// Port for writing a self-contained dashboard report for one filter selection.
pub trait ReportPort {
    fn write(
        &self,
        dataset: &Dataset,
        filter: &TradeFilter,
        config: &DashboardConfig,
        output_path: &Path,
    ) -> Result<(), DashboardError>;
}
