//! HTML report adapter implementing ReportPort.
//!
//! Renders the dashboard pages for one filter into a single self-contained
//! Askama document with inline SVG charts.

use std::fs;
use std::path::Path;

use askama::Template;
use chrono::Local;

use crate::adapters::pages::{Page, PageContext, PageSettings};
use crate::domain::config::DashboardConfig;
use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::filter::{PnlFilter, TradeFilter};
use crate::domain::sentiment::Sentiment;
use crate::domain::trade::Side;
use crate::ports::report_port::ReportPort;

/// Pages included in the static report, in order.
pub const REPORT_PAGES: [Page; 4] = [Page::Dashboard, Page::Analytics, Page::Risk, Page::Summary];

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    title: &'a str,
    generated: String,
    filter_description: String,
    content: String,
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(
        &self,
        dataset: &Dataset,
        filter: &TradeFilter,
        config: &DashboardConfig,
        output_path: &Path,
    ) -> Result<(), DashboardError> {
        let settings = PageSettings::from_config(config);
        let ctx = PageContext::new(dataset, filter, &settings);

        let mut content = String::new();
        for page in REPORT_PAGES {
            content.push_str(&page.fragment(&ctx));
        }

        let template = ReportTemplate {
            title: "Sentiment Performance Report",
            generated: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            filter_description: describe_filter(filter),
            content,
        };
        let html = template.render().map_err(|e| DashboardError::Render {
            reason: e.to_string(),
        })?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, html)?;
        tracing::info!(path = %output_path.display(), trades = ctx.trades.len(), "report written");
        Ok(())
    }
}

/// One-line description of a filter for report headers.
pub fn describe_filter(filter: &TradeFilter) -> String {
    let dates = match (filter.start, filter.end) {
        (None, None) => "All dates".to_string(),
        (Some(s), None) => format!("From {}", s),
        (None, Some(e)) => format!("Until {}", e),
        (Some(s), Some(e)) => format!("{} to {}", s, e),
    };
    let sentiments = if filter.sentiments.len() == Sentiment::ALL.len() {
        "All sentiments".to_string()
    } else {
        filter
            .sentiments
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let sides = if filter.sides.len() == Side::ALL.len() {
        "Both sides".to_string()
    } else {
        filter
            .sides
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let pnl = match filter.pnl {
        PnlFilter::All => "All trades",
        other => other.label(),
    };
    format!("{} · {} · {} · {}", dates, sentiments, sides, pnl)
}
