//! Page view models shared by the web adapter and the static report.
//!
//! Each view renders its page body as an HTML fragment with inline SVG charts.
//! The surrounding layout (navigation and the filter form) is added by the caller.

mod analytics;
mod dashboard;
mod deep_dive;
mod risk;
mod summary;

pub use analytics::AnalyticsView;
pub use dashboard::DashboardView;
pub use deep_dive::DeepDiveView;
pub use risk::RiskView;
pub use summary::{DatasetSummary, SummaryView};

use crate::adapters::format::escape;
use crate::domain::config::DashboardConfig;
use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::explorer::ExplorerOptions;
use crate::domain::filter::{FilterSummary, PnlFilter, TradeFilter};
use crate::domain::sentiment::Sentiment;
use crate::domain::timeseries::{MAX_ROLLING_WINDOW, MIN_ROLLING_WINDOW};
use crate::domain::trade::{Side, TradeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Analytics,
    Risk,
    DeepDive,
    Summary,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Analytics,
        Page::Risk,
        Page::DeepDive,
        Page::Summary,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Page::Dashboard => "/",
            Page::Analytics => "/analytics",
            Page::Risk => "/risk",
            Page::DeepDive => "/deep-dive",
            Page::Summary => "/summary",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Sentiment Performance Dashboard",
            Page::Analytics => "Advanced Analytics",
            Page::Risk => "Risk Analysis",
            Page::DeepDive => "Deep Dive",
            Page::Summary => "Dataset Summary",
        }
    }

    pub fn nav_label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Analytics => "Analytics",
            Page::Risk => "Risk",
            Page::DeepDive => "Deep Dive",
            Page::Summary => "Summary",
        }
    }

    pub fn fragment(self, ctx: &PageContext<'_>) -> String {
        let mut html = String::from("<div id=\"content\">");
        html.push_str(&format!("<h1>{}</h1>", self.title()));
        if ctx.trades.is_empty() && self != Page::Summary {
            html.push_str(
                "<p class=\"notice\">No trades match the current filters. Widen the date range or selection.</p>",
            );
        } else {
            html.push_str(&match self {
                Page::Dashboard => DashboardView::new(ctx).fragment(),
                Page::Analytics => AnalyticsView::new(ctx).fragment(),
                Page::Risk => RiskView::new(ctx).fragment(),
                Page::DeepDive => DeepDiveView::new(ctx).fragment(),
                Page::Summary => SummaryView::new(ctx).fragment(),
            });
        }
        html.push_str("</div>");
        html
    }
}

/// Request-scoped knobs beyond the trade filter.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSettings {
    pub rolling_window: usize,
    pub significance: f64,
    pub explorer: ExplorerOptions,
}

impl PageSettings {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            rolling_window: config.rolling_window,
            significance: config.significance,
            explorer: ExplorerOptions {
                rows: config.explorer_rows,
                ..Default::default()
            },
        }
    }

    /// Config defaults overridden by `window` and the explorer parameters.
    pub fn from_pairs(pairs: &[(String, String)], config: &DashboardConfig) -> Result<Self, DashboardError> {
        let mut settings = Self::from_config(config);
        settings.explorer = ExplorerOptions::from_pairs(pairs, config.explorer_rows)?;
        for (key, value) in pairs {
            if key == "window" && !value.trim().is_empty() {
                settings.rolling_window = match value.trim().parse::<usize>() {
                    Ok(w) if (MIN_ROLLING_WINDOW..=MAX_ROLLING_WINDOW).contains(&w) => w,
                    _ => {
                        return Err(DashboardError::invalid_filter(
                            "window",
                            format!("must be between {MIN_ROLLING_WINDOW} and {MAX_ROLLING_WINDOW}"),
                        ));
                    }
                };
            }
        }
        Ok(settings)
    }

    fn to_pairs(&self) -> Vec<(String, String)> {
        let e = &self.explorer;
        let side = match e.side {
            crate::domain::explorer::SideView::All => "all".to_string(),
            crate::domain::explorer::SideView::Only(s) => s.label().to_string(),
        };
        vec![
            ("min_pnl".into(), e.min_pnl.to_string()),
            ("side_view".into(), side),
            ("sort".into(), e.sort.slug().into()),
            ("rows".into(), e.rows.to_string()),
        ]
    }
}

/// The filtered table and settings a page is rendered from.
pub struct PageContext<'a> {
    pub dataset: &'a Dataset,
    pub filter: &'a TradeFilter,
    pub trades: Vec<&'a TradeRecord>,
    pub settings: &'a PageSettings,
}

impl<'a> PageContext<'a> {
    pub fn new(dataset: &'a Dataset, filter: &'a TradeFilter, settings: &'a PageSettings) -> Self {
        Self {
            dataset,
            filter,
            trades: filter.apply(&dataset.trades),
            settings,
        }
    }

    /// Query string of the active filter, without a leading `?`.
    pub fn filter_query(&self) -> String {
        query_string(&self.filter.to_pairs())
    }

    pub fn export_href(&self) -> String {
        let mut pairs = self.filter.to_pairs();
        pairs.extend(self.settings.to_pairs());
        format!("/deep-dive/export.csv?{}", query_string(&pairs))
    }
}

pub fn query_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Top navigation; links keep the active filter.
pub fn nav(active: Page, filter_query: &str) -> String {
    let mut html = String::from("<nav class=\"top-nav\"><span class=\"brand\">Sentiment Dashboard</span>");
    for page in Page::ALL {
        let href = if filter_query.is_empty() {
            page.path().to_string()
        } else {
            format!("{}?{}", page.path(), filter_query)
        };
        html.push_str(&format!(
            "<a href=\"{}\"{}>{}</a>",
            escape(&href),
            if page == active { " class=\"active\"" } else { "" },
            page.nav_label()
        ));
    }
    html.push_str("</nav>");
    html
}

/// Sidebar filter form. Submitting swaps `#content` through htmx and falls back to a plain GET.
pub fn filter_form(page: Page, ctx: &PageContext<'_>) -> String {
    let filter = ctx.filter;
    let bounds = ctx.dataset.date_bounds();
    let (min, max) = bounds
        .map(|(lo, hi)| (lo.to_string(), hi.to_string()))
        .unwrap_or_default();

    let mut html = format!(
        "<form id=\"filters\" action=\"{path}\" method=\"get\" hx-get=\"{path}\" hx-target=\"#content\" hx-swap=\"outerHTML\" hx-push-url=\"true\">",
        path = page.path()
    );
    html.push_str("<h2>Filters</h2>");
    html.push_str(&format!(
        "<label>Start <input type=\"date\" name=\"start\" min=\"{min}\" max=\"{max}\" value=\"{}\"></label>",
        filter.start.map(|d| d.to_string()).unwrap_or_default()
    ));
    html.push_str(&format!(
        "<label>End <input type=\"date\" name=\"end\" min=\"{min}\" max=\"{max}\" value=\"{}\"></label>",
        filter.end.map(|d| d.to_string()).unwrap_or_default()
    ));

    html.push_str("<fieldset><legend>Sentiment</legend>");
    for s in Sentiment::ALL {
        html.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"sentiment\" value=\"{}\"{}> {}</label>",
            s.slug(),
            checked(filter.sentiments.contains(&s)),
            s.label()
        ));
    }
    html.push_str("</fieldset>");

    html.push_str("<fieldset><legend>Side</legend>");
    for s in Side::ALL {
        html.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"side\" value=\"{}\"{}> {}</label>",
            s.label(),
            checked(filter.sides.contains(&s)),
            s.label()
        ));
    }
    html.push_str("</fieldset>");

    html.push_str("<label>Trades <select name=\"pnl\">");
    for p in [PnlFilter::All, PnlFilter::ProfitableOnly, PnlFilter::UnprofitableOnly] {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            p.slug(),
            if filter.pnl == p { " selected" } else { "" },
            p.label()
        ));
    }
    html.push_str("</select></label>");
    html.push_str("<button type=\"submit\">Apply</button>");
    html.push_str(&format!("<a class=\"reset\" href=\"{}\">Reset</a>", page.path()));
    html.push_str("</form>");

    html.push_str(&filter_summary(ctx, false));
    html
}

/// Sidebar counts for the active selection. The `oob` form rides along with htmx
/// fragments so the sidebar follows the swapped content.
pub fn filter_summary(ctx: &PageContext<'_>, oob: bool) -> String {
    let summary = FilterSummary::compute(ctx.filter, &ctx.trades);
    let mut html = format!(
        "<div id=\"filter-summary\" class=\"filter-summary\"{}>",
        if oob { " hx-swap-oob=\"true\"" } else { "" }
    );
    html.push_str(&format!("<p><strong>{}</strong> trades</p>", summary.trades));
    html.push_str(&format!("<p><strong>{}</strong> trading days</p>", summary.days));
    html.push_str(&format!(
        "<p><strong>{}</strong> of {} sentiment buckets</p>",
        summary.sentiments,
        Sentiment::ALL.len()
    ));
    let sides: Vec<&str> = summary.sides.iter().map(|s| s.label()).collect();
    html.push_str(&format!("<p>Sides: {}</p>", sides.join(", ")));
    html.push_str("</div>");
    html
}

/// Hidden inputs so a form outside `#filters` still submits the active filter.
pub(crate) fn hidden_inputs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("<input type=\"hidden\" name=\"{}\" value=\"{}\">", escape(k), escape(v)))
        .collect()
}

fn checked(on: bool) -> &'static str {
    if on { " checked" } else { "" }
}

pub(crate) fn section(title: &str, body: &str) -> String {
    format!("<section><h2>{}</h2>{}</section>", escape(title), body)
}

pub(crate) fn kpi_cards(items: &[(&str, String)]) -> String {
    let mut html = String::from("<div class=\"kpis\">");
    for (label, value) in items {
        html.push_str(&format!(
            "<div class=\"kpi\"><span class=\"kpi-label\">{}</span><span class=\"kpi-value\">{}</span></div>",
            escape(label),
            escape(value)
        ));
    }
    html.push_str("</div>");
    html
}

pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table><thead><tr>");
    for h in headers {
        html.push_str(&format!("<th>{}</th>", escape(h)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub(crate) fn callout(kind: &str, title: &str, message: &str) -> String {
    format!(
        "<div class=\"callout {}\"><strong>{}</strong><p>{}</p></div>",
        kind,
        escape(title),
        escape(message)
    )
}

pub(crate) fn sentiment_label(s: Option<Sentiment>) -> String {
    s.map(|s| s.label().to_string())
        .unwrap_or_else(|| crate::adapters::format::MISSING.to_string())
}
