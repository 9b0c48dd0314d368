use super::{PageContext, hidden_inputs, kpi_cards, section, sentiment_label, table};
use crate::adapters::chart_svg::{self, Bar, LINE_COLOR, SECONDARY_COLOR, Series, WIN_COLOR};
use crate::adapters::format::{
    self, MISSING, count, currency, currency_opt, pct, pct_opt, pct2_opt, ratio_opt,
};
use crate::domain::aggregate::{self, by_side};
use crate::domain::explorer::{
    EXPORT_HEADERS, ExplorerOptions, ExplorerSummary, FeeAnalysis, FeeCohort, SideView, SortKey,
    TIMESTAMP_FORMAT, explore,
};
use crate::domain::metrics::SentimentMetrics;
use crate::domain::trade::{Side, TradeRecord};

pub struct DeepDiveView<'a> {
    ctx: &'a PageContext<'a>,
}

impl<'a> DeepDiveView<'a> {
    pub fn new(ctx: &'a PageContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn fragment(&self) -> String {
        let mut html = self.explorer();
        html.push_str(&self.sides());
        html.push_str(&fees(&FeeAnalysis::compute(&self.ctx.trades)));
        html.push_str(&advanced(&SentimentMetrics::compute(&self.ctx.trades)));
        html
    }

    fn explorer(&self) -> String {
        let opts = &self.ctx.settings.explorer;
        let view = explore(&self.ctx.trades, opts);
        let summary = ExplorerSummary::compute(&view);

        let mut html = explorer_form(opts, &self.ctx.filter.to_pairs());
        html.push_str(&kpi_cards(&[
            ("Matching Trades", count(summary.count)),
            ("Total PnL", currency(summary.total_pnl)),
            ("Avg PnL", currency_opt(summary.avg_pnl)),
            ("Win Rate", pct(summary.win_rate)),
            ("Total Fees", currency(summary.total_fees)),
        ]));

        let rows: Vec<Vec<String>> = view.iter().take(opts.rows).map(|t| display_row(t)).collect();
        html.push_str(&format!(
            "<h3>Top {} by {}</h3>",
            opts.rows.min(view.len()),
            opts.sort.label()
        ));
        html.push_str(&table(&EXPORT_HEADERS, &rows));
        html.push_str(&format!(
            "<p><a class=\"button\" href=\"{}\" download>Download CSV ({} trades)</a></p>",
            format::escape(&self.ctx.export_href()),
            view.len()
        ));
        section("Trade Explorer", &html)
    }

    fn sides(&self) -> String {
        let trades = &self.ctx.trades;
        let sides = by_side(trades);
        let rows: Vec<Vec<String>> = sides
            .iter()
            .map(|(s, g)| {
                vec![
                    s.label().to_string(),
                    count(g.trade_count),
                    currency(g.total_pnl),
                    currency_opt(g.avg_pnl),
                    pct(g.win_rate),
                    currency(g.total_volume),
                    currency_opt(g.avg_size),
                    ratio_opt(g.sharpe()),
                ]
            })
            .collect();
        let mut html = table(
            &["Side", "Trades", "Total PnL", "Avg PnL", "Win Rate", "Volume", "Avg Size", "Sharpe"],
            &rows,
        );

        let pivot = aggregate::sentiment_by_side(trades, aggregate::mean_pnl);
        let labels: Vec<String> = pivot.rows.iter().map(|s| s.label().to_string()).collect();
        let color = |side: Side| if side == Side::Buy { WIN_COLOR } else { SECONDARY_COLOR };
        let series: Vec<Series> = Side::ALL
            .iter()
            .map(|side| Series {
                name: side.label().to_string(),
                color: color(*side),
                values: pivot.rows.iter().map(|s| pivot.get(s, side)).collect(),
            })
            .collect();
        html.push_str(&chart_svg::grouped_bar_chart(
            "Average PnL by Sentiment and Side",
            &labels,
            &series,
        ));
        section("Side Analysis", &html)
    }
}

fn display_row(t: &TradeRecord) -> Vec<String> {
    vec![
        t.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        t.sentiment.label().to_string(),
        t.side.map(|s| s.label().to_string()).unwrap_or_else(|| MISSING.to_string()),
        currency_opt(t.size_usd),
        currency_opt(t.closed_pnl),
        currency_opt(t.fee),
        currency_opt(t.net_pnl),
        pct2_opt(t.pnl_percentage()),
        t.session.label().to_string(),
    ]
}

fn explorer_form(opts: &ExplorerOptions, filter_pairs: &[(String, String)]) -> String {
    let mut html = String::from(
        "<form class=\"inline\" action=\"/deep-dive\" method=\"get\" hx-get=\"/deep-dive\" hx-target=\"#content\" hx-swap=\"outerHTML\" hx-include=\"#filters\" hx-push-url=\"true\">",
    );
    html.push_str(&hidden_inputs(filter_pairs));
    html.push_str(&format!(
        "<label>Min |PnL| <input type=\"number\" name=\"min_pnl\" min=\"0\" step=\"any\" value=\"{}\"></label>",
        opts.min_pnl
    ));
    html.push_str("<label>Side <select name=\"side_view\">");
    let side_options = [("all", "All", opts.side == SideView::All)]
        .into_iter()
        .chain(
            Side::ALL
                .iter()
                .map(|s| (s.label(), s.label(), opts.side == SideView::Only(*s))),
        );
    for (value, label, selected) in side_options {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            value,
            if selected { " selected" } else { "" },
            label
        ));
    }
    html.push_str("</select></label><label>Sort by <select name=\"sort\">");
    for key in SortKey::ALL {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            key.slug(),
            if opts.sort == key { " selected" } else { "" },
            key.label()
        ));
    }
    html.push_str(&format!(
        "</select></label><label>Rows <input type=\"number\" name=\"rows\" min=\"1\" value=\"{}\"></label>",
        opts.rows
    ));
    html.push_str("<button type=\"submit\">Explore</button></form>");
    html
}

fn fees(analysis: &FeeAnalysis) -> String {
    let mut html = kpi_cards(&[
        ("Total Fees", currency(analysis.total_fees)),
        ("Gross Profit", currency(analysis.gross_profit)),
        ("Fees / Gross Profit", pct_opt(analysis.fee_pct_of_profit)),
    ]);

    let fee_bars: Vec<Bar> = analysis
        .fees_by_sentiment
        .iter()
        .map(|(s, v)| Bar {
            label: s.label().to_string(),
            value: *v,
            color: s.color(),
        })
        .collect();
    let ratio_bars: Vec<Bar> = analysis
        .fee_ratio_by_sentiment
        .iter()
        .filter_map(|(s, v)| {
            v.map(|value| Bar {
                label: s.label().to_string(),
                value,
                color: s.color(),
            })
        })
        .collect();
    html.push_str("<div class=\"grid-2\">");
    html.push_str(&chart_svg::bar_chart("Fees by Sentiment", &fee_bars, currency));
    html.push_str(&chart_svg::bar_chart("Mean Fee Ratio by Sentiment (%)", &ratio_bars, |v| {
        format!("{:.3}%", v)
    }));
    html.push_str("</div>");

    let cohort_row = |name: &str, c: Option<&FeeCohort>| match c {
        Some(c) => vec![
            name.to_string(),
            count(c.count),
            c.avg_fee_ratio
                .map(|r| format!("{:.3}%", r))
                .unwrap_or_else(|| MISSING.to_string()),
            currency_opt(c.avg_net_pnl),
            pct(c.win_rate),
        ],
        None => vec![
            name.to_string(),
            "0".to_string(),
            MISSING.to_string(),
            MISSING.to_string(),
            MISSING.to_string(),
        ],
    };
    html.push_str("<h3>Fee Cohorts</h3>");
    html.push_str(&table(
        &["Cohort", "Trades", "Avg Fee Ratio", "Avg Net PnL", "Win Rate"],
        &[
            cohort_row("High fee (> 75th pct)", analysis.high_fee.as_ref()),
            cohort_row("Low fee (≤ 25th pct)", analysis.low_fee.as_ref()),
        ],
    ));
    section("Fee Analysis", &html)
}

fn advanced(metrics: &SentimentMetrics) -> String {
    let rows: Vec<Vec<String>> = metrics
        .rows
        .iter()
        .map(|(s, m)| {
            vec![
                s.label().to_string(),
                count(m.trade_count),
                currency(m.total_pnl),
                currency_opt(m.avg_pnl),
                currency_opt(m.volatility),
                ratio_opt(m.sharpe_ratio),
                pct(m.win_rate),
                ratio_opt(Some(m.profit_factor)),
                currency(m.avg_win),
                currency(-m.avg_loss),
                currency(m.largest_win),
                currency(-m.largest_loss),
                currency_opt(m.avg_magnitude),
            ]
        })
        .collect();
    let mut html = kpi_cards(&[
        ("Best Overall", sentiment_label(metrics.best_overall)),
        ("Best Sharpe", sentiment_label(metrics.best_sharpe)),
        ("Best Win Rate", sentiment_label(metrics.best_win_rate)),
    ]);
    html.push_str(&table(
        &[
            "Sentiment",
            "Trades",
            "Total PnL",
            "Avg PnL",
            "Volatility",
            "Sharpe",
            "Win Rate",
            "Profit Factor",
            "Avg Win",
            "Avg Loss",
            "Largest Win",
            "Largest Loss",
            "Avg |PnL|",
        ],
        &rows,
    ));

    let profiles = metrics.profiles();
    let labels: Vec<String> = profiles.iter().map(|(s, _)| s.label().to_string()).collect();
    html.push_str(&chart_svg::grouped_bar_chart(
        "Performance Profile (0-100)",
        &labels,
        &[
            Series {
                name: "Win Rate".into(),
                color: WIN_COLOR,
                values: profiles.iter().map(|(_, p)| Some(p.win_rate)).collect(),
            },
            Series {
                name: "Sharpe".into(),
                color: LINE_COLOR,
                values: profiles.iter().map(|(_, p)| p.sharpe).collect(),
            },
            Series {
                name: "Magnitude".into(),
                color: SECONDARY_COLOR,
                values: profiles.iter().map(|(_, p)| p.magnitude).collect(),
            },
        ],
    ));
    section("Advanced Metrics", &html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::TradeFilter;

    #[test]
    fn explorer_form_marks_current_choices() {
        let opts = ExplorerOptions {
            min_pnl: 25.0,
            side: SideView::Only(Side::Sell),
            sort: SortKey::Fee,
            rows: 5,
        };
        let html = explorer_form(&opts, &[]);
        assert!(!html.contains("type=\"hidden\""));
        assert!(html.contains("name=\"min_pnl\" min=\"0\" step=\"any\" value=\"25\""));
        assert!(html.contains("<option value=\"SELL\" selected>SELL</option>"));
        assert!(html.contains("<option value=\"fee\" selected>Fee</option>"));
        assert!(html.contains("<option value=\"all\">All</option>"));
        assert!(html.contains("name=\"rows\" min=\"1\" value=\"5\""));
    }

    #[test]
    fn explorer_form_submits_active_filter_without_htmx() {
        let filter = TradeFilter::from_pairs(&[
            ("side".to_string(), "SELL".to_string()),
            ("start".to_string(), "2024-03-02".to_string()),
        ])
        .unwrap();
        let html = explorer_form(&ExplorerOptions::default(), &filter.to_pairs());
        assert!(html.contains("action=\"/deep-dive\" method=\"get\""));
        assert!(html.contains("<input type=\"hidden\" name=\"side\" value=\"SELL\">"));
        assert!(html.contains("<input type=\"hidden\" name=\"start\" value=\"2024-03-02\">"));
    }

    #[test]
    fn empty_fee_cohorts_render_placeholders() {
        let analysis = FeeAnalysis {
            total_fees: 0.0,
            gross_profit: 0.0,
            fee_pct_of_profit: None,
            fees_by_sentiment: Vec::new(),
            fee_ratio_by_sentiment: Vec::new(),
            high_fee: None,
            low_fee: None,
        };
        let html = fees(&analysis);
        assert!(html.contains("High fee (&gt; 75th pct)"));
        assert!(html.contains(chart_svg::NO_DATA));
    }
}
