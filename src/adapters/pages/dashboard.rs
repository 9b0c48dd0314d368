use super::{PageContext, hidden_inputs, kpi_cards, section, table};
use crate::adapters::chart_svg::{
    self, Bar, BoxStats, LINE_COLOR, LOSS_COLOR, SECONDARY_COLOR, Series, WIN_COLOR,
};
use crate::adapters::format::{self, compact, count, currency, currency_opt, pct, ratio_opt};
use crate::domain::aggregate::{
    self, GroupStats, Overview, by_sentiment, correlation_matrix, sentiment_distribution,
    sentiment_pnl_correlation, size_by_profitability,
};
use crate::domain::sentiment::Sentiment;
use crate::domain::timeseries::{daily_performance, rolling_daily, weekly_avg_size};
use crate::domain::trade::{Side, TradeRecord};

pub struct DashboardView<'a> {
    ctx: &'a PageContext<'a>,
}

impl<'a> DashboardView<'a> {
    pub fn new(ctx: &'a PageContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn fragment(&self) -> String {
        let trades = &self.ctx.trades;
        let overview = Overview::compute(trades);
        let buckets = by_sentiment(trades);
        let present: Vec<&(Sentiment, GroupStats)> =
            buckets.iter().filter(|(_, g)| g.trade_count > 0).collect();

        let mut html = kpi_cards(&[
            ("Total Trades", count(overview.total_trades)),
            ("Total PnL", currency(overview.total_pnl)),
            ("Win Rate", pct(overview.win_rate)),
            ("Avg PnL / Trade", currency_opt(overview.avg_pnl)),
            ("Total Volume", currency(overview.total_volume)),
        ]);

        let distribution: Vec<Bar> = sentiment_distribution(trades)
            .into_iter()
            .map(|(s, n)| Bar {
                label: s.label().to_string(),
                value: n as f64,
                color: s.color(),
            })
            .collect();
        html.push_str(&section(
            "Sentiment Distribution",
            &chart_svg::donut_chart("Trades by Sentiment", &distribution),
        ));

        html.push_str(&section(
            "PnL by Sentiment",
            &chart_svg::bar_chart(
                "Total Net PnL by Sentiment",
                &bucket_bars(&present, |g| Some(g.total_pnl)),
                currency,
            ),
        ));

        let rows: Vec<Vec<String>> = present
            .iter()
            .map(|(s, g)| {
                vec![
                    s.label().to_string(),
                    count(g.trade_count),
                    currency(g.total_pnl),
                    currency_opt(g.avg_pnl),
                    currency_opt(g.std_pnl),
                    pct(g.win_rate),
                    currency(g.total_volume),
                    currency_opt(g.avg_size),
                    currency(g.total_fees),
                    ratio_opt(g.sharpe()),
                ]
            })
            .collect();
        html.push_str(&section(
            "Performance by Sentiment",
            &table(
                &[
                    "Sentiment",
                    "Trades",
                    "Total PnL",
                    "Avg PnL",
                    "PnL Std",
                    "Win Rate",
                    "Volume",
                    "Avg Size",
                    "Fees",
                    "Sharpe",
                ],
                &rows,
            ),
        ));

        let mut pair = String::from("<div class=\"grid-2\">");
        pair.push_str(&chart_svg::bar_chart(
            "Win Rate by Sentiment (%)",
            &bucket_bars(&present, |g| Some(g.win_rate)),
            pct,
        ));
        pair.push_str(&chart_svg::bar_chart(
            "Average PnL by Sentiment",
            &bucket_bars(&present, |g| g.avg_pnl),
            currency,
        ));
        pair.push_str("</div>");
        html.push_str(&section("Win Rate and Average PnL", &pair));

        let boxes = pnl_boxes(trades);
        html.push_str(&section(
            "PnL Distribution",
            &format!(
                "{}<p class=\"note\">Values clipped to the 1st to 99th percentile.</p>",
                chart_svg::box_plot("Net PnL Spread by Sentiment", &boxes)
            ),
        ));

        html.push_str(&self.time_series());

        let mut activity = String::from("<div class=\"grid-2\">");
        activity.push_str(&chart_svg::bar_chart(
            "Trade Count by Sentiment",
            &bucket_bars(&present, |g| Some(g.trade_count as f64)),
            compact,
        ));
        activity.push_str(&chart_svg::bar_chart(
            "Average Position Size by Sentiment",
            &bucket_bars(&present, |g| g.avg_size),
            currency,
        ));
        activity.push_str("</div>");
        html.push_str(&section("Trading Activity", &activity));

        html.push_str(&self.sizing());
        html.push_str(&self.side_pivots());
        html.push_str(&self.correlations());
        html
    }

    fn time_series(&self) -> String {
        let daily = daily_performance(&self.ctx.trades);
        let dates: Vec<String> = daily.iter().map(|d| d.date.to_string()).collect();

        let mut html = chart_svg::dual_axis_chart(
            "Cumulative PnL vs Fear & Greed Index",
            &dates,
            &Series {
                name: "Cumulative PnL".into(),
                color: LINE_COLOR,
                values: daily.iter().map(|d| Some(d.cumulative_pnl)).collect(),
            },
            &Series {
                name: "Index".into(),
                color: SECONDARY_COLOR,
                values: daily.iter().map(|d| Some(d.index_value)).collect(),
            },
        );

        let window = self.ctx.settings.rolling_window;
        let rolling = rolling_daily(&daily, window);
        html.push_str(&window_form(window, &self.ctx.filter.to_pairs()));
        html.push_str(&chart_svg::line_chart(
            &format!("Daily PnL with {window}-Day Moving Average"),
            &dates,
            &[
                Series {
                    name: "Daily PnL".into(),
                    color: chart_svg::MUTED_COLOR,
                    values: rolling.iter().map(|r| Some(r.net_pnl)).collect(),
                },
                Series {
                    name: format!("{window}-Day MA"),
                    color: LINE_COLOR,
                    values: rolling.iter().map(|r| r.mean).collect(),
                },
            ],
        ));
        section("Performance Over Time", &html)
    }

    fn sizing(&self) -> String {
        let trades = &self.ctx.trades;
        let pivot = size_by_profitability(trades);
        let labels: Vec<String> = pivot.rows.iter().map(|s| s.label().to_string()).collect();
        let mut html = chart_svg::grouped_bar_chart(
            "Average Size: Winning vs Losing Trades",
            &labels,
            &[
                Series {
                    name: "Losing".into(),
                    color: LOSS_COLOR,
                    values: pivot.rows.iter().map(|s| pivot.get(s, &false)).collect(),
                },
                Series {
                    name: "Winning".into(),
                    color: WIN_COLOR,
                    values: pivot.rows.iter().map(|s| pivot.get(s, &true)).collect(),
                },
            ],
        );

        let weekly = weekly_avg_size(trades);
        html.push_str(&chart_svg::line_chart(
            "Weekly Average Position Size",
            &weekly.iter().map(|(d, _)| d.to_string()).collect::<Vec<_>>(),
            &[Series {
                name: "Avg Size".into(),
                color: LINE_COLOR,
                values: weekly.iter().map(|(_, v)| Some(*v)).collect(),
            }],
        ));
        section("Position Sizing", &html)
    }

    fn side_pivots(&self) -> String {
        let trades = &self.ctx.trades;
        let pnl = aggregate::sentiment_by_side(trades, aggregate::sum_pnl);
        let win = aggregate::sentiment_by_side(trades, aggregate::win_rate_of);
        let rows: Vec<Vec<String>> = pnl
            .rows
            .iter()
            .filter(|s| Side::ALL.iter().any(|side| pnl.get(s, side).is_some()))
            .map(|s| {
                let mut row = vec![s.label().to_string()];
                for side in &Side::ALL {
                    row.push(currency_opt(pnl.get(s, side)));
                    row.push(format::pct_opt(win.get(s, side)));
                }
                row
            })
            .collect();
        section(
            "Sentiment by Side",
            &table(
                &["Sentiment", "BUY PnL", "BUY Win Rate", "SELL PnL", "SELL Win Rate"],
                &rows,
            ),
        )
    }

    fn correlations(&self) -> String {
        let trades = &self.ctx.trades;
        let matrix = correlation_matrix(trades);
        let labels: Vec<String> = matrix.labels.iter().map(|l| l.to_string()).collect();
        let mut html = chart_svg::heatmap(
            "Correlation Matrix",
            &labels,
            &labels,
            &matrix.values,
            Some(1.0),
            |v| format!("{:.2}", v),
        );
        let insight = match sentiment_pnl_correlation(trades) {
            Some(r) => format!(
                "Correlation between the Fear & Greed index and net PnL: {:.3} ({}).",
                r,
                correlation_strength(r)
            ),
            None => "Not enough variation to correlate sentiment with PnL.".to_string(),
        };
        html.push_str(&format!("<p class=\"insight\">{}</p>", insight));
        section("Correlation Analysis", &html)
    }
}

fn bucket_bars(rows: &[&(Sentiment, GroupStats)], metric: fn(&GroupStats) -> Option<f64>) -> Vec<Bar> {
    rows.iter()
        .filter_map(|(s, g)| {
            metric(g).map(|value| Bar {
                label: s.label().to_string(),
                value,
                color: s.color(),
            })
        })
        .collect()
}

/// One box per sentiment, after clipping the whole selection to its 1st to 99th percentile.
fn pnl_boxes(trades: &[&TradeRecord]) -> Vec<(String, &'static str, BoxStats)> {
    let Some(bounds) = chart_svg::clip_bounds(&aggregate::net_pnls(trades)) else {
        return Vec::new();
    };
    aggregate::group_by(trades, |t| Some(t.sentiment))
        .iter()
        .filter_map(|(s, g)| {
            BoxStats::within(&aggregate::net_pnls(g), bounds).map(|b| (s.label().to_string(), s.color(), b))
        })
        .collect()
}

pub(crate) fn correlation_strength(r: f64) -> &'static str {
    let strength = r.abs();
    if strength >= 0.7 {
        "strong"
    } else if strength >= 0.3 {
        "moderate"
    } else if strength >= 0.1 {
        "weak"
    } else {
        "negligible"
    }
}

fn window_form(window: usize, filter_pairs: &[(String, String)]) -> String {
    let mut html = format!(
        "<form class=\"inline\" action=\"/\" method=\"get\" hx-get=\"/\" hx-target=\"#content\" hx-swap=\"outerHTML\" hx-include=\"#filters\" hx-push-url=\"true\"><label>Rolling window (days) <input type=\"number\" name=\"window\" min=\"{}\" max=\"{}\" value=\"{}\"></label>",
        crate::domain::timeseries::MIN_ROLLING_WINDOW,
        crate::domain::timeseries::MAX_ROLLING_WINDOW,
        window
    );
    html.push_str(&hidden_inputs(filter_pairs));
    html.push_str("<button type=\"submit\">Update</button></form>");
    html
}
