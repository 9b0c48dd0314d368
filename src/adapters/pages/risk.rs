use super::{PageContext, callout, kpi_cards, section, sentiment_label, table};
use crate::adapters::chart_svg::{self, Bar, LINE_COLOR, LOSS_COLOR, Series, WIN_COLOR};
use crate::adapters::format::{compact, count, currency, currency_opt, pct, ratio_opt};
use crate::domain::aggregate::{by_hour, by_session, by_weekday, session_by_sentiment};
use crate::domain::risk::RiskReport;
use crate::domain::sentiment::Sentiment;
use crate::domain::trade::weekday_name;

pub struct RiskView<'a> {
    ctx: &'a PageContext<'a>,
}

impl<'a> RiskView<'a> {
    pub fn new(ctx: &'a PageContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn fragment(&self) -> String {
        let report = RiskReport::compute(&self.ctx.trades);
        let mut html = risk_reward(&report);
        html.push_str(&position_sizing(&report));
        html.push_str(&self.timing());
        html.push_str(&insights(&report));
        html
    }

    fn timing(&self) -> String {
        let trades = &self.ctx.trades;

        let hourly = by_hour(trades);
        let hours: Vec<String> = hourly.iter().map(|(h, _)| format!("{:02}", h)).collect();
        let mut html = chart_svg::grouped_bar_chart(
            "Total PnL by Hour",
            &hours,
            &[Series {
                name: "Net PnL".into(),
                color: LINE_COLOR,
                values: hourly.iter().map(|(_, g)| Some(g.total_pnl)).collect(),
            }],
        );
        html.push_str(&chart_svg::line_chart(
            "Win Rate by Hour (%)",
            &hours,
            &[Series {
                name: "Win Rate".into(),
                color: WIN_COLOR,
                values: hourly.iter().map(|(_, g)| Some(g.win_rate)).collect(),
            }],
        ));

        let weekdays: Vec<Bar> = by_weekday(trades)
            .into_iter()
            .filter(|(_, g)| g.trade_count > 0)
            .map(|(d, g)| Bar {
                label: weekday_name(d)[..3].to_string(),
                value: g.total_pnl,
                color: if g.total_pnl >= 0.0 { WIN_COLOR } else { LOSS_COLOR },
            })
            .collect();
        html.push_str(&chart_svg::bar_chart("Total PnL by Weekday", &weekdays, currency));

        let sessions: Vec<Vec<String>> = by_session(trades)
            .iter()
            .map(|(s, g)| {
                vec![
                    s.label().to_string(),
                    count(g.trade_count),
                    currency(g.total_pnl),
                    currency_opt(g.avg_pnl),
                    pct(g.win_rate),
                    currency_opt(g.avg_size),
                ]
            })
            .collect();
        html.push_str(&table(
            &["Session", "Trades", "Total PnL", "Avg PnL", "Win Rate", "Avg Size"],
            &sessions,
        ));

        let pivot = session_by_sentiment(trades);
        html.push_str(&chart_svg::heatmap(
            "Average PnL: Session × Sentiment",
            &pivot.rows.iter().map(|s| s.label().to_string()).collect::<Vec<_>>(),
            &pivot.cols.iter().map(|s| s.label().to_string()).collect::<Vec<_>>(),
            &pivot.cells,
            None,
            compact,
        ));
        section("Time-Based Performance", &html)
    }
}

fn risk_reward(report: &RiskReport) -> String {
    let rows: Vec<Vec<String>> = report
        .buckets
        .iter()
        .map(|(s, g)| {
            vec![
                s.label().to_string(),
                currency_opt(g.avg_pnl),
                currency_opt(g.std_pnl),
                currency_opt(g.min_pnl),
                currency_opt(g.max_pnl),
                currency_opt(g.avg_size),
                currency_opt(g.std_size),
                ratio_opt(g.sharpe()),
            ]
        })
        .collect();
    let mut html = table(
        &["Sentiment", "Avg PnL", "PnL Std", "Min PnL", "Max PnL", "Avg Size", "Size Std", "Sharpe"],
        &rows,
    );
    let sharpe: Vec<Bar> = report
        .buckets
        .iter()
        .filter_map(|(s, g)| {
            g.sharpe().map(|v| Bar {
                label: s.label().to_string(),
                value: v,
                color: s.color(),
            })
        })
        .collect();
    html.push_str(&chart_svg::bar_chart("Sharpe Ratio by Sentiment", &sharpe, |v| {
        format!("{:.3}", v)
    }));
    section("Risk-Reward Profile", &html)
}

fn position_sizing(report: &RiskReport) -> String {
    let rows: Vec<Vec<String>> = report
        .positions
        .iter()
        .map(|(s, p)| {
            vec![
                s.label().to_string(),
                currency_opt(p.mean),
                currency_opt(p.median),
                currency_opt(p.std),
                currency_opt(p.min),
                currency_opt(p.max),
            ]
        })
        .collect();
    let mut html = kpi_cards(&[("Average Position", currency_opt(report.average_position))]);
    html.push_str(&table(
        &["Sentiment", "Mean", "Median", "Std", "Min", "Max"],
        &rows,
    ));
    let bars: Vec<Bar> = report
        .positions
        .iter()
        .filter_map(|(s, p)| {
            p.median.map(|v| Bar {
                label: s.label().to_string(),
                value: v,
                color: s.color(),
            })
        })
        .collect();
    html.push_str(&chart_svg::bar_chart("Median Position Size", &bars, currency));
    section("Position Sizing", &html)
}

fn insights(report: &RiskReport) -> String {
    let mut html = kpi_cards(&[
        ("Best Sharpe", sentiment_label(report.best_sharpe)),
        ("Worst Sharpe", sentiment_label(report.worst_sharpe)),
        ("Most Consistent", sentiment_label(report.most_consistent)),
        ("Most Volatile", sentiment_label(report.most_volatile)),
    ]);
    if let Some(best) = report.best_sharpe {
        html.push_str(&best_bucket_note(report, best));
    }
    if report.recommendations.is_empty() {
        html.push_str("<p class=\"note\">No risk warnings for the current selection.</p>");
    }
    for rec in &report.recommendations {
        let kind = if rec.is_warning() { "warning" } else { "success" };
        html.push_str(&callout(kind, rec.headline(), &rec.message()));
    }
    section("Key Insights", &html)
}

fn best_bucket_note(report: &RiskReport, best: Sentiment) -> String {
    match report.stats_of(best) {
        Some(g) => format!(
            "<p class=\"insight\">{} trades carry the best risk-adjusted return: Sharpe {}, win rate {}, average PnL {}.</p>",
            best.label(),
            ratio_opt(g.sharpe()),
            pct(g.win_rate),
            currency_opt(g.avg_pnl)
        ),
        None => String::new(),
    }
}
