use super::{PageContext, callout, kpi_cards, section, sentiment_label, table};
use crate::adapters::chart_svg::{self, Bar, LINE_COLOR, LOSS_COLOR, Series, WIN_COLOR};
use crate::adapters::format::{
    MISSING, compact, count, currency, currency_opt, p_value, pct, pct2_opt, ratio_opt,
};
use crate::domain::aggregate::{GroupStats, best_by, sentiment_distribution, worst_by};
use crate::domain::hypothesis::{SentimentTests, TestResult};
use crate::domain::risk::RiskReport;
use crate::domain::streaks::{StreakSummary, find_streaks};
use crate::domain::timeseries::{Recovery, daily_performance, drawdown, rolling_daily};

pub struct AnalyticsView<'a> {
    ctx: &'a PageContext<'a>,
}

impl<'a> AnalyticsView<'a> {
    pub fn new(ctx: &'a PageContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn fragment(&self) -> String {
        let mut html = self.tests();
        html.push_str(&self.volatility());
        html.push_str(&self.drawdown());
        html.push_str(&self.streaks());
        html
    }

    fn tests(&self) -> String {
        let alpha = self.ctx.settings.significance;
        let tests = SentimentTests::compute(&self.ctx.trades);

        let rows = vec![
            test_row("One-way ANOVA (F)", "PnL means differ across sentiment", tests.anova.as_ref(), alpha),
            test_row(
                "Kruskal-Wallis (H)",
                "PnL distributions differ across sentiment",
                tests.kruskal.as_ref(),
                alpha,
            ),
            test_row(
                "Chi-square (χ²)",
                "Win/loss outcome depends on sentiment",
                tests.chi_square.as_ref(),
                alpha,
            ),
            test_row(
                "Mann-Whitney U",
                "Extreme Fear vs Extreme Greed PnL",
                tests.fear_vs_greed.as_ref(),
                alpha,
            ),
        ];
        let mut html = table(
            &["Test", "Hypothesis", "Statistic", "DoF", "p-value", "Result"],
            &rows,
        );
        html.push_str(&format!(
            "<p class=\"note\">Significance level α = {}. Tests need at least two sentiment groups with data.</p>",
            alpha
        ));

        let contingency: Vec<Vec<String>> = tests
            .contingency
            .rows
            .iter()
            .map(|(s, loss, win)| {
                let total = loss + win;
                vec![
                    s.label().to_string(),
                    count(*loss),
                    count(*win),
                    count(total),
                    pct(*win as f64 / total.max(1) as f64 * 100.0),
                ]
            })
            .collect();
        html.push_str("<h3>Outcome by Sentiment</h3>");
        html.push_str(&table(
            &["Sentiment", "Losing", "Winning", "Total", "Win Rate"],
            &contingency,
        ));

        let groups: Vec<Vec<String>> = tests
            .groups
            .iter()
            .map(|(s, n)| vec![s.label().to_string(), count(*n)])
            .collect();
        html.push_str("<h3>Sample Sizes</h3>");
        html.push_str(&table(&["Sentiment", "Trades with PnL"], &groups));
        section("Statistical Tests", &html)
    }

    fn volatility(&self) -> String {
        let report = RiskReport::compute(&self.ctx.trades);
        let buckets: &[(crate::domain::sentiment::Sentiment, GroupStats)] = &report.buckets;

        let std_bars: Vec<Bar> = buckets
            .iter()
            .filter_map(|(s, g)| {
                g.std_pnl.map(|v| Bar {
                    label: s.label().to_string(),
                    value: v,
                    color: s.color(),
                })
            })
            .collect();
        let cv_bars: Vec<Bar> = buckets
            .iter()
            .filter_map(|(s, g)| {
                g.coefficient_of_variation().map(|v| Bar {
                    label: s.label().to_string(),
                    value: v,
                    color: s.color(),
                })
            })
            .collect();

        let mut html = kpi_cards(&[
            ("Most Volatile", sentiment_label(report.most_volatile)),
            ("Least Volatile", sentiment_label(report.least_volatile)),
            ("Most Efficient (lowest CV)", sentiment_label(report.most_efficient)),
            (
                "Least Efficient",
                sentiment_label(best_by(buckets, GroupStats::coefficient_of_variation)),
            ),
        ]);
        html.push_str("<div class=\"grid-2\">");
        html.push_str(&chart_svg::bar_chart("PnL Standard Deviation", &std_bars, currency));
        html.push_str(&chart_svg::bar_chart("Coefficient of Variation (%)", &cv_bars, compact));
        html.push_str("</div>");

        let daily = daily_performance(&self.ctx.trades);
        let window = self.ctx.settings.rolling_window;
        let rolling = rolling_daily(&daily, window);
        html.push_str(&chart_svg::line_chart(
            &format!("{window}-Day Rolling PnL Volatility"),
            &rolling.iter().map(|r| r.date.to_string()).collect::<Vec<_>>(),
            &[Series {
                name: "Rolling Std".into(),
                color: LINE_COLOR,
                values: rolling.iter().map(|r| r.std).collect(),
            }],
        ));

        let rows: Vec<Vec<String>> = buckets
            .iter()
            .map(|(s, g)| {
                vec![
                    s.label().to_string(),
                    currency_opt(g.avg_pnl),
                    currency_opt(g.std_pnl),
                    compact_opt(g.coefficient_of_variation()),
                    ratio_opt(g.sharpe()),
                ]
            })
            .collect();
        html.push_str(&table(&["Sentiment", "Avg PnL", "Std", "CV %", "Sharpe"], &rows));
        if let Some(worst) = worst_by(buckets, GroupStats::sharpe) {
            html.push_str(&format!(
                "<p class=\"insight\">Weakest risk-adjusted returns: {}.</p>",
                worst.label()
            ));
        }
        section("Volatility Analysis", &html)
    }

    fn drawdown(&self) -> String {
        let daily = daily_performance(&self.ctx.trades);
        let Some(dd) = drawdown(&daily) else {
            return section("Drawdown Analysis", chart_svg::NO_DATA);
        };

        let recovery = match &dd.recovery {
            Recovery::Recovered { date, days } => format!("{} ({} days)", date, days),
            Recovery::NotRecovered => "Not yet recovered".to_string(),
        };
        let mut html = kpi_cards(&[
            ("Max Drawdown", currency(dd.max_drawdown)),
            ("Max Drawdown %", pct2_opt(dd.max_drawdown_pct)),
            ("Trough Date", dd.max_drawdown_date.to_string()),
            ("Recovery", recovery),
        ]);
        let dates: Vec<String> = dd.series.iter().map(|p| p.date.to_string()).collect();
        html.push_str(&chart_svg::line_chart(
            "Cumulative PnL and Running Peak",
            &dates,
            &[
                Series {
                    name: "Cumulative PnL".into(),
                    color: LINE_COLOR,
                    values: dd.series.iter().map(|p| Some(p.cumulative_pnl)).collect(),
                },
                Series {
                    name: "Running Peak".into(),
                    color: WIN_COLOR,
                    values: dd.series.iter().map(|p| Some(p.running_max)).collect(),
                },
            ],
        ));
        let values: Vec<f64> = dd.series.iter().map(|p| p.drawdown).collect();
        html.push_str(&chart_svg::drawdown_chart("Drawdown", &dates, &values));
        section("Drawdown Analysis", &html)
    }

    fn streaks(&self) -> String {
        let streaks = find_streaks(&self.ctx.trades);
        let summary = StreakSummary::compute(&streaks);

        let mut html = kpi_cards(&[
            ("Longest Win Streak", count(summary.longest_win)),
            ("Longest Loss Streak", count(summary.longest_loss)),
            ("Avg Win Streak", one_decimal(summary.avg_win)),
            ("Avg Loss Streak", one_decimal(summary.avg_loss)),
            ("Win Streaks", count(summary.win_streaks)),
            ("Loss Streaks", count(summary.loss_streaks)),
        ]);

        let lengths: Vec<String> = summary.distribution.keys().map(|k| k.to_string()).collect();
        html.push_str(&chart_svg::grouped_bar_chart(
            "Streak Length Distribution",
            &lengths,
            &[
                Series {
                    name: "Win streaks".into(),
                    color: WIN_COLOR,
                    values: summary.distribution.values().map(|(w, _)| Some(*w as f64)).collect(),
                },
                Series {
                    name: "Loss streaks".into(),
                    color: LOSS_COLOR,
                    values: summary.distribution.values().map(|(_, l)| Some(*l as f64)).collect(),
                },
            ],
        ));

        let trade_counts = sentiment_distribution(&self.ctx.trades);
        let rows: Vec<Vec<String>> = summary
            .by_sentiment
            .iter()
            .filter(|(s, _, _)| trade_counts.iter().any(|(t, n)| t == s && *n > 0))
            .map(|(s, win, loss)| vec![s.label().to_string(), one_decimal(*win), one_decimal(*loss)])
            .collect();
        html.push_str(&table(
            &["Dominant Sentiment", "Avg Win Streak", "Avg Loss Streak"],
            &rows,
        ));

        if summary.longest_loss >= 5 {
            html.push_str(&callout(
                "warning",
                "Long losing runs",
                &format!(
                    "The longest losing streak ran {} trades. Consider a stop after consecutive losses.",
                    summary.longest_loss
                ),
            ));
        }
        section("Streak Analysis", &html)
    }
}

fn test_row(name: &str, hypothesis: &str, result: Option<&TestResult>, alpha: f64) -> Vec<String> {
    match result {
        Some(r) => vec![
            name.to_string(),
            hypothesis.to_string(),
            format!("{:.4}", r.statistic),
            r.dof.map(|d| d.to_string()).unwrap_or_else(|| MISSING.to_string()),
            p_value(r.p_value),
            if r.is_significant(alpha) {
                "Significant".to_string()
            } else {
                "Not significant".to_string()
            },
        ],
        None => vec![
            name.to_string(),
            hypothesis.to_string(),
            MISSING.to_string(),
            MISSING.to_string(),
            MISSING.to_string(),
            "Insufficient data".to_string(),
        ],
    }
}

fn one_decimal(v: Option<f64>) -> String {
    v.map(|x| format!("{:.1}", x)).unwrap_or_else(|| MISSING.to_string())
}

fn compact_opt(v: Option<f64>) -> String {
    v.map(compact).unwrap_or_else(|| MISSING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_test_reports_insufficient_data() {
        let row = test_row("ANOVA", "h", None, 0.05);
        assert_eq!(row.len(), 6);
        assert_eq!(row[5], "Insufficient data");
    }

    #[test]
    fn significant_test_row() {
        let r = TestResult {
            statistic: 13.5,
            p_value: 0.02,
            dof: Some(1),
        };
        let row = test_row("ANOVA", "h", Some(&r), 0.05);
        assert_eq!(row[2], "13.5000");
        assert_eq!(row[3], "1");
        assert_eq!(row[4], "0.0200");
        assert_eq!(row[5], "Significant");
        assert_eq!(test_row("ANOVA", "h", Some(&r), 0.01)[5], "Not significant");
    }
}
