//! Inline SVG charts for dashboard pages and the static report.

use crate::adapters::format::{compact, escape};
use crate::domain::stats;

const CHART_WIDTH: f64 = 720.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 50.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 45.0;
const PLOT_WIDTH: f64 = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
const PLOT_HEIGHT: f64 = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
const MAX_X_TICKS: usize = 6;

pub const LINE_COLOR: &str = "#2563eb";
pub const SECONDARY_COLOR: &str = "#f59e0b";
pub const MUTED_COLOR: &str = "#94a3b8";
pub const WIN_COLOR: &str = "#16a34a";
pub const LOSS_COLOR: &str = "#dc2626";
pub const DRAWDOWN_FILL: &str = "rgba(239,68,68,0.3)";
pub const NO_DATA: &str = "<p class=\"empty\">No data available.</p>";

pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

/// A named series; `None` leaves a gap.
pub struct Series {
    pub name: String,
    pub color: &'static str,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of<I: IntoIterator<Item = f64>>(values: I, include_zero: bool) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() {
            return None;
        }
        if include_zero {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        if max - min < f64::EPSILON {
            max = min + 1.0;
        }
        Some(Self { min, max })
    }

    fn y(&self, v: f64) -> f64 {
        MARGIN_TOP + PLOT_HEIGHT - ((v - self.min) / (self.max - self.min)) * PLOT_HEIGHT
    }
}

fn x_scale(i: usize, n: usize) -> f64 {
    MARGIN_LEFT + (i as f64 / (n.saturating_sub(1)).max(1) as f64) * PLOT_WIDTH
}

fn slot_center(i: usize, n: usize) -> f64 {
    let slot = PLOT_WIDTH / n.max(1) as f64;
    MARGIN_LEFT + slot * (i as f64 + 0.5)
}

fn tick_indices(n: usize) -> Vec<usize> {
    if n <= MAX_X_TICKS {
        return (0..n).collect();
    }
    let mut ticks: Vec<usize> = (0..MAX_X_TICKS - 1)
        .map(|k| k * (n - 1) / (MAX_X_TICKS - 1))
        .collect();
    ticks.push(n - 1);
    ticks
}

fn open(title: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg" class="chart">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" font-size=\"13\" font-weight=\"bold\" fill=\"#333\">{}</text>\n",
        MARGIN_LEFT,
        escape(title)
    ));
    svg
}

fn close(mut svg: String) -> String {
    svg.push_str("</svg>\n");
    svg
}

fn axes(svg: &mut String, range: Range, label: fn(f64) -> String) {
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    for v in [range.max, (range.max + range.min) / 2.0, range.min] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            range.y(v) + 3.0,
            label(v)
        ));
    }
    if range.min < 0.0 && range.max > 0.0 {
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#999\" stroke-dasharray=\"4 3\"/>\n",
            MARGIN_LEFT,
            range.y(0.0),
            CHART_WIDTH - MARGIN_RIGHT,
            range.y(0.0)
        ));
    }
}

fn right_axis_labels(svg: &mut String, range: Range) {
    for v in [range.max, (range.max + range.min) / 2.0, range.min] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"start\" font-size=\"10\" fill=\"{}\">{}</text>\n",
            CHART_WIDTH - MARGIN_RIGHT + 5.0,
            range.y(v) + 3.0,
            SECONDARY_COLOR,
            compact(v)
        ));
    }
}

fn category_labels(svg: &mut String, labels: &[String]) {
    for (i, label) in labels.iter().enumerate() {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            slot_center(i, labels.len()),
            CHART_HEIGHT - MARGIN_BOTTOM + 15.0,
            escape(label)
        ));
    }
}

fn date_labels(svg: &mut String, labels: &[String]) {
    for i in tick_indices(labels.len()) {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x_scale(i, labels.len()),
            CHART_HEIGHT - MARGIN_BOTTOM + 15.0,
            escape(&labels[i])
        ));
    }
}

fn legend(svg: &mut String, entries: &[(&str, &str)]) {
    let mut x = CHART_WIDTH - MARGIN_RIGHT - entries.len() as f64 * 120.0;
    for (name, color) in entries {
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"24\" width=\"10\" height=\"10\" fill=\"{}\"/>\n",
            x, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"33\" font-size=\"10\" fill=\"#333\">{}</text>\n",
            x + 14.0,
            escape(name)
        ));
        x += 120.0;
    }
}

fn line_path(values: &[Option<f64>], range: Range) -> String {
    let mut path_data = String::new();
    let mut pen_down = false;
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) if v.is_finite() => {
                let cmd = if pen_down { " L" } else { " M" };
                path_data.push_str(&format!(
                    "{} {:.1} {:.1}",
                    cmd,
                    x_scale(i, values.len()),
                    range.y(*v)
                ));
                pen_down = true;
            }
            _ => pen_down = false,
        }
    }
    path_data.trim_start().to_string()
}

/// One bar per category, coloured individually.
pub fn bar_chart(title: &str, bars: &[Bar], value_label: fn(f64) -> String) -> String {
    let Some(range) = Range::of(bars.iter().map(|b| b.value), true) else {
        return NO_DATA.to_string();
    };

    let mut svg = open(title);
    axes(&mut svg, range, compact);
    let width = PLOT_WIDTH / bars.len() as f64 * 0.7;
    for (i, bar) in bars.iter().enumerate() {
        let cx = slot_center(i, bars.len());
        let top = range.y(bar.value.max(0.0));
        let bottom = range.y(bar.value.min(0.0));
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {}</title></rect>\n",
            cx - width / 2.0,
            top,
            width,
            (bottom - top).max(0.5),
            bar.color,
            escape(&bar.label),
            value_label(bar.value)
        ));
        let text_y = if bar.value >= 0.0 { top - 4.0 } else { bottom + 12.0 };
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#333\">{}</text>\n",
            cx,
            text_y,
            value_label(bar.value)
        ));
    }
    let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
    category_labels(&mut svg, &labels);
    close(svg)
}

/// Side-by-side bars, one per series within each category.
pub fn grouped_bar_chart(title: &str, categories: &[String], series: &[Series]) -> String {
    let values = series.iter().flat_map(|s| s.values.iter().flatten().copied());
    let (Some(range), false) = (Range::of(values, true), categories.is_empty()) else {
        return NO_DATA.to_string();
    };

    let mut svg = open(title);
    axes(&mut svg, range, compact);
    let group = PLOT_WIDTH / categories.len() as f64 * 0.8;
    let width = group / series.len().max(1) as f64;
    for (si, s) in series.iter().enumerate() {
        for (ci, v) in s.values.iter().enumerate().take(categories.len()) {
            let Some(v) = v else { continue };
            let x = slot_center(ci, categories.len()) - group / 2.0 + width * si as f64;
            let top = range.y(v.max(0.0));
            let bottom = range.y(v.min(0.0));
            svg.push_str(&format!(
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{} / {}: {}</title></rect>\n",
                x,
                top,
                width * 0.9,
                (bottom - top).max(0.5),
                s.color,
                escape(&categories[ci]),
                escape(&s.name),
                compact(*v)
            ));
        }
    }
    category_labels(&mut svg, categories);
    let entries: Vec<(&str, &str)> = series.iter().map(|s| (s.name.as_str(), s.color)).collect();
    legend(&mut svg, &entries);
    close(svg)
}

/// Lines sharing one y scale over an ordered x axis.
pub fn line_chart(title: &str, x_labels: &[String], series: &[Series]) -> String {
    let values = series.iter().flat_map(|s| s.values.iter().flatten().copied());
    let Some(range) = Range::of(values, false) else {
        return NO_DATA.to_string();
    };

    let mut svg = open(title);
    axes(&mut svg, range, compact);
    for s in series {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            line_path(&s.values, range),
            s.color
        ));
    }
    date_labels(&mut svg, x_labels);
    let entries: Vec<(&str, &str)> = series.iter().map(|s| (s.name.as_str(), s.color)).collect();
    legend(&mut svg, &entries);
    close(svg)
}

/// Two lines with independent scales; the right-hand scale is labelled in the second colour.
pub fn dual_axis_chart(title: &str, x_labels: &[String], left: &Series, right: &Series) -> String {
    let Some(left_range) = Range::of(left.values.iter().flatten().copied(), false) else {
        return NO_DATA.to_string();
    };
    let right_range = Range::of(right.values.iter().flatten().copied(), false);

    let mut svg = open(title);
    axes(&mut svg, left_range, compact);
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        line_path(&left.values, left_range),
        left.color
    ));
    if let Some(range) = right_range {
        right_axis_labels(&mut svg, range);
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"6 3\"/>\n",
            line_path(&right.values, range),
            right.color
        ));
    }
    date_labels(&mut svg, x_labels);
    legend(&mut svg, &[(left.name.as_str(), left.color), (right.name.as_str(), right.color)]);
    close(svg)
}

/// Filled area between zero and a series of non-positive values.
pub fn drawdown_chart(title: &str, x_labels: &[String], values: &[f64]) -> String {
    let Some(range) = Range::of(values.iter().copied(), true) else {
        return NO_DATA.to_string();
    };

    let n = values.len();
    let mut path_data = format!("M {:.1} {:.1}", x_scale(0, n), range.y(0.0));
    for (i, v) in values.iter().enumerate() {
        path_data.push_str(&format!(" L {:.1} {:.1}", x_scale(i, n), range.y(*v)));
    }
    path_data.push_str(&format!(" L {:.1} {:.1} Z", x_scale(n - 1, n), range.y(0.0)));

    let mut svg = open(title);
    axes(&mut svg, range, compact);
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
        path_data, DRAWDOWN_FILL, LOSS_COLOR
    ));
    date_labels(&mut svg, x_labels);
    close(svg)
}

/// Returns (fill, needs_white_text) for a value scaled into [-1, 1].
fn heat_color(t: f64) -> (&'static str, bool) {
    if t >= 0.75 {
        ("#006400", true)
    } else if t >= 0.5 {
        ("#228B22", true)
    } else if t >= 0.25 {
        ("#90EE90", false)
    } else if t > 0.0 {
        ("#E0FFE0", false)
    } else if t == 0.0 {
        ("#FFFFFF", false)
    } else if t > -0.25 {
        ("#FFE0E0", false)
    } else if t > -0.5 {
        ("#FF9090", false)
    } else if t > -0.75 {
        ("#FF4444", true)
    } else {
        ("#8B0000", true)
    }
}

/// Colour-coded grid. With `scale` unset, cells are scaled by the largest magnitude present.
pub fn heatmap(
    title: &str,
    rows: &[String],
    cols: &[String],
    cells: &[Vec<Option<f64>>],
    scale: Option<f64>,
    cell_label: fn(f64) -> String,
) -> String {
    let max_abs = cells
        .iter()
        .flatten()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if rows.is_empty() || cols.is_empty() || cells.iter().flatten().all(|c| c.is_none()) {
        return NO_DATA.to_string();
    }
    let scale = scale.unwrap_or(max_abs).max(f64::EPSILON);

    let left = 110.0;
    let cell_w = (CHART_WIDTH - left - MARGIN_RIGHT) / cols.len() as f64;
    let cell_h = (PLOT_HEIGHT / rows.len() as f64).min(48.0);

    let mut svg = open(title);
    for (ci, col) in cols.iter().enumerate() {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            left + cell_w * (ci as f64 + 0.5),
            MARGIN_TOP - 4.0,
            escape(col)
        ));
    }
    for (ri, row) in rows.iter().enumerate() {
        let y = MARGIN_TOP + cell_h * ri as f64;
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            left - 6.0,
            y + cell_h / 2.0 + 3.0,
            escape(row)
        ));
        for ci in 0..cols.len() {
            let value = cells.get(ri).and_then(|r| r.get(ci)).copied().flatten();
            let (fill, white_text) = match value {
                Some(v) => heat_color((v / scale).clamp(-1.0, 1.0)),
                None => ("#f3f4f6", false),
            };
            let x = left + cell_w * ci as f64;
            svg.push_str(&format!(
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" stroke=\"white\"/>\n",
                x, y, cell_w, cell_h, fill
            ));
            let text = value.map(cell_label).unwrap_or_default();
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{}\">{}</text>\n",
                x + cell_w / 2.0,
                y + cell_h / 2.0 + 3.0,
                if white_text { "white" } else { "#333" },
                text
            ));
        }
    }
    close(svg)
}

/// Ring chart of shares; slices with zero weight are skipped.
pub fn donut_chart(title: &str, slices: &[Bar]) -> String {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    if total <= 0.0 {
        return NO_DATA.to_string();
    }

    let radius = 90.0;
    let stroke = 40.0;
    let circumference = 2.0 * std::f64::consts::PI * radius;
    let cx = MARGIN_LEFT + 120.0;
    let cy = MARGIN_TOP + PLOT_HEIGHT / 2.0 + 10.0;

    let mut svg = open(title);
    let mut offset = 0.0;
    for slice in slices.iter().filter(|s| s.value > 0.0) {
        let len = slice.value / total * circumference;
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-dasharray=\"{:.2} {:.2}\" stroke-dashoffset=\"{:.2}\" transform=\"rotate(-90 {:.1} {:.1})\"><title>{}</title></circle>\n",
            cx,
            cy,
            radius,
            slice.color,
            stroke,
            len,
            circumference - len,
            -offset,
            cx,
            cy,
            escape(&slice.label)
        ));
        offset += len;
    }

    let mut y = MARGIN_TOP + 20.0;
    for slice in slices {
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n",
            cx + 160.0,
            y - 10.0,
            slice.color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" font-size=\"11\" fill=\"#333\">{} ({:.1}%)</text>\n",
            cx + 178.0,
            y,
            escape(&slice.label),
            slice.value.max(0.0) / total * 100.0
        ));
        y += 22.0;
    }
    close(svg)
}

/// Box-and-whisker summary with 1.5 IQR whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub high: f64,
}

/// 1st and 99th percentile of the whole population.
pub fn clip_bounds(values: &[f64]) -> Option<(f64, f64)> {
    Some((stats::quantile(values, 0.01)?, stats::quantile(values, 0.99)?))
}

impl BoxStats {
    /// Box of the values inside `bounds`; `None` when nothing survives the clip.
    pub fn within(values: &[f64], bounds: (f64, f64)) -> Option<Self> {
        let (lo, hi) = bounds;
        let clipped: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| *v >= lo && *v <= hi)
            .collect();
        let q1 = stats::quantile(&clipped, 0.25)?;
        let q3 = stats::quantile(&clipped, 0.75)?;
        let iqr = q3 - q1;
        let in_fence = |v: &f64| *v >= q1 - 1.5 * iqr && *v <= q3 + 1.5 * iqr;
        Some(Self {
            low: clipped.iter().copied().filter(in_fence).fold(q1, f64::min),
            q1,
            median: stats::median(&clipped)?,
            q3,
            high: clipped.iter().copied().filter(in_fence).fold(q3, f64::max),
        })
    }
}

pub fn box_plot(title: &str, groups: &[(String, &'static str, BoxStats)]) -> String {
    let values = groups.iter().flat_map(|(_, _, b)| [b.low, b.high]);
    let Some(range) = Range::of(values, false) else {
        return NO_DATA.to_string();
    };

    let mut svg = open(title);
    axes(&mut svg, range, compact);
    let width = PLOT_WIDTH / groups.len() as f64 * 0.5;
    for (i, (label, color, b)) in groups.iter().enumerate() {
        let cx = slot_center(i, groups.len());
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#555\"/>\n",
            cx,
            range.y(b.high),
            cx,
            range.y(b.low)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" fill-opacity=\"0.7\" stroke=\"#555\"><title>{}: median {}</title></rect>\n",
            cx - width / 2.0,
            range.y(b.q3),
            width,
            (range.y(b.q1) - range.y(b.q3)).max(0.5),
            color,
            escape(label),
            compact(b.median)
        ));
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#111\" stroke-width=\"2\"/>\n",
            cx - width / 2.0,
            range.y(b.median),
            cx + width / 2.0,
            range.y(b.median)
        ));
    }
    let labels: Vec<String> = groups.iter().map(|(l, _, _)| l.clone()).collect();
    category_labels(&mut svg, &labels);
    close(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bars() -> Vec<Bar> {
        vec![
            Bar {
                label: "Fear".into(),
                value: 120.0,
                color: "#f57c00",
            },
            Bar {
                label: "Greed".into(),
                value: -40.0,
                color: "#7cb342",
            },
        ]
    }

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("2024-01-{:02}", i + 1)).collect()
    }

    #[test]
    fn empty_inputs_render_placeholder() {
        assert_eq!(bar_chart("PnL", &[], compact), NO_DATA);
        assert_eq!(line_chart("Cumulative", &[], &[]), NO_DATA);
        assert_eq!(drawdown_chart("Drawdown", &[], &[]), NO_DATA);
        assert_eq!(donut_chart("Mix", &[]), NO_DATA);
        assert_eq!(box_plot("Spread", &[]), NO_DATA);
        assert_eq!(heatmap("Heat", &[], &[], &[], None, compact), NO_DATA);
    }

    #[test]
    fn bar_chart_uses_bar_colours_and_zero_line() {
        let svg = bar_chart("PnL by Sentiment", &bars(), compact);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("fill=\"#f57c00\""));
        assert!(svg.contains("fill=\"#7cb342\""));
        assert!(svg.contains("stroke-dasharray=\"4 3\""));
        assert!(svg.contains("PnL by Sentiment"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn line_chart_breaks_on_gaps() {
        let series = Series {
            name: "MA".into(),
            color: LINE_COLOR,
            values: vec![Some(1.0), None, Some(3.0), Some(4.0)],
        };
        let svg = line_chart("Rolling", &labels(4), &[series]);
        assert!(svg.contains("stroke=\"#2563eb\""));
        let path = svg.split("<path d=\"").nth(1).unwrap();
        let d = &path[..path.find('"').unwrap()];
        assert_eq!(d.matches('M').count(), 2);
        assert_eq!(d.matches('L').count(), 1);
    }

    #[test]
    fn dual_axis_labels_right_scale() {
        let left = Series {
            name: "Cumulative PnL".into(),
            color: LINE_COLOR,
            values: vec![Some(0.0), Some(50.0)],
        };
        let right = Series {
            name: "Index".into(),
            color: SECONDARY_COLOR,
            values: vec![Some(20.0), Some(80.0)],
        };
        let svg = dual_axis_chart("PnL vs Index", &labels(2), &left, &right);
        assert!(svg.contains("text-anchor=\"start\""));
        assert!(svg.contains("stroke=\"#f59e0b\""));
        assert_eq!(svg.matches("<path").count(), 2);
    }

    #[test]
    fn drawdown_area_is_closed_and_filled() {
        let svg = drawdown_chart("Drawdown", &labels(3), &[0.0, -20.0, -5.0]);
        assert!(svg.contains("fill=\"rgba(239,68,68,0.3)\""));
        assert!(svg.contains(" Z\""));
    }

    #[test]
    fn heatmap_colours_by_sign() {
        let cells = vec![vec![Some(1.0), Some(-1.0)], vec![None, Some(0.1)]];
        let svg = heatmap(
            "Correlation",
            &["A".into(), "B".into()],
            &["A".into(), "B".into()],
            &cells,
            Some(1.0),
            |v| format!("{:.2}", v),
        );
        assert!(svg.contains("fill=\"#006400\""));
        assert!(svg.contains("fill=\"#8B0000\""));
        assert!(svg.contains("fill=\"#f3f4f6\""));
        assert!(svg.contains(">-1.00<"));
    }

    #[test]
    fn heat_colour_buckets() {
        assert_eq!(heat_color(0.0), ("#FFFFFF", false));
        assert_eq!(heat_color(0.3).0, "#90EE90");
        assert!(heat_color(-0.9).1);
    }

    #[test]
    fn donut_shares_sum_to_full_ring() {
        let slices = vec![
            Bar {
                label: "Fear".into(),
                value: 3.0,
                color: "#f57c00",
            },
            Bar {
                label: "Greed".into(),
                value: 1.0,
                color: "#7cb342",
            },
            Bar {
                label: "Neutral".into(),
                value: 0.0,
                color: "#fbc02d",
            },
        ];
        let svg = donut_chart("Distribution", &slices);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("Fear (75.0%)"));
        assert!(svg.contains("Neutral (0.0%)"));
    }

    #[test]
    fn box_stats_clip_extremes() {
        let mut values: Vec<f64> = (1..=99).map(f64::from).collect();
        values.push(10_000.0);
        let bounds = clip_bounds(&values).unwrap();
        let b = BoxStats::within(&values, bounds).unwrap();
        assert!(b.high < 10_000.0);
        assert!(b.low >= 1.0);
        assert!(b.q1 <= b.median && b.median <= b.q3);
        assert!(clip_bounds(&[]).is_none());
        assert!(BoxStats::within(&[], (0.0, 1.0)).is_none());
    }

    #[test]
    fn groups_are_clipped_to_population_percentiles() {
        let fear: Vec<f64> = (1..=100).map(f64::from).collect();
        let greed = vec![1000.0];
        let all: Vec<f64> = fear.iter().chain(&greed).copied().collect();
        let (lo, hi) = clip_bounds(&all).unwrap();
        assert!(hi < 1000.0);

        assert!(BoxStats::within(&greed, (lo, hi)).is_none());
        let b = BoxStats::within(&fear, (lo, hi)).unwrap();
        assert!(b.low >= lo);
        assert!(b.high <= hi);
    }

    #[test]
    fn box_stats_of_constant_values() {
        let b = BoxStats::within(&[5.0, 5.0, 5.0], (5.0, 5.0)).unwrap();
        assert_relative_eq!(b.low, 5.0);
        assert_relative_eq!(b.high, 5.0);
        let svg = box_plot("Spread", &[("Fear".into(), "#f57c00", b)]);
        assert!(svg.contains("fill=\"#f57c00\""));
    }

    #[test]
    fn ticks_cover_both_ends() {
        assert_eq!(tick_indices(3), vec![0, 1, 2]);
        let t = tick_indices(100);
        assert_eq!(t.len(), MAX_X_TICKS);
        assert_eq!(t[0], 0);
        assert_eq!(*t.last().unwrap(), 99);
    }
}
